use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    Json,
};
use common::metrics::REQUESTS_TOTAL;
use serde_json::Value;
use service::{errors::ServiceError, records::Record};

use crate::errors::ApiError;
use crate::routes::AppState;

/// Body of every successful mutation: the JSON string `""`.
type Done = Json<&'static str>;

fn done() -> Done {
    Json("")
}

fn count(operation: &str) {
    REQUESTS_TOTAL.with_label_values(&[operation]).inc();
}

type NameParam = Result<Path<String>, PathRejection>;
type RawBody = Result<Bytes, BytesRejection>;

/// Anything that is not valid JSON is reported like a non-object body.
fn parse_body(body: RawBody) -> Result<Value, ApiError> {
    serde_json::from_slice(&body?).map_err(|_| ApiError(ServiceError::Malformed))
}

/// `GET /`: the whole store, for introspection.
pub async fn dump_store(State(state): State<AppState>) -> Json<Vec<Record>> {
    count("dump");
    Json(state.records.all_records().await)
}

/// `GET /names`
pub async fn list_names(State(state): State<AppState>) -> Json<Vec<String>> {
    count("list");
    Json(state.records.list_names().await)
}

/// `POST /names`
pub async fn add_record(State(state): State<AppState>, body: RawBody) -> Result<Done, ApiError> {
    count("add");
    let value = parse_body(body)?;
    state.records.add(value).await?;
    Ok(done())
}

/// `GET /names/:name`
pub async fn get_record(
    State(state): State<AppState>,
    name: NameParam,
) -> Result<Json<Record>, ApiError> {
    count("get");
    let Path(name) = name?;
    Ok(Json(state.records.get(&name).await?))
}

/// `PUT /names/:name`
pub async fn update_record(
    State(state): State<AppState>,
    name: NameParam,
    body: RawBody,
) -> Result<Done, ApiError> {
    count("update");
    let Path(name) = name?;
    let value = parse_body(body)?;
    state.records.update(&name, value).await?;
    Ok(done())
}

/// `DELETE /names/:name`
pub async fn delete_record(
    State(state): State<AppState>,
    name: NameParam,
) -> Result<Done, ApiError> {
    count("delete");
    let Path(name) = name?;
    state.records.delete(&name).await?;
    Ok(done())
}
