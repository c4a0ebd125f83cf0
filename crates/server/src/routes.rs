use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use service::records::RecordRepository;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

pub mod names;

/// Shared handler state: the store behind its repository trait.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordRepository>,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// `/names` and `/names/:name`, mounted at the root and under `/api`.
fn names_routes() -> Router<AppState> {
    Router::new()
        .route("/names", get(names::list_names).post(names::add_record))
        .route(
            "/names/:name",
            get(names::get_record).put(names::update_record).delete(names::delete_record),
        )
}

/// Build the full application router.
pub fn build_router(records: Arc<dyn RecordRepository>, cors: CorsLayer) -> Router {
    let state = AppState { records };

    Router::new()
        .route("/", get(names::dump_store))
        .route("/health", get(health))
        .merge(names_routes())
        .nest("/api", names_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
