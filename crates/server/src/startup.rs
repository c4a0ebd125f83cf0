use axum::Router;
use common::{admin_http, env, metrics};
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use service::records::{RecordService, ServiceOptions};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the store from the configured file and build the router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    env::ensure_env(&cfg.storage.database_file).await?;

    let options = ServiceOptions { strict_persistence: cfg.storage.strict_persistence };
    let records = RecordService::open(&cfg.storage.database_file, options).await;

    Ok(routes::build_router(records, build_cors()))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    if let Some(addr) = cfg.admin.addr.as_deref() {
        admin_http::spawn_admin_server(addr, metrics::encode_metrics).await?;
    }

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr = %listener.local_addr()?,
        database_file = %cfg.storage.database_file.display(),
        strict_persistence = cfg.storage.strict_persistence,
        "records server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
