// HTTP routes

mod http;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::service::SarService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: SarService,
}

pub fn app(service: SarService) -> Router {
    let state = AppState { service };
    Router::new()
        .route("/", get(|| async { crate::version::banner() })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/schema/{domain}", get(http::schema_handler)) // GET /api/schema/cpu
        .route("/api/dirs", get(http::dirs_handler)) // GET /api/dirs?source=csv
        .route("/api/dirs/{dir}/dates", get(http::dates_handler)) // GET /api/dirs/host-a/dates
        .route(
            "/api/dirs/{dir}/dates/{date}/{domain}",
            get(http::table_handler),
        ) // GET /api/dirs/host-a/dates/2025-01-01/cpu?prefer=auto&keys=all,0
        .route(
            "/api/dirs/{dir}/dates/{date}/{domain}/export",
            get(http::export_handler),
        ) // GET .../cpu/export -> cpu.csv
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
