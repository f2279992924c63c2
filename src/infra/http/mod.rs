//! HTTP transport for the batch snapshot façade.

pub mod api;
mod middleware;

pub use api::handlers::CACHE_STATUS_HEADER;
pub use middleware::PROCESS_TIME_HEADER;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::error::ErrorReport;
use crate::application::repos::{CatalogRepo, RepoError};
use crate::application::snapshot::SnapshotService;

use middleware::{log_responses, record_process_time, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub snapshots: Arc<SnapshotService>,
    pub store: Arc<dyn CatalogRepo>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .merge(api::build_api_router())
        .route("/_health/db", get(db_health))
        .with_state(state)
        .layer(axum_middleware::from_fn(record_process_time))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.store.ping().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
