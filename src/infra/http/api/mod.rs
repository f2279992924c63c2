pub mod error;
pub mod handlers;

use axum::{Router, routing::get};

use crate::infra::http::HttpState;

pub fn build_api_router() -> Router<HttpState> {
    Router::new().route("/api/v1/academics/batch-data", get(handlers::batch_data))
}
