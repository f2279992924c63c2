use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use eesa_api_types::{BatchQuery, Envelope, SnapshotMeta};
use serde::Serialize;

use crate::application::snapshot::BatchSnapshot;
use crate::infra::http::HttpState;

use super::error::ApiError;

pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

#[derive(Serialize)]
struct BatchBody<'a> {
    #[serde(flatten)]
    envelope: &'a Envelope,
    meta: &'a SnapshotMeta,
}

pub async fn batch_data(
    State(state): State<HttpState>,
    query: Result<Query<BatchQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return ApiError::bad_request("Malformed query string", Some(rejection.body_text()))
                .into_response();
        }
    };

    match state.snapshots.get_batch_snapshot_for_query(&query).await {
        Ok(snapshot) => snapshot_response(&snapshot),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn snapshot_response(snapshot: &BatchSnapshot) -> Response {
    let body = BatchBody {
        envelope: snapshot.envelope.as_ref(),
        meta: &snapshot.meta,
    };
    let mut response = Json(body).into_response();
    response.headers_mut().insert(
        CACHE_STATUS_HEADER,
        HeaderValue::from_static(snapshot.meta.cache_status.header_value()),
    );
    response
}
