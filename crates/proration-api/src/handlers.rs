//! HTTP handlers for the proration API.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Uri},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use proration_engine::{Proration, prorate as run_engine};
use proration_types::AllocationRequest;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::types::{HealthResponse, SERVICE_NAME, ServiceInfo};
use crate::validation::{InputError, validate_request};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `GET /` and `GET /api`
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo::current())
}

/// `GET /api/health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.elapsed().as_secs(),
    })
}

/// `POST /api/prorate`
///
/// Responds with the flat `{id: amount}` mapping. Every response carries an
/// `x-request-id` header; error bodies repeat it.
pub async fn prorate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AllocationRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("prorate", request_id = %request_id);

    let mut response = match span.in_scope(|| prorate_request(&state, payload)) {
        Ok(run) => Json(run.allocations).into_response(),
        Err(err) => {
            let _guard = span.enter();
            match &err {
                ApiError::Validation(input) => info!(error = %input, "Rejected proration request"),
                ApiError::Proration(reason) => warn!(error = %reason, "Proration failed"),
                other => error!(error = ?other, "Unexpected proration failure"),
            }
            (err.status_code(), Json(err.to_response(Some(request_id.clone())))).into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn prorate_request(
    state: &AppState,
    payload: Result<Json<AllocationRequest>, JsonRejection>,
) -> ApiResult<Proration> {
    let Json(request) = payload.map_err(|rejection| InputError::Malformed(rejection.body_text()))?;
    validate_request(&request, &state.config.limits)?;

    let run = run_engine(request.pool, &request.claims)?;
    info!(
        claims = request.claims.len(),
        pool = request.pool,
        total_requested = run.total_requested,
        allocated = run.allocations.total(),
        outcome = ?run.outcome,
        iterations = run.iterations,
        "Prorated request"
    );
    Ok(run)
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path().to_string())
}

/// Turns a handler panic into the generic internal error payload.
pub fn handle_panic(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    error!("Handler panicked; returning internal error");
    ApiError::internal().into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn panic_becomes_internal_error() {
        let response = handle_panic(Box::new("slot index out of range"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
