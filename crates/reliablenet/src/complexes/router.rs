use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::domain::{ComplexId, ComplexQuery, NewComplex, NewIspLink, SpeedTestSample};
use super::service::{ComplexService, ComplexServiceError};
use crate::auth::AuthenticatedUser;
use crate::badges::RecomputeScheduler;
use crate::http::{internal_error, json_error, rejected_body};
use crate::store::Store;

/// Router exposing complex registration, search, and provider bookkeeping.
pub fn complex_router<S, Q>(service: Arc<ComplexService<S, Q>>) -> Router
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/complexes",
            get(list_handler::<S, Q>).post(create_handler::<S, Q>),
        )
        .route("/api/v1/complexes/:complex_id", get(detail_handler::<S, Q>))
        .route(
            "/api/v1/complexes/:complex_id/isps",
            post(attach_isp_handler::<S, Q>),
        )
        .route(
            "/api/v1/complexes/:complex_id/speed-tests",
            post(speed_test_handler::<S, Q>),
        )
        .with_state(service)
}

fn error_response(action: &str, err: ComplexServiceError) -> Response {
    match err {
        ComplexServiceError::Validation(err) => {
            json_error(StatusCode::BAD_REQUEST, err.to_string())
        }
        ComplexServiceError::ComplexNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "Apartment complex not found")
        }
        ComplexServiceError::DuplicateIsp(_) => json_error(StatusCode::CONFLICT, err.to_string()),
        ComplexServiceError::IspNotLinked(_) => json_error(StatusCode::NOT_FOUND, err.to_string()),
        ComplexServiceError::Repository(_) => internal_error(action, &err),
    }
}

pub(crate) async fn create_handler<S, Q>(
    State(service): State<Arc<ComplexService<S, Q>>>,
    _user: AuthenticatedUser,
    payload: Result<Json<NewComplex>, JsonRejection>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    let Json(payload) = match payload {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };
    match service.create(payload) {
        Ok(complex) => (StatusCode::CREATED, Json(complex)).into_response(),
        Err(err) => error_response("create apartment complex", err),
    }
}

pub(crate) async fn list_handler<S, Q>(
    State(service): State<Arc<ComplexService<S, Q>>>,
    Query(query): Query<ComplexQuery>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    match service.list(&query) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response("list apartment complexes", err),
    }
}

pub(crate) async fn detail_handler<S, Q>(
    State(service): State<Arc<ComplexService<S, Q>>>,
    Path(complex_id): Path<String>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    match service.get(&ComplexId(complex_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response("load apartment complex", err),
    }
}

pub(crate) async fn attach_isp_handler<S, Q>(
    State(service): State<Arc<ComplexService<S, Q>>>,
    _user: AuthenticatedUser,
    Path(complex_id): Path<String>,
    payload: Result<Json<NewIspLink>, JsonRejection>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    let Json(payload) = match payload {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };
    match service.attach_isp(&ComplexId(complex_id), payload) {
        Ok(link) => (StatusCode::CREATED, Json(link)).into_response(),
        Err(err) => error_response("attach isp", err),
    }
}

pub(crate) async fn speed_test_handler<S, Q>(
    State(service): State<Arc<ComplexService<S, Q>>>,
    user: AuthenticatedUser,
    Path(complex_id): Path<String>,
    sample: Result<Json<SpeedTestSample>, JsonRejection>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    let Json(sample) = match sample {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };
    let complex_id = ComplexId(complex_id);
    tracing::debug!(%complex_id, user = %user.id, isp = %sample.isp, "speed test submitted");
    match service.record_speed_test(&complex_id, sample) {
        Ok(link) => (StatusCode::CREATED, Json(link)).into_response(),
        Err(err) => error_response("record speed test", err),
    }
}
