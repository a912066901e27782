use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{ReviewId, ReviewQuery, ReviewSubmission};
use super::service::{ReviewService, ReviewServiceError};
use crate::auth::{AuthenticatedUser, Moderator};
use crate::badges::RecomputeScheduler;
use crate::complexes::ComplexId;
use crate::http::{internal_error, json_error, rejected_body};
use crate::store::Store;

/// Router exposing review intake, listing, and moderation endpoints.
pub fn review_router<S, Q>(service: Arc<ReviewService<S, Q>>) -> Router
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/complexes/:complex_id/reviews",
            get(list_handler::<S, Q>).post(submit_handler::<S, Q>),
        )
        .route(
            "/api/v1/complexes/:complex_id/peak-hours",
            get(peak_hours_handler::<S, Q>),
        )
        .route(
            "/api/v1/reviews/:review_id/verify",
            post(verify_handler::<S, Q>),
        )
        .route("/api/v1/reviews/:review_id/flag", post(flag_handler::<S, Q>))
        .route(
            "/api/v1/reviews/:review_id/helpful",
            post(helpful_handler::<S, Q>),
        )
        .with_state(service)
}

fn error_response(action: &str, err: ReviewServiceError) -> Response {
    match err {
        ReviewServiceError::Validation(err) => {
            json_error(StatusCode::BAD_REQUEST, err.to_string())
        }
        ReviewServiceError::ComplexNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "Apartment complex not found")
        }
        ReviewServiceError::ReviewNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "Review not found")
        }
        ReviewServiceError::Repository(_) => internal_error(action, &err),
    }
}

pub(crate) async fn submit_handler<S, Q>(
    State(service): State<Arc<ReviewService<S, Q>>>,
    user: AuthenticatedUser,
    Path(complex_id): Path<String>,
    submission: Result<Json<ReviewSubmission>, JsonRejection>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    let Json(submission) = match submission {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };
    match service.submit(&ComplexId(complex_id), &user.id, submission) {
        Ok(review) => (StatusCode::CREATED, Json(review)).into_response(),
        Err(err) => error_response("submit review", err),
    }
}

pub(crate) async fn list_handler<S, Q>(
    State(service): State<Arc<ReviewService<S, Q>>>,
    Path(complex_id): Path<String>,
    Query(query): Query<ReviewQuery>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    match service.list(&ComplexId(complex_id), &query) {
        Ok(reviews) => (StatusCode::OK, Json(reviews)).into_response(),
        Err(err) => error_response("list reviews", err),
    }
}

pub(crate) async fn peak_hours_handler<S, Q>(
    State(service): State<Arc<ReviewService<S, Q>>>,
    Path(complex_id): Path<String>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    let complex_id = ComplexId(complex_id);
    match service.peak_hour_summary(&complex_id) {
        Ok(summary) => {
            let payload = json!({
                "complex_id": complex_id,
                "summary": summary,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response("summarise peak hours", err),
    }
}

pub(crate) async fn verify_handler<S, Q>(
    State(service): State<Arc<ReviewService<S, Q>>>,
    Moderator(moderator): Moderator,
    Path(review_id): Path<String>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    match service.verify(&ReviewId(review_id), &moderator.id) {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(err) => error_response("verify review", err),
    }
}

pub(crate) async fn flag_handler<S, Q>(
    State(service): State<Arc<ReviewService<S, Q>>>,
    user: AuthenticatedUser,
    Path(review_id): Path<String>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    match service.flag(&ReviewId(review_id), &user.id) {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(err) => error_response("flag review", err),
    }
}

pub(crate) async fn helpful_handler<S, Q>(
    State(service): State<Arc<ReviewService<S, Q>>>,
    _user: AuthenticatedUser,
    Path(review_id): Path<String>,
) -> Response
where
    S: Store,
    Q: RecomputeScheduler + ?Sized + 'static,
{
    match service.mark_helpful(&ReviewId(review_id)) {
        Ok(review) => {
            let payload = json!({
                "review_id": review.id,
                "helpful_count": review.helpful_count,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response("mark review helpful", err),
    }
}
