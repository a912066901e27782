use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::catalog::{BadgeDefinition, BADGE_CATALOG};
use super::service::{BadgeService, BadgeServiceError};
use crate::auth::AuthenticatedUser;
use crate::complexes::ComplexId;
use crate::http::{internal_error, json_error};
use crate::store::Store;

/// Router exposing the badge catalog and the explicit recompute trigger.
pub fn badge_router<S>(service: Arc<BadgeService<S>>) -> Router
where
    S: Store,
{
    Router::new()
        .route("/api/v1/badges", get(catalog_handler))
        .route(
            "/api/v1/complexes/:complex_id/badges",
            post(recompute_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn catalog_handler() -> Json<&'static [BadgeDefinition]> {
    Json(BADGE_CATALOG.as_slice())
}

pub(crate) async fn recompute_handler<S>(
    State(service): State<Arc<BadgeService<S>>>,
    user: AuthenticatedUser,
    Path(complex_id): Path<String>,
) -> Response
where
    S: Store,
{
    let complex_id = ComplexId(complex_id);
    tracing::debug!(%complex_id, user = %user.id, "explicit badge recompute requested");

    match service.recompute(&complex_id) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(BadgeServiceError::ComplexNotFound(_)) => {
            json_error(StatusCode::NOT_FOUND, "Apartment complex not found")
        }
        Err(err) => internal_error("recalculate badges", &err),
    }
}
