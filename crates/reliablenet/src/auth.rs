//! Bearer token authentication.
//!
//! Callers send `Authorization: Bearer <token>`; tokens map to user ids through
//! `RELIABLENET_API_TOKENS`. The token table travels as an [`ApiAuth`] request extension so
//! every router can use the extractors below without threading it through their state.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;

use crate::config::AuthConfig;
use crate::http::json_error;
use crate::reviews::UserId;

/// Token table shared by all requests.
#[derive(Debug, Clone, Default)]
pub struct ApiAuth {
    config: Arc<AuthConfig>,
}

impl ApiAuth {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn authenticate(&self, token: &str) -> Option<AuthenticatedUser> {
        let id = self.config.api_tokens.get(token)?.clone();
        let moderator = self.config.moderators.contains(&id);
        Some(AuthenticatedUser { id, moderator })
    }
}

/// Caller identity resolved from a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub moderator: bool,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth) = parts.extensions.get::<ApiAuth>() else {
            tracing::error!("ApiAuth extension missing; rejecting request");
            return Err(json_error(
                StatusCode::UNAUTHORIZED,
                "Authentication required",
            ));
        };

        let Some(token) = bearer_token(parts) else {
            tracing::debug!("missing or malformed authorization header");
            return Err(json_error(
                StatusCode::UNAUTHORIZED,
                "Authentication required",
            ));
        };

        auth.authenticate(token).ok_or_else(|| {
            tracing::debug!("invalid api token");
            json_error(StatusCode::UNAUTHORIZED, "Authentication required")
        })
    }
}

/// Authenticated caller listed in `RELIABLENET_MODERATORS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moderator(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for Moderator
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if user.moderator {
            Ok(Moderator(user))
        } else {
            tracing::debug!(user = %user.id, "moderator role required");
            Err(json_error(StatusCode::FORBIDDEN, "Moderator role required"))
        }
    }
}
