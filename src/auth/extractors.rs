use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, auth::repo::User, error::ApiError, state::AppState};

/// Extracts the bearer token, validates it, and confirms the subject user
/// still exists. A deleted user's outstanding tokens stop working
/// immediately.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::auth("missing Authorization header"))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::auth("invalid auth scheme"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::auth("invalid or expired token")
        })?;

        if !User::exists(&state.db, claims.sub).await? {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            return Err(ApiError::auth("invalid or expired token"));
        }

        Ok(AuthUser(claims.sub))
    }
}
