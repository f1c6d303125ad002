use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;

/// Identity attached to a request after the token passed every gate:
/// header present, token present, not blacklisted, signature and expiry valid.
#[derive(Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

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
            .ok_or_else(|| ApiError::unauthorized("Authorization header is missing"))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Token is missing"))?;

        // Revocation wins over an otherwise valid signature.
        if state.tokens.is_revoked(token).await {
            warn!("rejected blacklisted token");
            return Err(ApiError::forbidden("Token has been invalidated"));
        }

        let claims = JwtKeys::from_ref(state).verify_access(token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::forbidden("Invalid or expired token")
        })?;

        Ok(AuthUser {
            id: claims.id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header("authorization", v);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    async fn extract(state: &AppState, header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut parts = parts_with_header(header);
        AuthUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn missing_header_is_401() {
        let state = AppState::fake();
        let err = extract(&state, None).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_token_after_scheme_is_401() {
        let state = AppState::fake();
        let err = extract(&state, Some("Bearer ")).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let id = Uuid::new_v4();
        let token = keys.sign_access(id, "a@b.com").unwrap();

        let user = extract(&state, Some(&format!("Bearer {token}")))
            .await
            .expect("extractor should accept the token");
        assert_eq!(user.id, id);
        assert_eq!(user.email, "a@b.com");
    }

    #[tokio::test]
    async fn revoked_token_is_403_despite_valid_signature() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(Uuid::new_v4(), "a@b.com").unwrap();

        state.tokens.revoke(&token).await;

        let err = extract(&state, Some(&format!("Bearer {token}")))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn bad_signature_is_403() {
        let state = AppState::fake();
        let err = extract(&state, Some("Bearer not-a-real-token"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}
