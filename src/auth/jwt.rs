use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims, ResetClaims};
use crate::config::JwtConfig;
use crate::state::AppState;

/// Why a presented token was rejected. Expiry is reported separately so
/// callers can distinguish it from a bad signature or garbage input.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Signing and verification keys for all three token families. Access and
/// reset tokens share the primary secret; refresh tokens use their own.
#[derive(Clone)]
pub struct JwtKeys {
    primary_encoding: EncodingKey,
    primary_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refreshed_access_ttl: Duration,
    refresh_ttl: Duration,
    reset_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            access_secret,
            refresh_secret,
            access_ttl_minutes,
            refreshed_access_ttl_minutes,
            refresh_ttl_minutes,
            reset_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            primary_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            primary_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            refreshed_access_ttl: Duration::from_secs((refreshed_access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
            reset_ttl: Duration::from_secs((reset_ttl_minutes as u64) * 60),
        }
    }
}

fn timestamps(ttl: Duration) -> (usize, usize) {
    let now = OffsetDateTime::now_utc();
    let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
    (now.unix_timestamp() as usize, exp.unix_timestamp() as usize)
}

fn classify(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    }
}

impl JwtKeys {
    fn sign<C: Serialize>(&self, key: &EncodingKey, claims: &C) -> anyhow::Result<String> {
        Ok(encode(&Header::default(), claims, key)?)
    }

    fn decode_with<C: DeserializeOwned>(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> Result<C, TokenError> {
        let data = decode::<C>(token, key, &Validation::default()).map_err(classify)?;
        Ok(data.claims)
    }

    /// Access token handed out at login. Valid for five hours by default.
    pub fn sign_access(&self, id: Uuid, email: &str) -> anyhow::Result<String> {
        let (iat, exp) = timestamps(self.access_ttl);
        let token = self.sign(
            &self.primary_encoding,
            &AccessClaims {
                id,
                email: email.to_string(),
                iat,
                exp,
            },
        )?;
        debug!(user_id = %id, "access token signed");
        Ok(token)
    }

    /// Short-lived access token minted by the refresh flow.
    pub fn sign_refreshed_access(&self, id: Uuid, email: &str) -> anyhow::Result<String> {
        let (iat, exp) = timestamps(self.refreshed_access_ttl);
        self.sign(
            &self.primary_encoding,
            &AccessClaims {
                id,
                email: email.to_string(),
                iat,
                exp,
            },
        )
    }

    pub fn sign_refresh(&self, id: Uuid) -> anyhow::Result<String> {
        let (iat, exp) = timestamps(self.refresh_ttl);
        let token = self.sign(&self.refresh_encoding, &RefreshClaims { id, iat, exp })?;
        debug!(user_id = %id, "refresh token signed");
        Ok(token)
    }

    pub fn sign_reset(&self, email: &str) -> anyhow::Result<String> {
        let (iat, exp) = timestamps(self.reset_ttl);
        self.sign(
            &self.primary_encoding,
            &ResetClaims {
                email: email.to_string(),
                iat,
                exp,
            },
        )
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.decode_with(token, &self.primary_decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.decode_with(token, &self.refresh_decoding)
    }

    pub fn verify_reset(&self, token: &str) -> Result<ResetClaims, TokenError> {
        self.decode_with(token, &self.primary_decoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id, "a@b.com").expect("sign access");
        let claims = keys.verify_access(&token).expect("verify access");
        assert_eq!(claims.id, user_id);
        assert_eq!(claims.email, "a@b.com");
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn refresh_token_uses_distinct_secret() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let refresh = keys.sign_refresh(user_id).expect("sign refresh");

        // A refresh token is not accepted where an access token is expected.
        assert_eq!(keys.verify_access(&refresh), Err(TokenError::Invalid));

        let claims = keys.verify_refresh(&refresh).expect("verify refresh");
        assert_eq!(claims.id, user_id);
    }

    #[tokio::test]
    async fn access_token_is_not_a_valid_refresh_token() {
        let keys = make_keys();
        let access = keys
            .sign_access(Uuid::new_v4(), "a@b.com")
            .expect("sign access");
        assert_eq!(keys.verify_refresh(&access), Err(TokenError::Invalid));
    }

    #[tokio::test]
    async fn sign_and_verify_reset_token() {
        let keys = make_keys();
        let token = keys.sign_reset("a@b.com").expect("sign reset");
        let claims = keys.verify_reset(&token).expect("verify reset");
        assert_eq!(claims.email, "a@b.com");
    }

    #[tokio::test]
    async fn expired_token_reports_expired() {
        let keys = make_keys();
        // Issued well in the past, beyond the default validation leeway.
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AccessClaims {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
        };
        let token = keys
            .sign(&keys.primary_encoding, &claims)
            .expect("sign expired");
        assert_eq!(keys.verify_access(&token), Err(TokenError::Expired));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        let keys = make_keys();
        assert_eq!(
            keys.verify_access("not-a-token"),
            Err(TokenError::Invalid)
        );
    }
}
