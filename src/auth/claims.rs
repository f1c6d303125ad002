use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of an access token. Proves identity on protected requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: Uuid,      // user ID
    pub email: String, // user email
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
}

/// Payload of a refresh token. Signed with its own secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// Payload of a password-reset token. Carries only the account email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}
