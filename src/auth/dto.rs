use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user signup. Presence of the required fields is checked
/// in the handler so a missing field is a 400, not a deserialization error.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub birthdate: Option<String>,
    pub profile_picture: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile_number: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_number: String,
    pub birthdate: String,
    pub subscription_status: bool,
    pub profile_picture: Option<String>,
}

/// Request body for the profile update. Every profile field is overwritten.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_number: String,
    pub birthdate: String,
}

/// Request body for the password change.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub user_id: Option<Uuid>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

/// Request body for token refresh. The mobile clients send camelCase here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub user_id: Option<Uuid>,
    pub old_refresh_token: Option<String>,
}

/// Response of the refresh flow: a rotated refresh token plus a short-lived
/// access token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Request body for recording a payment. order_id is the only optional field.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub user_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub currency: Option<String>,
    pub subscription_plan_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AppVersionRequest {
    pub version: Option<String>,
}

/// `result` is true when the supplied version is the latest known one.
#[derive(Debug, Serialize)]
pub struct AppVersionResponse {
    pub result: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_request_uses_camel_case() {
        let id = Uuid::new_v4();
        let body = format!(r#"{{"userId":"{id}","oldRefreshToken":"tok"}}"#);
        let parsed: RefreshRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.user_id, Some(id));
        assert_eq!(parsed.old_refresh_token.as_deref(), Some("tok"));
    }

    #[test]
    fn refresh_response_uses_camel_case() {
        let json = serde_json::to_string(&RefreshResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
        })
        .unwrap();
        assert!(json.contains("accessToken"));
        assert!(json.contains("refreshToken"));
    }
}
