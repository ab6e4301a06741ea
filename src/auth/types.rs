// Authentication types

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::id;

/// Kind of token held by the credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Short-lived token sent as `Authorization: Bearer ...`
    Access,
    /// Long-lived token used only against `/auth/refresh`
    Refresh,
}

impl TokenKind {
    /// Storage key for this token kind
    pub fn key(self) -> &'static str {
        match self {
            TokenKind::Access => "access_token",
            TokenKind::Refresh => "refresh_token",
        }
    }
}

/// Access/refresh pair issued by login or refresh
/// Replaced wholesale, never patched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Role attached to a user account
/// Anything other than the exact `USER`/`ADMIN` spellings is kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    User,
    Admin,
    /// Any role this client does not know about, kept verbatim
    Other(String),
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "USER" => UserRole::User,
            "ADMIN" => UserRole::Admin,
            _ => UserRole::Other(s),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::User => "USER".to_string(),
            UserRole::Admin => "ADMIN".to_string(),
            UserRole::Other(s) => s,
        }
    }
}

/// Cached user profile, stored as a JSON blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(deserialize_with = "id::id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    pub role: UserRole,
}

/// Everything the store knows about the current session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCredentials {
    pub tokens: TokenPair,
    pub profile: Option<UserProfile>,
}

// ==================================================================================================
// Auth endpoint payloads
// ==================================================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Response of login, refresh and OTP activation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, deserialize_with = "lenient_profile")]
    pub user: Option<UserProfile>,
}

/// The token pair is what matters; an unreadable `user` is dropped
fn lenient_profile<'de, D>(deserializer: D) -> Result<Option<UserProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(profile) => Ok(Some(profile)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable user profile in auth response: {}", e);
            Ok(None)
        }
    }
}

impl AuthResponse {
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

/// Generic `{ "message": ... }` acknowledgement
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
