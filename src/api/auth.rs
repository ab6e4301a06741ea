// Auth endpoints
// Fire-once calls: no retries or backoff at this layer

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{
    AuthResponse, EmailRequest, LoginRequest, MessageResponse, OtpRequest, RefreshRequest,
    RegisterRequest, ResetPasswordRequest,
};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::http_client::read_json;

/// Client for `/auth/*`
///
/// Uses a plain `reqwest::Client`, never the authenticated pipeline, so a
/// failing refresh can not recurse into another refresh.
#[derive(Clone)]
pub struct AuthApi {
    client: Client,
    config: Config,
}

impl AuthApi {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.post("/auth/login", request, None).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse> {
        self.post("/auth/register", request, None).await
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response: AuthResponse = self.post("/auth/refresh", &request, None).await?;

        if response.access_token.is_empty() {
            return Err(ClientError::Decode(
                "Refresh response does not contain accessToken".to_string(),
            ));
        }

        Ok(response)
    }

    /// Invalidate the refresh token server-side
    /// Sent with the current access token as-is; logout never triggers a refresh
    pub async fn logout(
        &self,
        access_token: Option<&str>,
        refresh_token: &str,
    ) -> Result<MessageResponse> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post("/auth/logout", &request, access_token).await
    }

    pub async fn activate_user_by_otp(&self, email: &str, otp: &str) -> Result<AuthResponse> {
        let request = OtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        self.post("/auth/activateUserByOtp", &request, None).await
    }

    pub async fn generate_new_otp(&self, email: &str) -> Result<MessageResponse> {
        let request = EmailRequest {
            email: email.to_string(),
        };
        self.post("/auth/generateNewOtp", &request, None).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse> {
        let request = EmailRequest {
            email: email.to_string(),
        };
        self.post("/auth/forgotPassword", &request, None).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<MessageResponse> {
        self.post("/auth/resetPassword", request, None).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T> {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "Sending auth request");

        let mut builder = self.client.post(&url).json(body);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(url = %url, "Auth request failed: {}", e);
            ClientError::Network(e)
        })?;

        read_json(response).await
    }
}
