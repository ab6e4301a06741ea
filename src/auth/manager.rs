use std::sync::Arc;

use super::credentials::CredentialStore;
use super::types::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest, TokenKind,
    UserProfile,
};
use crate::api::AuthApi;
use crate::error::{ClientError, Result};
use crate::http_client::StorefrontHttpClient;

/// Session manager
/// Drives login, registration and logout and keeps the credential store in
/// step with the server's view of the session
pub struct SessionManager {
    http: Arc<StorefrontHttpClient>,
}

impl SessionManager {
    pub fn new(http: Arc<StorefrontHttpClient>) -> Self {
        Self { http }
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.http.store()
    }

    fn api(&self) -> &AuthApi {
        self.http.auth_api()
    }

    /// Log in and persist the issued tokens and profile
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<UserProfile>> {
        let response = self
            .api()
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        tracing::info!(email = %email, "Logged in");
        self.establish(response)
    }

    /// Create an account; the email is kept until the OTP is verified
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        dob: Option<&str>,
    ) -> Result<MessageResponse> {
        let response = self
            .api()
            .register(&RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                dob: dob.map(str::to_string),
            })
            .await?;

        self.store()
            .save_registration_email(email)
            .map_err(ClientError::Storage)?;
        tracing::info!(email = %email, "Registered, awaiting OTP");
        Ok(response)
    }

    /// Activate the pending registration; logs the user in on success
    pub async fn verify_otp(&self, otp: &str) -> Result<Option<UserProfile>> {
        let email = self.pending_email()?;
        let response = self.api().activate_user_by_otp(&email, otp).await?;

        self.store()
            .clear_registration_email()
            .map_err(ClientError::Storage)?;
        tracing::info!(email = %email, "Account activated");
        self.establish(response)
    }

    /// Ask for a fresh OTP for the pending registration
    pub async fn resend_otp(&self) -> Result<MessageResponse> {
        let email = self.pending_email()?;
        self.api().generate_new_otp(&email).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse> {
        self.api().forgot_password(email).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        self.api()
            .reset_password(&ResetPasswordRequest {
                email: email.to_string(),
                otp: otp.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    /// End the session
    /// The server call is best-effort; local state is cleared regardless
    pub async fn logout(&self) -> Result<()> {
        let access = self.token(TokenKind::Access)?;
        let refresh = self.token(TokenKind::Refresh)?;

        if let Some(refresh) = refresh {
            if let Err(e) = self.api().logout(access.as_deref(), &refresh).await {
                tracing::warn!(error_kind = e.kind(), "Server logout failed: {}", e);
            }
        }

        self.store().clear().map_err(ClientError::Storage)?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub fn is_logged_in(&self) -> Result<bool> {
        Ok(self
            .store()
            .session()
            .map_err(ClientError::Storage)?
            .is_some())
    }

    /// Cached profile of the logged-in user
    pub fn current_user(&self) -> Result<Option<UserProfile>> {
        self.store().profile().map_err(ClientError::Storage)
    }

    pub fn pending_registration(&self) -> Result<Option<String>> {
        self.store()
            .registration_email()
            .map_err(ClientError::Storage)
    }

    fn pending_email(&self) -> Result<String> {
        self.pending_registration()?.ok_or_else(|| {
            ClientError::Config("No pending registration; register first".to_string())
        })
    }

    fn token(&self, kind: TokenKind) -> Result<Option<String>> {
        self.store().token(kind).map_err(ClientError::Storage)
    }

    fn establish(&self, response: AuthResponse) -> Result<Option<UserProfile>> {
        let store = self.store();
        store
            .save_tokens(&response.token_pair())
            .map_err(ClientError::Storage)?;

        if let Some(ref user) = response.user {
            store.save_profile(user).map_err(ClientError::Storage)?;
        }

        Ok(response.user)
    }
}
