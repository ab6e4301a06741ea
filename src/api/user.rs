use reqwest::Method;
use std::sync::Arc;

use crate::auth::UserProfile;
use crate::error::{ClientError, Result};
use crate::http_client::StorefrontHttpClient;
use crate::models::{ChangePasswordRequest, UpdateProfileRequest};

/// The logged-in user's account
/// Profile reads and updates keep the cached profile in the store current
#[derive(Clone)]
pub struct UserApi {
    http: Arc<StorefrontHttpClient>,
}

impl UserApi {
    pub fn new(http: Arc<StorefrontHttpClient>) -> Self {
        Self { http }
    }

    pub async fn me(&self) -> Result<UserProfile> {
        let profile: UserProfile = self
            .http
            .send_json(self.http.request(Method::GET, "/user/me"))
            .await?;
        self.cache(&profile)?;
        Ok(profile)
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<UserProfile> {
        let profile: UserProfile = self
            .http
            .send_json(self.http.request(Method::PUT, "/user/me").json(request))
            .await?;
        self.cache(&profile)?;
        Ok(profile)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<()> {
        self.http
            .send_empty(self.http.request(Method::PUT, "/user/password").json(request))
            .await
    }

    fn cache(&self, profile: &UserProfile) -> Result<()> {
        self.http
            .store()
            .save_profile(profile)
            .map_err(ClientError::Storage)
    }
}
