// Bearer token injection for outbound requests

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;
use std::sync::Arc;

use super::credentials::CredentialStore;
use super::types::TokenKind;
use crate::error::{ClientError, Result};

/// Attaches the stored access token to every outbound request
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Set `Authorization: Bearer <token>` from the store
    ///
    /// Returns the token that was attached. With no stored token the request
    /// is left exactly as it was; the server's 401 handles that case.
    pub fn authenticate(&self, request: &mut Request) -> Result<Option<String>> {
        let token = self
            .store
            .token(TokenKind::Access)
            .map_err(ClientError::Storage)?;

        match token {
            Some(token) => {
                if set_bearer(request, &token) {
                    Ok(Some(token))
                } else {
                    Ok(None)
                }
            }
            None => {
                tracing::trace!(url = %request.url(), "No access token stored, sending unauthenticated");
                Ok(None)
            }
        }
    }
}

/// Replace any existing Authorization header with a single bearer value
/// Returns false (request untouched) if the token is not a valid header value
pub fn set_bearer(request: &mut Request, token: &str) -> bool {
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
            true
        }
        Err(_) => {
            tracing::warn!("Stored access token is not a valid header value, skipping");
            false
        }
    }
}
