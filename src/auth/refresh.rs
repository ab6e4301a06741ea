// Token refresh logic
// Recovers from an expired access token by exchanging the refresh token

use reqwest::Request;
use std::sync::Arc;

use super::credentials::CredentialStore;
use super::types::TokenKind;
use crate::api::AuthApi;
use crate::error::{ClientError, Result};

/// Per-request bookkeeping carried alongside an outbound request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptContext {
    /// Set on the resubmission that follows a refresh
    pub retried: bool,

    /// Access token the request was sent with
    pub sent_token: Option<String>,
}

impl AttemptContext {
    pub fn first() -> Self {
        Self::default()
    }

    /// Context for the single resubmission after a refresh
    pub fn into_retry(self) -> Self {
        Self {
            retried: true,
            sent_token: None,
        }
    }
}

/// Refresh state machine, one walk per failing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
    Retrying,
    Failed,
}

/// What the caller should do with a 401
#[derive(Debug)]
pub enum RefreshOutcome {
    /// Resubmit `request` once, authenticated with `access_token`
    Retry {
        request: Request,
        access_token: String,
    },
    /// Return the 401 response to the caller untouched
    PassThrough,
}

/// Refresh coordinator
/// Turns an authentication failure into at most one refresh and one retry
#[derive(Clone)]
pub struct RefreshCoordinator {
    store: Arc<dyn CredentialStore>,
    auth_api: AuthApi,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<dyn CredentialStore>, auth_api: AuthApi) -> Self {
        Self { store, auth_api }
    }

    /// Handle a 401 for a request sent under `ctx`
    ///
    /// `pending` is a clone of the original request taken before it was sent;
    /// `None` means the body could not be cloned and the request cannot be
    /// replayed.
    pub async fn recover(
        &self,
        pending: Option<Request>,
        ctx: &AttemptContext,
    ) -> Result<RefreshOutcome> {
        let mut state = RefreshState::Idle;

        if ctx.retried {
            tracing::debug!("401 on a retried request, not refreshing again");
            return Ok(RefreshOutcome::PassThrough);
        }

        let Some(request) = pending else {
            tracing::warn!("401 on a request with a non-replayable body, not refreshing");
            return Ok(RefreshOutcome::PassThrough);
        };

        let refresh_token = match self.read(TokenKind::Refresh)? {
            Some(token) => token,
            None => {
                transition(&mut state, RefreshState::Failed);
                tracing::warn!("No refresh token stored, re-authentication required");
                return Err(ClientError::SessionExpired(
                    "No refresh token available".to_string(),
                ));
            }
        };

        // Another request may already have refreshed while this one was in flight.
        // Only a request that actually carried a token can be stale.
        let current = self.read(TokenKind::Access)?;
        let access_token = match (current, ctx.sent_token.as_deref()) {
            (Some(current), Some(sent)) if sent != current => {
                tracing::debug!("Stored access token changed since request was sent, reusing it");
                current
            }
            _ => {
                transition(&mut state, RefreshState::Refreshing);
                match self.refresh(&refresh_token).await {
                    Ok(token) => token,
                    Err(e) => {
                        transition(&mut state, RefreshState::Failed);
                        return Err(e);
                    }
                }
            }
        };

        transition(&mut state, RefreshState::Retrying);
        Ok(RefreshOutcome::Retry {
            request,
            access_token,
        })
    }

    /// Exchange the refresh token and persist the result
    /// On any failure the whole store is cleared
    async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let response = match self.auth_api.refresh(refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error_kind = e.kind(), "Token refresh failed: {}", e);
                self.invalidate_session();
                return Err(ClientError::SessionExpired(format!(
                    "Token refresh failed: {}",
                    e
                )));
            }
        };

        self.store
            .save_tokens(&response.token_pair())
            .map_err(ClientError::Storage)?;

        if let Some(ref user) = response.user {
            if let Err(e) = self.store.save_profile(user) {
                tracing::warn!("Failed to cache refreshed user profile: {:#}", e);
            }
        }

        tracing::info!("Access token refreshed");
        Ok(response.access_token)
    }

    fn invalidate_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!("Failed to clear credential store: {:#}", e);
        }
    }

    fn read(&self, kind: TokenKind) -> Result<Option<String>> {
        self.store.token(kind).map_err(ClientError::Storage)
    }
}

fn transition(state: &mut RefreshState, next: RefreshState) {
    tracing::debug!(from = ?state, to = ?next, "Refresh state transition");
    *state = next;
}
