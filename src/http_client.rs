use anyhow::Context;
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::api::AuthApi;
use crate::auth::{
    set_bearer, AttemptContext, Authenticator, CredentialStore, RefreshCoordinator,
    RefreshOutcome,
};
use crate::config::Config;
use crate::error::{ClientError, ErrorPayload, Result};

/// HTTP client for the storefront API
/// Every request is authenticated from the credential store; a 401 goes
/// through the refresh coordinator and is retried at most once
pub struct StorefrontHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    config: Config,

    store: Arc<dyn CredentialStore>,

    authenticator: Authenticator,

    coordinator: RefreshCoordinator,

    /// Unauthenticated auth endpoints
    auth_api: AuthApi,
}

impl StorefrontHttpClient {
    /// Create a new HTTP client
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.http_connect_timeout))
            .timeout(Duration::from_secs(config.http_request_timeout))
            .user_agent(concat!("storefront-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let auth_api = AuthApi::new(client.clone(), config.clone());

        Ok(Self {
            authenticator: Authenticator::new(store.clone()),
            coordinator: RefreshCoordinator::new(store.clone(), auth_api.clone()),
            client,
            config: config.clone(),
            store,
            auth_api,
        })
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn auth_api(&self) -> &AuthApi {
        &self.auth_api
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start building a request for an API path
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.endpoint(path))
    }

    /// Execute an authenticated request
    ///
    /// Returns the final response whatever its status. Only transport errors
    /// and unrecoverable sessions are reported as errors here.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();

        let mut request = request;
        let mut ctx = AttemptContext::first();
        let mut retry_token: Option<String> = None;

        loop {
            ctx.sent_token = match retry_token.take() {
                Some(token) => set_bearer(&mut request, &token).then_some(token),
                None => self.authenticator.authenticate(&mut request)?,
            };

            // Keep a copy in case this attempt has to be replayed after a refresh
            let pending = if ctx.retried {
                None
            } else {
                request.try_clone()
            };

            tracing::debug!(
                request_id = %request_id,
                method = %method,
                url = %url,
                retried = ctx.retried,
                "Sending HTTP request"
            );

            let response = self.client.execute(request).await.map_err(|e| {
                tracing::warn!(
                    request_id = %request_id,
                    error_kind = transport_error_kind(&e),
                    url = %url,
                    "HTTP request error: {}",
                    e
                );
                ClientError::Network(e)
            })?;

            let status = response.status();
            tracing::debug!(request_id = %request_id, status = %status, "Received HTTP response");

            if status != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            tracing::warn!(request_id = %request_id, url = %url, retried = ctx.retried, "Received 401");

            match self.coordinator.recover(pending, &ctx).await? {
                RefreshOutcome::Retry {
                    request: next,
                    access_token,
                } => {
                    request = next;
                    retry_token = Some(access_token);
                    ctx = ctx.into_retry();
                }
                RefreshOutcome::PassThrough => return Ok(response),
            }
        }
    }

    /// Execute and decode a JSON body, mapping non-2xx to `ClientError::Api`
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let request = builder.build()?;
        let response = self.execute(request).await?;
        read_json(response).await
    }

    /// Execute and discard the body, mapping non-2xx to `ClientError::Api`
    pub async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        let request = builder.build()?;
        let response = self.execute(request).await?;
        check_status(response).await.map(|_| ())
    }
}

/// Turn a non-2xx response into `ClientError::Api`
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let payload = ErrorPayload::from_body(&body);

    tracing::debug!(
        status = status.as_u16(),
        url = %url,
        message = %payload.message,
        "API returned error response"
    );

    Err(ClientError::Api {
        status: status.as_u16(),
        payload,
    })
}

/// Decode a JSON response body; an empty body decodes as `{}`
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response).await?;
    let text = response.text().await?;
    let body = if text.trim().is_empty() { "{}" } else { text.as_str() };

    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(body = %body, "Unexpected response body");
        ClientError::Decode(e.to_string())
    })
}

/// Categorize a transport error for logs
fn transport_error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}
