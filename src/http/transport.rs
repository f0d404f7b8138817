//! Wire transport: one `reqwest` client, one base URL, one cookie jar.
//!
//! The cookie jar carries the refresh credential between `/auth/login`,
//! `/auth/refresh` and `/auth/logout`; the access token never touches it.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use url::Url;

use crate::config::ApiConfig;
use crate::http::error::{ClientError, ClientResult};
use crate::http::request::{RequestContext, RequestOptions, X_REQUEST_ID};
use crate::http::response::{error_message, ApiResponse};

pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    base_url: String,
    refresh_timeout: Duration,
}

impl Transport {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            refresh_timeout: config.refresh_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Url::parse(&joined).map_err(|e| ClientError::InvalidRequest(format!("bad URL '{}': {}", joined, e)))
    }

    /// Send one attempt. Non-2xx statuses come back as [`ClientError::Http`].
    pub async fn send(&self, ctx: &RequestContext, bearer: Option<&str>) -> ClientResult<ApiResponse> {
        let url = self.url(&ctx.path)?;

        let mut request = self
            .client
            .request(ctx.method.clone(), url)
            .header(X_REQUEST_ID, ctx.request_id.to_string())
            .header(ACCEPT, "application/json");

        if !ctx.options.query.is_empty() {
            request = request.query(&ctx.options.query);
        }

        match &ctx.body {
            Some(body) => request = request.json(body),
            None if ctx.method != Method::GET && ctx.method != Method::DELETE => {
                request = request.header(CONTENT_TYPE, "application/json");
            }
            None => {}
        }

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(ClientError::from_transport)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(ClientError::from_transport)?
            .to_vec();

        if !(200..300).contains(&status) {
            return Err(ClientError::Http {
                status,
                method: ctx.method.to_string(),
                path: ctx.path.clone(),
                message: error_message(&body),
            });
        }

        Ok(ApiResponse::new(status, headers, body))
    }

    /// `POST /auth/refresh` with the cookie credential only.
    /// Bounded by the configured refresh timeout.
    pub async fn refresh_access_token(&self) -> ClientResult<String> {
        let ctx = RequestContext::new(Method::POST, REFRESH_PATH, RequestOptions::new().skip_auth_header());
        let response = tokio::time::timeout(self.refresh_timeout, self.send(&ctx, None))
            .await
            .map_err(|_| ClientError::Timeout {
                after_ms: self.refresh_timeout.as_millis() as u64,
            })??;
        parse_access_token(&response)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

/// Extract `accessToken`; anything missing or blank is malformed.
pub(crate) fn parse_access_token(response: &ApiResponse) -> ClientResult<String> {
    let parsed: TokenResponse = serde_json::from_slice(&response.body)
        .map_err(|e| ClientError::MalformedRefresh(e.to_string()))?;
    match parsed.access_token {
        Some(token) if !token.trim().is_empty() => Ok(token),
        Some(_) => Err(ClientError::MalformedRefresh("accessToken is empty".to_string())),
        None => Err(ClientError::MalformedRefresh("accessToken is missing".to_string())),
    }
}
