//! The request pipeline.
//!
//! # Data Flow
//! ```text
//! execute(ctx)
//!     → claim (controller, cancel group, caller scope)
//!     → loop:
//!         arm deadline
//!         resolve bearer → transport.send          (raced against abort)
//!         settle: disarm deadline
//!         ok  → return
//!         err → on_failure → Resolve | Reject | Retry
//!               Retry → renew attempt, back off (raced against abort), loop
//!     → drop attempt (identity-checked group cleanup)
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::types::MeDto;
use crate::cancel::{AbortReason, CancelGroups};
use crate::config::ClientConfig;
use crate::http::error::{ClientError, ClientResult};
use crate::http::interceptor::{Attempt, Interceptors, Verdict};
use crate::http::navigation::{LogNavigator, Navigator};
use crate::http::request::{RequestContext, RequestOptions};
use crate::http::response::ApiResponse;
use crate::http::transport::Transport;
use crate::observability::metrics;
use crate::resilience::DeadlineTimer;
use crate::session::{ProfileFlights, RefreshPipeline, TokenSlot, TokenStore};

struct Inner {
    config: ClientConfig,
    transport: Transport,
    tokens: Arc<TokenSlot>,
    groups: CancelGroups,
    refresh: Arc<RefreshPipeline>,
    interceptors: Interceptors,
    profile: ProfileFlights,
}

/// Handle to the client runtime. Clones share all session state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    token_store: Option<Arc<dyn TokenStore>>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            token_store: None,
            navigator: Arc::new(LogNavigator),
        }
    }

    #[must_use]
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn build(self) -> ClientResult<ApiClient> {
        let transport = Transport::new(&self.config.api)?;
        let tokens = Arc::new(match self.token_store {
            Some(store) => TokenSlot::new(store),
            None => TokenSlot::default(),
        });
        let groups = CancelGroups::new();
        let refresh = Arc::new(RefreshPipeline::new(tokens.clone(), transport.clone()));
        let interceptors = Interceptors::new(
            tokens.clone(),
            refresh.clone(),
            groups.clone(),
            self.navigator,
            self.config.navigation.clone(),
            self.config.backoff.clone(),
        );

        info!(base_url = %transport.base_url(), "API client ready");

        Ok(ApiClient {
            inner: Arc::new(Inner {
                config: self.config,
                transport,
                tokens,
                groups,
                refresh,
                interceptors,
                profile: ProfileFlights::new(),
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Client with default settings against `API_BASE` (or its default).
    pub fn from_env() -> ClientResult<Self> {
        let config = ClientConfig::from_env().map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn base_url(&self) -> &str {
        self.inner.transport.base_url()
    }

    /// Let the session owner supply where the access token lives.
    pub fn register_token_store(&self, store: Arc<dyn TokenStore>) {
        self.inner.tokens.register(store);
    }

    pub fn tokens(&self) -> &TokenSlot {
        &self.inner.tokens
    }

    pub fn groups(&self) -> &CancelGroups {
        &self.inner.groups
    }

    /// Abort whatever currently owns `group`. Returns true if something was live.
    pub fn abort_group(&self, group: &str) -> bool {
        let aborted = self.inner.groups.abort_group(group);
        if aborted {
            debug!(group = %group, "Cancel group aborted");
        }
        aborted
    }

    /// Refresh now (or join the refresh in flight).
    pub async fn refresh_token(&self) -> ClientResult<String> {
        self.inner.refresh.refresh().await
    }

    /// Recover a session from the refresh cookie; free when a token exists.
    pub async fn prewarm_session(&self) -> bool {
        self.inner.refresh.prewarm().await
    }

    /// Coalesced `GET /me`.
    ///
    /// Strict mode makes sure a token exists first and fails if it cannot.
    /// Anonymous mode yields `None` for a guest.
    pub async fn fetch_me_once(&self, allow_anonymous: bool) -> ClientResult<Option<MeDto>> {
        let client = self.clone();
        self.inner
            .profile
            .flight(allow_anonymous)
            .run(move || async move {
                let options = if allow_anonymous {
                    RequestOptions::new().allow_anonymous()
                } else {
                    client.inner.refresh.ensure_token().await?;
                    RequestOptions::new()
                };
                let response = client.execute(RequestContext::new(Method::GET, "/me", options)).await?;
                if allow_anonymous {
                    response.json_opt::<MeDto>()
                } else {
                    response.json::<MeDto>().map(Some)
                }
            })
            .await
    }

    /// Run one logical request through the interceptor pipeline.
    pub async fn execute(&self, mut ctx: RequestContext) -> ClientResult<ApiResponse> {
        let started = Instant::now();
        let outcome = self.run(&mut ctx).await;
        let elapsed = started.elapsed();

        let status = match &outcome {
            Ok(response) => response.status,
            Err(e) => e.status(),
        };
        metrics::record_request(ctx.method.as_str(), status, elapsed.as_secs_f64());

        match &outcome {
            Ok(_) => debug!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                status = status,
                duration_ms = elapsed.as_millis() as u64,
                "Request completed"
            ),
            Err(e) if e.is_cancellation() => debug!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                error = %e,
                "Request cancelled"
            ),
            Err(e) => warn!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                status = status,
                error = %e,
                "Request failed"
            ),
        }
        outcome
    }

    async fn run(&self, ctx: &mut RequestContext) -> ClientResult<ApiResponse> {
        let interceptors = &self.inner.interceptors;
        let mut attempt = interceptors.claim(ctx);

        loop {
            let error = match self.dispatch(ctx, &attempt).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match interceptors.on_failure(ctx, error).await {
                Verdict::Resolve(response) => return Ok(response),
                Verdict::Reject(error) => return Err(error),
                Verdict::Retry { delay } => {
                    attempt.renew().map_err(|reason| cancelled(ctx, reason))?;
                    if let Some(delay) = delay {
                        self.back_off(ctx, &attempt, delay).await?;
                    }
                }
            }
        }
    }

    /// One network attempt, raced against the attempt's abort paths.
    async fn dispatch(&self, ctx: &RequestContext, attempt: &Attempt) -> ClientResult<ApiResponse> {
        let controller = attempt.controller();
        let _deadline = ctx
            .options
            .timeout
            .map(|after| DeadlineTimer::arm(controller, after));

        let send = async {
            let bearer = self.inner.interceptors.resolve_bearer(ctx).await;
            self.inner.transport.send(ctx, bearer.as_deref()).await
        };

        tokio::select! {
            biased;
            _ = controller.cancelled() => {
                Err(aborted(ctx, controller.reason().unwrap_or(AbortReason::Caller)))
            }
            _ = caller_cancelled(ctx.options.signal.as_ref()) => {
                controller.abort(AbortReason::Caller);
                Err(aborted(ctx, AbortReason::Caller))
            }
            result = send => result,
        }
    }

    /// Sleep between transient retries; aborts end the request here too.
    async fn back_off(&self, ctx: &RequestContext, attempt: &Attempt, delay: Duration) -> ClientResult<()> {
        let controller = attempt.controller();
        tokio::select! {
            biased;
            _ = controller.cancelled() => {
                Err(aborted(ctx, controller.reason().unwrap_or(AbortReason::Caller)))
            }
            _ = caller_cancelled(ctx.options.signal.as_ref()) => {
                controller.abort(AbortReason::Caller);
                Err(aborted(ctx, AbortReason::Caller))
            }
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> ClientResult<ApiResponse> {
        self.execute(RequestContext::new(Method::GET, path, options)).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> ClientResult<ApiResponse> {
        self.execute(RequestContext::new(Method::DELETE, path, options)).await
    }

    /// Send `method` with an optional JSON body.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse> {
        let mut ctx = RequestContext::new(method, path, options);
        if let Some(body) = body {
            ctx = ctx.with_json(body)?;
        }
        self.execute(ctx).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse> {
        self.send_json(Method::POST, path, body, options).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse> {
        self.send_json(Method::PUT, path, body, options).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse> {
        self.send_json(Method::PATCH, path, body, options).await
    }

    /// GET and decode.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ClientResult<T> {
        self.get(path, options).await?.json()
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url())
            .field("tokens", &self.inner.tokens)
            .field("groups", &self.inner.groups.len())
            .field("refresh", &self.inner.refresh)
            .field("profile", &self.inner.profile)
            .finish()
    }
}

async fn caller_cancelled(signal: Option<&CancellationToken>) {
    match signal {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

fn aborted(ctx: &RequestContext, reason: AbortReason) -> ClientError {
    metrics::record_cancellation(reason);
    debug!(
        request_id = %ctx.request_id,
        path = %ctx.path,
        reason = %reason,
        "Attempt aborted"
    );
    ClientError::from_abort(reason, ctx.options.timeout_ms_or_zero())
}

fn cancelled(ctx: &RequestContext, reason: AbortReason) -> ClientError {
    debug!(request_id = %ctx.request_id, path = %ctx.path, reason = %reason, "Retry abandoned");
    ClientError::Cancelled { reason }
}
