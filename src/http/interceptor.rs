//! Request and response interceptors.
//!
//! # Responsibilities
//! - Claim a fresh abort controller per attempt and register it in the cancel group
//! - Chain the caller's cancellation scope into that controller
//! - Resolve the bearer token for the attempt
//! - Classify a failed attempt: resolve, reject, or retry
//!
//! # Design Decisions
//! - The verdict is data; the client loop owns the resubmission, so neither
//!   retry path recurses
//! - A retrying request keeps its group slot by handing it over to the next
//!   attempt's controller; a request superseded between attempts stops there

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cancel::{AbortController, AbortReason, CancelGroups, GroupLease};
use crate::config::{BackoffConfig, NavigationConfig};
use crate::http::error::ClientError;
use crate::http::navigation::{is_under, Navigator};
use crate::http::request::{BearerPolicy, RequestContext};
use crate::http::response::ApiResponse;
use crate::observability::metrics::{self, RetryKind};
use crate::resilience::{compute_backoff, should_retry};
use crate::session::{RefreshPipeline, TokenSlot};

/// What to do with a failed attempt.
#[derive(Debug)]
pub enum Verdict {
    /// Settle successfully with this response.
    Resolve(ApiResponse),
    /// Settle with this error.
    Reject(ClientError),
    /// Resubmit, after `delay` if any.
    Retry { delay: Option<Duration> },
}

/// Cancellation state of one attempt.
#[derive(Debug)]
pub struct Attempt {
    controller: AbortController,
    lease: Option<GroupLease>,
}

impl Attempt {
    pub fn controller(&self) -> &AbortController {
        &self.controller
    }

    /// Swap in a fresh controller for the next attempt.
    ///
    /// Fails with the abort reason if the request was cancelled for any
    /// reason other than its own deadline.
    pub fn renew(&mut self) -> Result<(), AbortReason> {
        match self.controller.reason() {
            Some(AbortReason::Timeout) | None => {}
            Some(reason) => return Err(reason),
        }

        let next = AbortController::new();
        if let Some(lease) = self.lease.as_mut() {
            if !lease.handover(&next) {
                return Err(AbortReason::Superseded);
            }
        }
        self.controller = next;
        Ok(())
    }
}

pub struct Interceptors {
    tokens: Arc<TokenSlot>,
    refresh: Arc<RefreshPipeline>,
    groups: CancelGroups,
    navigator: Arc<dyn Navigator>,
    navigation: NavigationConfig,
    backoff: BackoffConfig,
}

impl Interceptors {
    pub fn new(
        tokens: Arc<TokenSlot>,
        refresh: Arc<RefreshPipeline>,
        groups: CancelGroups,
        navigator: Arc<dyn Navigator>,
        navigation: NavigationConfig,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            tokens,
            refresh,
            groups,
            navigator,
            navigation,
            backoff,
        }
    }

    /// Request side, cancellation: controller, group registration, caller scope.
    pub fn claim(&self, ctx: &RequestContext) -> Attempt {
        let controller = AbortController::new();
        let lease = ctx
            .options
            .cancel_group
            .as_deref()
            .map(|group| self.groups.lease(group, &controller));

        if ctx.options.signal.as_ref().is_some_and(CancellationToken::is_cancelled) {
            controller.abort(AbortReason::Caller);
        }

        Attempt { controller, lease }
    }

    /// Request side, auth: the bearer to attach to this attempt, if any.
    ///
    /// A failed refresh is swallowed; the request goes out unauthenticated.
    pub async fn resolve_bearer(&self, ctx: &RequestContext) -> Option<String> {
        if let Some(token) = &ctx.bearer_override {
            return Some(token.clone());
        }
        match ctx.bearer_policy() {
            BearerPolicy::Never => None,
            BearerPolicy::IfPresent => Some(self.tokens.get()).filter(|t| !t.is_empty()),
            BearerPolicy::Resolve => self.refresh.usable_token().await,
        }
    }

    /// Response side: classify a failed attempt.
    pub async fn on_failure(&self, ctx: &mut RequestContext, error: ClientError) -> Verdict {
        if error.is_forbidden() && is_under(&self.navigation.admin_prefix, &ctx.path) {
            warn!(
                request_id = %ctx.request_id,
                path = %ctx.path,
                location = %self.navigation.denied_location,
                "Admin access denied, redirecting"
            );
            self.navigator.redirect(&self.navigation.denied_location);
            return Verdict::Reject(error);
        }

        if error.is_unauthenticated() {
            return self.on_unauthenticated(ctx, error).await;
        }

        if should_retry(&ctx.method, ctx.retry_attempt, ctx.options.retry, &error) {
            let delay = compute_backoff(ctx.retry_attempt, &self.backoff);
            ctx.retry_attempt += 1;
            metrics::record_retry(RetryKind::Transient);
            debug!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                attempt = ctx.retry_attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying transient failure"
            );
            return Verdict::Retry { delay: Some(delay) };
        }

        Verdict::Reject(error)
    }

    async fn on_unauthenticated(&self, ctx: &mut RequestContext, error: ClientError) -> Verdict {
        if ctx.options.allow_anonymous {
            debug!(request_id = %ctx.request_id, path = %ctx.path, "Anonymous call unauthenticated, resolving empty");
            return Verdict::Resolve(ApiResponse::anonymous_no_content());
        }

        if ctx.is_auth_endpoint() || ctx.retried_for_auth {
            return Verdict::Reject(error);
        }

        ctx.retried_for_auth = true;
        match self.refresh.refresh().await {
            Ok(token) => {
                ctx.bearer_override = Some(token);
                metrics::record_retry(RetryKind::Auth);
                debug!(request_id = %ctx.request_id, path = %ctx.path, "Retrying with refreshed token");
                Verdict::Retry { delay: None }
            }
            Err(refresh_error) => Verdict::Reject(refresh_error),
        }
    }
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("groups", &self.groups.len())
            .field("navigation", &self.navigation)
            .field("backoff", &self.backoff)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::http::navigation::LogNavigator;
    use crate::http::request::RequestOptions;
    use crate::http::transport::Transport;
    use reqwest::Method;

    fn interceptors() -> (Arc<TokenSlot>, CancelGroups, Interceptors) {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            ..ApiConfig::default()
        };
        let tokens = Arc::new(TokenSlot::default());
        let transport = Transport::new(&config).unwrap();
        let refresh = Arc::new(RefreshPipeline::new(tokens.clone(), transport));
        let groups = CancelGroups::new();
        let interceptors = Interceptors::new(
            tokens.clone(),
            refresh,
            groups.clone(),
            Arc::new(LogNavigator),
            NavigationConfig::default(),
            BackoffConfig::default(),
        );
        (tokens, groups, interceptors)
    }

    fn http_error(status: u16) -> ClientError {
        ClientError::Http {
            status,
            method: "GET".into(),
            path: "/x".into(),
            message: String::new(),
        }
    }

    #[test]
    fn test_claim_registers_group_and_pre_aborted_signal() {
        let (_, groups, interceptors) = interceptors();

        let ctx = RequestContext::new(Method::GET, "/surveys/1", RequestOptions::new().cancel_group("survey"));
        let first = interceptors.claim(&ctx);
        let second = interceptors.claim(&ctx);
        assert_eq!(first.controller().reason(), Some(AbortReason::Superseded));
        assert!(groups.owner("survey").unwrap().same(second.controller()));

        let signal = CancellationToken::new();
        signal.cancel();
        let ctx = RequestContext::new(Method::GET, "/me", RequestOptions::new().signal(signal));
        let attempt = interceptors.claim(&ctx);
        assert_eq!(attempt.controller().reason(), Some(AbortReason::Caller));
    }

    #[test]
    fn test_renew_after_timeout_but_not_after_supersede() {
        let (_, _, interceptors) = interceptors();
        let ctx = RequestContext::new(Method::GET, "/surveys/1", RequestOptions::new().cancel_group("survey"));

        let mut attempt = interceptors.claim(&ctx);
        attempt.controller().abort(AbortReason::Timeout);
        assert!(attempt.renew().is_ok());
        assert!(!attempt.controller().is_aborted());

        let _newer = interceptors.claim(&ctx);
        assert_eq!(attempt.renew(), Err(AbortReason::Superseded));
    }

    #[tokio::test]
    async fn test_bearer_policies() {
        let (tokens, _, interceptors) = interceptors();
        tokens.set("t1".to_string());

        let ctx = RequestContext::new(Method::GET, "/me", RequestOptions::new());
        assert_eq!(interceptors.resolve_bearer(&ctx).await.as_deref(), Some("t1"));

        let ctx = RequestContext::new(Method::POST, "/auth/login", RequestOptions::new());
        assert_eq!(interceptors.resolve_bearer(&ctx).await, None);

        let ctx = RequestContext::new(Method::GET, "/surveys/1", RequestOptions::new().allow_anonymous());
        assert_eq!(interceptors.resolve_bearer(&ctx).await.as_deref(), Some("t1"));

        tokens.clear();
        assert_eq!(interceptors.resolve_bearer(&ctx).await, None);
    }

    #[tokio::test]
    async fn test_anonymous_unauthenticated_resolves_empty() {
        let (_, _, interceptors) = interceptors();
        let mut ctx = RequestContext::new(Method::GET, "/me", RequestOptions::new().allow_anonymous());
        match interceptors.on_failure(&mut ctx, http_error(401)).await {
            Verdict::Resolve(resp) => assert!(resp.is_synthetic()),
            other => panic!("expected resolve, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_unauthenticated_is_rejected() {
        let (_, _, interceptors) = interceptors();
        let mut ctx = RequestContext::new(Method::GET, "/me", RequestOptions::new());
        ctx.retried_for_auth = true;
        assert!(matches!(
            interceptors.on_failure(&mut ctx, http_error(419)).await,
            Verdict::Reject(e) if e.status() == 419
        ));

        let mut ctx = RequestContext::new(Method::POST, "/auth/login", RequestOptions::new());
        assert!(matches!(
            interceptors.on_failure(&mut ctx, http_error(401)).await,
            Verdict::Reject(_)
        ));
        assert!(!ctx.retried_for_auth);
    }

    #[tokio::test]
    async fn test_headerless_unauthenticated_still_refreshes() {
        let (_, _, interceptors) = interceptors();
        let mut ctx = RequestContext::new(Method::POST, "/auth/reset", RequestOptions::new().skip_auth_header());

        // The refresh runs and fails against the closed port.
        assert!(matches!(
            interceptors.on_failure(&mut ctx, http_error(401)).await,
            Verdict::Reject(ClientError::Network(_))
        ));
        assert!(ctx.retried_for_auth);
    }

    #[tokio::test]
    async fn test_transient_retry_budget() {
        let (_, _, interceptors) = interceptors();
        let mut ctx = RequestContext::new(Method::GET, "/surveys/1", RequestOptions::new().retry(2));

        for expected in 1..=2 {
            match interceptors.on_failure(&mut ctx, http_error(503)).await {
                Verdict::Retry { delay: Some(delay) } => assert!(delay <= Duration::from_millis(2100)),
                other => panic!("expected retry, got {:?}", other),
            }
            assert_eq!(ctx.retry_attempt, expected);
        }
        assert!(matches!(
            interceptors.on_failure(&mut ctx, http_error(503)).await,
            Verdict::Reject(_)
        ));

        let mut post = RequestContext::new(Method::POST, "/surveys", RequestOptions::new().retry(2));
        assert!(matches!(
            interceptors.on_failure(&mut post, http_error(503)).await,
            Verdict::Reject(_)
        ));
    }
}
