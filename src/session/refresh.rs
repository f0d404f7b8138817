//! Single-flight access-token refresh.
//!
//! Two states: idle (no shared flight) and refreshing (one shared flight).
//! Every caller arriving while refreshing awaits the same outcome, and the
//! outcome is applied to the token store inside the flight, before any
//! waiter observes it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::http::error::ClientResult;
use crate::http::transport::Transport;
use crate::observability::metrics;
use crate::session::single_flight::SingleFlight;
use crate::session::store::TokenSlot;

pub struct RefreshPipeline {
    tokens: Arc<TokenSlot>,
    transport: Transport,
    flight: SingleFlight<ClientResult<String>>,
}

impl RefreshPipeline {
    pub fn new(tokens: Arc<TokenSlot>, transport: Transport) -> Self {
        Self {
            tokens,
            transport,
            flight: SingleFlight::new(),
        }
    }

    /// Refresh now, or join the refresh already in flight.
    ///
    /// On success the new token is stored; on failure the store is cleared.
    pub async fn refresh(&self) -> ClientResult<String> {
        let tokens = self.tokens.clone();
        let transport = self.transport.clone();

        self.flight
            .run(move || async move {
                debug!("Refreshing access token");
                match transport.refresh_access_token().await {
                    Ok(token) => {
                        tokens.set(token.clone());
                        metrics::record_refresh(true);
                        info!("Access token refreshed");
                        Ok(token)
                    }
                    Err(e) => {
                        tokens.clear();
                        metrics::record_refresh(false);
                        warn!(error = %e, "Access token refresh failed");
                        Err(e)
                    }
                }
            })
            .await
    }

    pub fn is_refreshing(&self) -> bool {
        self.flight.in_flight()
    }

    /// The in-memory token, refreshing first if there is none.
    pub async fn ensure_token(&self) -> ClientResult<String> {
        let current = self.tokens.get();
        if !current.is_empty() {
            return Ok(current);
        }
        self.refresh().await
    }

    /// Like [`ensure_token`](Self::ensure_token) but a failed refresh just means "no token".
    pub async fn usable_token(&self) -> Option<String> {
        match self.ensure_token().await {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(error = %e, "Proceeding without a bearer token");
                None
            }
        }
    }

    /// Recover a session from the refresh cookie without waiting for a 401.
    ///
    /// Free when a token already exists.
    pub async fn prewarm(&self) -> bool {
        if self.tokens.has_token() {
            return true;
        }
        self.refresh().await.is_ok()
    }
}

impl std::fmt::Debug for RefreshPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshPipeline")
            .field("base_url", &self.transport.base_url())
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}
