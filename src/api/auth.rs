//! Authentication endpoints.
//!
//! Every call here runs with `skip_auth_header`: the cookie jar carries the
//! refresh credential. Only the reset and verify calls, which sit outside the
//! auth endpoint set, get a refreshed bearer on their one retry after a 401.

use serde::Serialize;
use tracing::{info, warn};

use crate::api::types::{Credentials, MeDto, TokenResponse};
use crate::http::{ApiClient, ClientError, ClientResult, RequestOptions};

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct TokenBody<'a> {
    token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmResetBody<'a> {
    token: &'a str,
    new_password: &'a str,
}

fn auth_options() -> RequestOptions {
    RequestOptions::new().skip_auth_header()
}

impl ApiClient {
    pub async fn register(&self, email: &str, password: &str) -> ClientResult<()> {
        self.post("/auth/register", Some(&Credentials { email, password }), auth_options())
            .await?;
        Ok(())
    }

    /// Log in and store the returned access token.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<TokenResponse> {
        let response: TokenResponse = self
            .post("/auth/login", Some(&Credentials { email, password }), auth_options())
            .await?
            .json()?;
        if response.access_token.trim().is_empty() {
            return Err(ClientError::Decode("login returned an empty accessToken".to_string()));
        }
        self.tokens().set(response.access_token.clone());
        info!(email = %email, "Logged in");
        Ok(response)
    }

    /// Log out. The local token is cleared whatever the backend answers.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.post::<()>("/auth/logout", None, auth_options()).await;
        self.tokens().clear();
        match result {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logout call failed; local session cleared anyway");
                Err(e)
            }
        }
    }

    /// Current user; recovers the session from the refresh cookie first.
    pub async fn me(&self) -> ClientResult<MeDto> {
        self.prewarm_session().await;
        self.fetch_me_once(false)
            .await?
            .ok_or_else(|| ClientError::Decode("empty /me response".to_string()))
    }

    /// Current user, or `None` for a guest. Never refreshes.
    pub async fn me_anonymous_ok(&self) -> ClientResult<Option<MeDto>> {
        self.fetch_me_once(true).await
    }

    /// Ask for a password-reset mail.
    pub async fn reset_password(&self, email: &str) -> ClientResult<()> {
        self.post("/auth/reset", Some(&EmailBody { email }), auth_options()).await?;
        Ok(())
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> ClientResult<()> {
        self.post(
            "/auth/reset/confirm",
            Some(&ConfirmResetBody { token, new_password }),
            auth_options(),
        )
        .await?;
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> ClientResult<()> {
        self.post("/auth/verify", Some(&TokenBody { token }), auth_options()).await?;
        Ok(())
    }
}
