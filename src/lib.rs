//! Client runtime for the team analyzer API.
//!
//! # Architecture Overview
//!
//! ```text
//!     feature code
//!         │  api::{auth, surveys, teams}   (declarative per-call policy)
//!         ▼
//!     ┌──────────────────────────────────────────────────────────┐
//!     │ http::ApiClient::execute                                  │
//!     │   request side:  cancel group → deadline → caller scope   │
//!     │                  → bearer (session::RefreshPipeline)      │
//!     │   transport:     reqwest + cookie jar + x-request-id      │
//!     │   response side: 403 admin redirect                       │
//!     │                  401/419 → single-flight refresh, 1 retry │
//!     │                  transient GET → backoff, bounded retry   │
//!     └──────────────────────────────────────────────────────────┘
//!         │
//!         ▼
//!     backend (/auth, /me, /surveys, /admin/teams, /my/tokens)
//!
//!     cross-cutting: config · cancel · resilience · session · observability
//! ```

// Core subsystems
pub mod api;
pub mod http;
pub mod session;

// Cross-cutting concerns
pub mod cancel;
pub mod config;
pub mod observability;
pub mod resilience;

pub use cancel::{AbortReason, CancelGroups, RunId, RunTracker};
pub use config::ClientConfig;
pub use http::{ApiClient, ApiClientBuilder, ApiResponse, ClientError, ClientResult, RequestOptions};
pub use session::{FnTokenStore, InMemoryTokenStore, TokenStore};
