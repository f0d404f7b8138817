//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! public API call (api::*)
//!     → client.rs (execute loop over a RequestContext)
//!     → interceptor.rs (claim cancellation, resolve bearer)
//!     → transport.rs (reqwest, cookie jar, x-request-id)
//!     → interceptor.rs (on_failure: redirect / refresh+retry / backoff+retry)
//!     → response.rs (ApiResponse handed back, or a ClientError)
//! ```

pub mod client;
pub mod error;
pub mod interceptor;
pub mod navigation;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ClientError, ClientResult};
pub use navigation::{LogNavigator, Navigator};
pub use request::{RequestContext, RequestId, RequestOptions, X_REQUEST_ID};
pub use response::ApiResponse;
