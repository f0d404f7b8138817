//! Retry classification.
//!
//! # Responsibilities
//! - Decide whether a failure is transient (network blip, gateway trouble, timeout)
//! - Keep cancellation out of the retry path
//! - Gate retries on method and the caller's declared budget
//!
//! # Design Decisions
//! - Never retry POST/PUT/DELETE/PATCH (duplicate side effects)
//! - Status 0 stands for "no response at all"
//! - The budget is per request, declared by the caller (`retry`)

use reqwest::Method;

use crate::http::ClientError;

/// Status codes considered transient. 0 = no response received.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 0 | 502 | 503 | 504)
}

/// Classify an error as transient. Cancellations never are.
pub fn is_transient(error: &ClientError) -> bool {
    match error {
        ClientError::Cancelled { .. } => false,
        ClientError::Timeout { .. } => true,
        // No response at all, status 0.
        ClientError::Network(_) => true,
        ClientError::Http { status, message, .. } => {
            is_transient_status(*status) || message.to_ascii_lowercase().contains("timeout")
        }
        _ => false,
    }
}

/// Whether a failed attempt qualifies for another transient retry.
///
/// `attempts_used` counts retries already performed for this request.
pub fn should_retry(method: &Method, attempts_used: u32, budget: u32, error: &ClientError) -> bool {
    *method == Method::GET
        && attempts_used < budget
        && !error.is_cancellation()
        && is_transient(error)
}
