//! Navigation hook for UX redirects the pipeline requests.

use tracing::info;

/// Client-side navigation supplied by the host (router, shell, CLI).
///
/// Redirects are best effort: the pipeline never waits on them and still
/// propagates the error that caused them.
pub trait Navigator: Send + Sync {
    fn redirect(&self, location: &str);
}

/// Default navigator: there is no router, so just record the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, location: &str) {
        info!(location = %location, "Redirect requested");
    }
}

/// True if `path` is `prefix` itself or lies below it.
pub fn is_under(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}
