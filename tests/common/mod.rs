//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Response, Uri};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use teamanalyzer_client::config::{ApiConfig, BackoffConfig, ClientConfig};
use teamanalyzer_client::http::Navigator;
use teamanalyzer_client::ApiClient;

/// One request as the backend saw it. `path` excludes the `/api` prefix.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub cookie: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn bearer(&self) -> Option<&str> {
        self.authorization.as_deref()?.strip_prefix("Bearer ")
    }

    pub fn is(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

/// What the programmable backend answers.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub set_cookie: Option<String>,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: u16, value: Value) -> Self {
        Self {
            status,
            body: value.to_string(),
            set_cookie: None,
            delay: None,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            set_cookie: None,
            delay: None,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            set_cookie: None,
            delay: None,
        }
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.set_cookie = Some(cookie.to_string());
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A running mock backend and its request log.
pub struct MockBackend {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|r| r.is(method, path)).count()
    }

    pub fn last(&self, method: &str, path: &str) -> Option<Recorded> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.is(method, path))
            .cloned()
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` sees every request (already recorded) and decides the reply.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn(Recorded) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let app = {
        let log = log.clone();
        Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: String| {
            let f = f.clone();
            let log = log.clone();
            async move {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                let path = uri.path();
                let recorded = Recorded {
                    method: method.to_string(),
                    path: path.strip_prefix("/api").unwrap_or(path).to_string(),
                    query: uri.query().map(str::to_string),
                    authorization: header("authorization"),
                    request_id: header("x-request-id"),
                    cookie: header("cookie"),
                    body,
                };
                log.lock().unwrap().push(recorded.clone());

                let reply = f(recorded).await;
                if let Some(delay) = reply.delay {
                    tokio::time::sleep(delay).await;
                }

                let mut response = Response::builder()
                    .status(reply.status)
                    .header("content-type", "application/json");
                if let Some(cookie) = reply.set_cookie {
                    response = response.header("set-cookie", cookie);
                }
                response.body(Body::from(reply.body)).unwrap()
            }
        })
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, log }
}

/// Config against `backend` with short backoff so retry tests stay fast.
pub fn test_config(backend: &MockBackend) -> ClientConfig {
    ClientConfig {
        api: ApiConfig {
            base_url: backend.base_url(),
            ..ApiConfig::default()
        },
        backoff: BackoffConfig {
            base_delay_ms: 20,
            max_delay_ms: 200,
            jitter_ms: 10,
        },
        ..ClientConfig::default()
    }
}

pub fn client_for(backend: &MockBackend) -> ApiClient {
    ApiClient::builder(test_config(backend)).build().unwrap()
}

/// Navigator that remembers every redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub locations: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, location: &str) {
        self.locations.lock().unwrap().push(location.to_string());
    }
}
