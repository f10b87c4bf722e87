//! Pooled HTTP client with per-request timing and tagging

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::metrics::{Category, Metrics};

/// Outcome of one HTTP call
///
/// Transport failures (refused connection, timeout) are not errors here:
/// they come back with `status = None` and are scored like any other
/// unsuccessful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: Option<StatusCode>,
    pub body: Bytes,
    pub elapsed: Duration,
}

impl ApiResponse {
    pub fn is_status(&self, code: StatusCode) -> bool {
        self.status == Some(code)
    }

    /// Numeric status, `0` when no response was received
    pub fn status_code(&self) -> u16 {
        self.status.map(|s| s.as_u16()).unwrap_or(0)
    }

    /// Whether the request counts toward `http_req_failed`
    pub fn failed(&self) -> bool {
        match self.status {
            Some(status) => status.is_client_error() || status.is_server_error(),
            None => true,
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Whether the body is a JSON object that defines `field` (any value, even null)
    pub fn has_field(&self, field: &str) -> bool {
        self.json::<Value>()
            .ok()
            .and_then(|v| v.as_object().map(|o| o.contains_key(field)))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP client shared by setup and every virtual user
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    metrics: Arc<Metrics>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .pool_max_idle_per_host(200)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            metrics,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub async fn get(&self, path: &str, token: Option<&str>, tag: Option<Category>) -> ApiResponse {
        let request = self.request(Method::GET, path, token);
        self.execute(Method::GET, path, request, tag).await
    }

    /// POST with an optional JSON body; `None` sends an empty body
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&T>,
        token: Option<&str>,
        tag: Option<Category>,
    ) -> ApiResponse {
        let mut request = self.request(Method::POST, path, token);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(Method::POST, path, request, tag).await
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
        tag: Option<Category>,
    ) -> ApiResponse {
        let start = Instant::now();
        let (status, body) = match request.send().await {
            Ok(resp) => {
                let status = resp.status();
                match resp.bytes().await {
                    Ok(body) => (Some(status), body),
                    Err(e) => {
                        debug!("Failed to read body of {} {}: {}", method, path, e);
                        (Some(status), Bytes::new())
                    }
                }
            }
            Err(e) => {
                debug!("{} {} failed: {}", method, path, e);
                (None, Bytes::new())
            }
        };
        let response = ApiResponse {
            status,
            body,
            elapsed: start.elapsed(),
        };

        debug!(
            "{} {} -> {} in {:?}",
            method,
            path,
            response.status_code(),
            response.elapsed
        );
        self.metrics
            .record_request(tag, response.elapsed, response.failed());

        response
    }
}
