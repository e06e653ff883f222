//! reqwest-backed HTTP client.
//!
//! One [`ReqwestClient`] wraps one reqwest client (and thus one
//! connection pool); [`ReqwestClient::shared`] hands out a process-wide
//! instance so many accounts do not multiply pools. Credentials ride
//! in per-request headers only, so sharing the pool never shares
//! authorization state between accounts (the client keeps no cookie
//! store).

use crate::transport::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};

/// [`HttpClient`] implementation backed by reqwest with rustls.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with its own connection pool.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            // Long-poll requests manage their own deadline per request.
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// The process-wide shared instance.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<ReqwestClient>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(ReqwestClient::new())))
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let method = match request.method {
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| e.to_string())?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
