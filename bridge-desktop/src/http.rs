//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("drive-uploader/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - Retry with exponential backoff on 5xx/429 and transport errors
/// - rustls TLS
///
/// When retries run out on a retryable status, the last response is
/// returned so the caller can report the server's error body.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a client with the default 30 second request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a client with a custom default timeout
    ///
    /// Individual requests may override it via [`HttpRequest::timeout`];
    /// the upload connector does so for large chunks.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            // Bytes clones are reference-counted
            req = req.body(body.clone());
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn is_retryable_status(status: u16) -> bool {
        status >= 500 || status == 429
    }

    fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
        if policy.use_exponential_backoff {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            policy.base_delay.saturating_mul(factor).min(policy.max_delay)
        } else {
            policy.base_delay
        }
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("failed to read body: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn execute_with_retry_internal(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                attempt,
                max_attempts,
                url = %request.url,
                "Executing HTTP request"
            );

            let outcome = self.build_request(&request).send().await;
            let last_attempt = attempt >= max_attempts;

            match outcome {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !Self::is_retryable_status(status) || last_attempt {
                        if Self::is_retryable_status(status) {
                            warn!(status, attempts = attempt, "Retries exhausted");
                        }
                        return Self::into_response(response).await;
                    }
                    warn!(status, attempt, "HTTP request failed with retryable status");
                }
                Err(e) => {
                    warn!(error = %e, attempt, "HTTP request failed");
                    if last_attempt {
                        let message = if e.is_timeout() {
                            "request timed out".to_string()
                        } else if e.is_connect() {
                            format!("connection failed: {}", e)
                        } else {
                            e.to_string()
                        };
                        return Err(BridgeError::OperationFailed(message));
                    }
                }
            }

            let delay = Self::backoff_delay(&policy, attempt);
            debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
            sleep(delay).await;
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, RetryPolicy::default())
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.execute_with_retry_internal(request, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        assert!(ReqwestHttpClient::new().is_ok());
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Put),
            reqwest::Method::PUT
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Patch),
            reqwest::Method::PATCH
        );
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(ReqwestHttpClient::is_retryable_status(500));
        assert!(ReqwestHttpClient::is_retryable_status(503));
        assert!(ReqwestHttpClient::is_retryable_status(429));
        assert!(!ReqwestHttpClient::is_retryable_status(404));
        assert!(!ReqwestHttpClient::is_retryable_status(308));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            use_exponential_backoff: true,
        };
        assert_eq!(
            ReqwestHttpClient::backoff_delay(&policy, 1),
            Duration::from_millis(100)
        );
        assert_eq!(
            ReqwestHttpClient::backoff_delay(&policy, 3),
            Duration::from_millis(400)
        );
        assert_eq!(
            ReqwestHttpClient::backoff_delay(&policy, 8),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_build_request_copies_headers() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = HttpRequest::new(HttpMethod::Put, "https://example.com/upload")
            .header("Content-Range", "bytes */100");
        let built = client.build_request(&request).build().unwrap();

        assert_eq!(built.method(), reqwest::Method::PUT);
        assert_eq!(
            built.headers().get("content-range").unwrap().to_str().unwrap(),
            "bytes */100"
        );
    }
}
