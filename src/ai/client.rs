//! Provider HTTP Client
//!
//! This module provides a reusable HTTP client for making requests to vendor
//! APIs, with built-in retry logic, exponential backoff, and error handling.

use crate::error::{PaletteForgeError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Initial retry delay in milliseconds
const INITIAL_DELAY_MS: u64 = 1000;

/// HTTP client for provider API requests
#[derive(Clone, Debug)]
pub struct HttpClient {
    /// Reqwest HTTP client
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Initial retry delay in milliseconds
    initial_delay_ms: u64,
}

impl HttpClient {
    /// Create a new HTTP client with the given timeout and retry budget
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                PaletteForgeError::Config(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            max_retries,
            initial_delay_ms: INITIAL_DELAY_MS,
        })
    }

    /// Create a client from a credential bundle's timeout and retry settings
    pub fn for_credentials(credentials: &crate::ai::provider::Credentials) -> Result<Self> {
        Self::new(credentials.timeout_secs(), credentials.retry_limit())
    }

    /// Set the initial retry delay
    pub fn with_retry_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    /// Make a POST request with retry logic
    ///
    /// Retryable statuses (429, 408, 5xx) are retried up to the configured
    /// budget with exponential backoff. Connection-level failures surface as
    /// transport errors without retry; non-retryable statuses surface as API
    /// errors carrying the vendor's body.
    ///
    /// # Returns
    /// Response body as string
    pub async fn post_json<T: Serialize>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &T,
    ) -> Result<String> {
        self.post_json_internal(provider, url, headers, body, 0).await
    }

    /// Internal POST implementation with retry logic
    async fn post_json_internal<T: Serialize>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &T,
        attempt: u32,
    ) -> Result<String> {
        debug!(provider, url, attempt, "dispatching provider request");

        let response = self
            .client
            .post(url)
            .headers(headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| PaletteForgeError::Transport {
                provider: provider.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();

        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| PaletteForgeError::Transport {
                    provider: provider.to_string(),
                    message: e.to_string(),
                });
        }

        if self.should_retry(status, attempt) {
            let delay = self.calculate_delay(attempt);
            warn!(
                provider,
                status = status.as_u16(),
                attempt,
                delay_ms = delay,
                "retrying provider request"
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;

            return Box::pin(self.post_json_internal(provider, url, headers, body, attempt + 1))
                .await;
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read response body".to_string());

        Err(PaletteForgeError::Api {
            provider: provider.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    /// Check if a request should be retried
    fn should_retry(&self, status: StatusCode, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }

        // Rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            return true;
        }

        // Server errors
        if status.is_server_error() {
            return true;
        }

        status == StatusCode::REQUEST_TIMEOUT
    }

    /// Calculate retry delay with exponential backoff
    fn calculate_delay(&self, attempt: u32) -> u64 {
        self.initial_delay_ms * 2_u64.pow(attempt)
    }

    /// Build standard JSON headers with bearer authentication
    pub fn bearer_headers(api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, Self::header_value(&format!("Bearer {api_key}"))?);
        Ok(headers)
    }

    /// Build standard JSON headers with a custom authentication header
    pub fn custom_auth_headers(auth_header: &str, auth_value: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(Self::header_name(auth_header)?, Self::header_value(auth_value)?);
        Ok(headers)
    }

    /// Parse a header name, surfacing invalid names as configuration errors
    pub fn header_name(name: &str) -> Result<HeaderName> {
        HeaderName::from_str(name)
            .map_err(|_| PaletteForgeError::Config(format!("invalid header name: {name}")))
    }

    /// Parse a header value, surfacing invalid values as configuration errors
    pub fn header_value(value: &str) -> Result<HeaderValue> {
        HeaderValue::from_str(value)
            .map_err(|_| PaletteForgeError::Config(format!("invalid header value for: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(30, 3).unwrap();
        assert_eq!(client.max_retries, 3);
        assert_eq!(client.initial_delay_ms, INITIAL_DELAY_MS);
    }

    #[test]
    fn test_retry_logic() {
        let client = HttpClient::new(30, 3).unwrap();

        // Should retry on server errors
        assert!(client.should_retry(StatusCode::INTERNAL_SERVER_ERROR, 0));
        assert!(client.should_retry(StatusCode::SERVICE_UNAVAILABLE, 0));

        // Should retry on rate limiting and timeouts
        assert!(client.should_retry(StatusCode::TOO_MANY_REQUESTS, 0));
        assert!(client.should_retry(StatusCode::REQUEST_TIMEOUT, 0));

        // Should not retry on client errors
        assert!(!client.should_retry(StatusCode::BAD_REQUEST, 0));
        assert!(!client.should_retry(StatusCode::UNAUTHORIZED, 0));

        // Should not retry after max attempts
        assert!(!client.should_retry(StatusCode::INTERNAL_SERVER_ERROR, 3));
    }

    #[test]
    fn test_exponential_backoff() {
        let client = HttpClient::new(30, 3).unwrap();

        assert_eq!(client.calculate_delay(0), 1000);
        assert_eq!(client.calculate_delay(1), 2000);
        assert_eq!(client.calculate_delay(2), 4000);
    }

    #[test]
    fn test_bearer_headers() {
        let headers = HttpClient::bearer_headers("test-key").unwrap();
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer test-key");
    }

    #[test]
    fn test_custom_auth_headers() {
        let headers = HttpClient::custom_auth_headers("x-api-key", "test-key").unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "test-key");
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        assert!(HttpClient::header_value("bad\nvalue").is_err());
        assert!(HttpClient::header_name("bad name").is_err());
    }
}
