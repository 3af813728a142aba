use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::common::{is_not_found_code, ApiErrorDetails, ApiErrorResponse, ApiResponse};
use super::error::ApiError;

/// Control-plane API client
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
    retry_config: RetryConfig,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(endpoint: &str, api_token: &str, insecure: bool) -> Result<Self, ApiError> {
        Self::with_config(endpoint, api_token, insecure, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        endpoint: &str,
        api_token: &str,
        insecure: bool,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidEndpoint(format!(
                "{}: scheme must be http or https",
                endpoint
            )));
        }

        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(retry_config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        let base_url = endpoint.trim_end_matches('/').to_string();
        let auth_header = format!("Bearer {}", api_token);

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                auth_header,
                retry_config,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Route 53 Resolver operations
    pub fn route53resolver(&self) -> crate::api::route53resolver::Route53ResolverApi<'_> {
        crate::api::route53resolver::Route53ResolverApi::new(self)
    }

    /// EC2 operations
    pub fn ec2(&self) -> crate::api::ec2::Ec2Api<'_> {
        crate::api::ec2::Ec2Api::new(self)
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("GET request to: {}", url);

                self.inner
                    .http_client
                    .get(&url)
                    .header(AUTHORIZATION, &self.inner.auth_header)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("POST request to: {}", url);

                self.inner
                    .http_client
                    .post(&url)
                    .header(AUTHORIZATION, &self.inner.auth_header)
                    .json(body)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("PUT request to: {}", url);

                self.inner
                    .http_client
                    .put(&url)
                    .header(AUTHORIZATION, &self.inner.auth_header)
                    .json(body)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        self.execute_with_retry(
            || async {
                let url = format!("{}{}", self.inner.base_url, path);

                tracing::debug!("DELETE request to: {}", url);

                self.inner
                    .http_client
                    .delete(&url)
                    .header(AUTHORIZATION, &self.inner.auth_header)
                    .send()
                    .await
            },
            path,
        )
        .await
    }

    /// Execute request with retry logic
    ///
    /// Rate limiting, server errors and connection failures are retried with
    /// exponential backoff. Everything else is returned on the first attempt.
    async fn execute_with_retry<F, Fut, T>(&self, request_fn: F, path: &str) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: for<'de> Deserialize<'de>,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(ApiError::AuthError);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return self.handle_error_response(response).await;
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response
    async fn parse_success_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        // empty bodies decode as unit / None
        let text = if text.trim().is_empty() {
            "null".to_string()
        } else {
            text
        };

        match serde_json::from_str::<ApiResponse<T>>(&text) {
            Ok(wrapper) => Ok(wrapper.data),
            Err(_) => match serde_json::from_str::<T>(&text) {
                Ok(data) => Ok(data),
                Err(e) => {
                    tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
                    Err(ApiError::ParseError(format!(
                        "Failed to parse response: {}",
                        e
                    )))
                }
            },
        }
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let parsed = serde_json::from_str::<ApiErrorResponse>(&text).ok();
        let code = parsed.as_ref().and_then(|r| r.code.clone());
        let message = parsed
            .as_ref()
            .and_then(|r| r.message.clone())
            .unwrap_or_else(|| text.clone());

        if status == reqwest::StatusCode::NOT_FOUND
            || code.as_deref().is_some_and(is_not_found_code)
        {
            return Err(ApiError::NotFound { code, message });
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::AccessDenied(message));
        }

        let details = parsed.map(|err_resp| {
            Box::new(ApiErrorDetails {
                code: err_resp.code,
                errors: err_resp.errors,
            })
        });

        Err(ApiError::ApiError {
            status: status.as_u16(),
            message: text,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Widget {
        id: String,
    }

    fn fast_retries(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn client_sends_bearer_token_and_unwraps_data() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/widgets/w-1")
            .match_header("authorization", "Bearer secret-token")
            .with_body(r#"{"data":{"id":"w-1"}}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "secret-token", true).unwrap();

        let widget: Widget = client.get("/widgets/w-1").await.unwrap();
        assert_eq!(widget.id, "w-1");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_accepts_unwrapped_bodies() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets/w-2")
            .with_body(r#"{"id":"w-2"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token", true).unwrap();

        let widget: Widget = client.get("/widgets/w-2").await.unwrap();
        assert_eq!(widget.id, "w-2");
    }

    #[tokio::test]
    async fn client_maps_404_to_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets/missing")
            .with_status(404)
            .with_body(r#"{"code":"ResourceNotFoundException","message":"no such widget"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token", true).unwrap();

        let err = client.get::<Widget>("/widgets/missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.code(), Some("ResourceNotFoundException"));
        assert!(err.to_string().contains("no such widget"));
    }

    #[tokio::test]
    async fn client_maps_not_found_code_on_400() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets/dopt-1")
            .with_status(400)
            .with_body(r#"{"code":"InvalidDhcpOptionID.NotFound","message":"gone"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token", true).unwrap();

        let err = client.get::<Widget>("/widgets/dopt-1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn client_handles_authentication_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/widgets")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "invalid-token", true).unwrap();

        let result = client.get::<Vec<Widget>>("/widgets").await;
        match result {
            Err(ApiError::AuthError) => {}
            other => panic!("Expected AuthError, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_maps_403_to_access_denied() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/widgets")
            .with_status(403)
            .with_body(r#"{"code":"AccessDeniedException","message":"not authorized"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token", true).unwrap();

        let result = client.get::<Vec<Widget>>("/widgets").await;
        assert!(matches!(result, Err(ApiError::AccessDenied(msg)) if msg == "not authorized"));
    }

    #[tokio::test]
    async fn client_keeps_error_details_for_bad_requests() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/widgets")
            .with_status(400)
            .with_body(r#"{"code":"InvalidParameterException","errors":["name too long"]}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token", true).unwrap();

        let err = client
            .post::<Widget, _>("/widgets", &serde_json::json!({"name": "x"}))
            .await
            .unwrap_err();
        match err {
            ApiError::ApiError {
                status, details, ..
            } => {
                assert_eq!(status, 400);
                let details = details.unwrap();
                assert_eq!(details.code.as_deref(), Some("InvalidParameterException"));
                assert_eq!(details.errors.unwrap(), vec!["name too long".to_string()]);
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn client_retries_server_errors_until_exhausted() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/widgets")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = Client::with_config(&server.url(), "token", true, fast_retries(2)).unwrap();

        let result = client.get::<Vec<Widget>>("/widgets").await;
        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_decodes_empty_body_as_unit() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/widgets/w-1")
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token", true).unwrap();

        client.delete::<()>("/widgets/w-1").await.unwrap();
    }

    #[tokio::test]
    async fn client_strips_trailing_slash_from_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/widgets/w-1")
            .with_body(r#"{"id":"w-1"}"#)
            .create_async()
            .await;

        let client = Client::new(&format!("{}/", server.url()), "token", true).unwrap();
        assert!(!client.base_url().ends_with('/'));

        let _ = client.get::<Widget>("/widgets/w-1").await;
        mock.assert_async().await;
    }

    #[test]
    fn client_rejects_invalid_endpoints() {
        assert!(matches!(
            Client::new("not a url", "token", false),
            Err(ApiError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            Client::new("ftp://example.com", "token", false),
            Err(ApiError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn client_handles_network_errors() {
        let client =
            Client::with_config("http://127.0.0.1:1", "token", true, fast_retries(1)).unwrap();

        let result = client.get::<Widget>("/widgets/w-1").await;
        assert!(matches!(
            result,
            Err(ApiError::ServiceUnavailable) | Err(ApiError::RequestError(_))
        ));
    }
}
