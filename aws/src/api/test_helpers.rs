//! Test helpers for the control-plane API

pub fn create_test_client(url: &str) -> super::Client {
    let retry = super::RetryConfig {
        max_retries: 0,
        ..Default::default()
    };
    super::Client::with_config(url, "test-token", true, retry).unwrap()
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use common::ApiErrorDetails;

    #[test]
    fn test_retry_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 10000);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_api_query_params() {
        let params = ApiQueryParams::new()
            .add("Filter.1.Name", "key")
            .add("Filter.1.Value.1", "domain-name")
            .add("count", 123)
            .add_optional("opt", Some("a b"))
            .add_optional("none", None::<String>);

        let query = params.to_query_string();
        assert!(query.starts_with('?'));
        assert!(query.contains("Filter.1.Name=key"));
        assert!(query.contains("Filter.1.Value.1=domain-name"));
        assert!(query.contains("count=123"));
        assert!(query.contains("opt=a%20b"));
        assert!(!query.contains("none="));
    }

    #[test]
    fn test_empty_query_params() {
        assert_eq!(ApiQueryParams::new().to_query_string(), "");
    }

    #[test]
    fn test_page_request() {
        let query = PageRequest::new()
            .with_max_results(50)
            .with_next_token("tok/1")
            .to_query_params()
            .to_query_string();

        assert!(query.contains("max_results=50"));
        assert!(query.contains("next_token=tok%2F1"));
    }

    #[test]
    fn test_not_found_codes() {
        assert!(common::is_not_found_code("ResourceNotFoundException"));
        assert!(common::is_not_found_code("InvalidDhcpOptionID.NotFound"));
        assert!(!common::is_not_found_code("InvalidParameterException"));
    }

    #[test]
    fn test_api_error_formatting() {
        let details = ApiErrorDetails {
            code: Some("InvalidRequestException".to_string()),
            errors: Some(vec!["general error".to_string()]),
        };

        let error = ApiError::ApiError {
            status: 400,
            message: "Bad Request".to_string(),
            details: Some(Box::new(details)),
        };

        let error_str = error.to_string();
        assert!(error_str.contains("HTTP 400"));
        assert!(error_str.contains("Bad Request"));
        assert_eq!(error.code(), Some("InvalidRequestException"));
        assert!(!error.is_not_found());
    }
}
