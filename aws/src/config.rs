//! Provider configuration with environment fallbacks

use crate::api::RetryConfig;
use crate::error::{ProviderError, Result};
use crate::partition::Partition;

pub const ENV_ENDPOINT: &str = "AWS_ENDPOINT_URL";
pub const ENV_API_TOKEN: &str = "AWS_API_TOKEN";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const ENV_INSECURE: &str = "AWS_INSECURE";
pub const ENV_MAX_RETRIES: &str = "AWS_MAX_RETRIES";

/// Values as written in the provider block; unset fields fall back to the environment
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    pub region: Option<String>,
    pub insecure: Option<bool>,
    pub max_retries: Option<u32>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub api_token: String,
    pub region: String,
    pub partition: &'static Partition,
    pub insecure: bool,
    pub retry: RetryConfig,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str, env: &str) -> Result<String> {
    value.ok_or_else(|| {
        ProviderError::InvalidConfiguration(format!(
            "{} is required (set in provider config or {} env var)",
            field, env
        ))
    })
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = Some(insecure);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn resolve(self) -> Result<ResolvedConfig> {
        let endpoint = required(
            self.endpoint.or_else(|| env_var(ENV_ENDPOINT)),
            "endpoint",
            ENV_ENDPOINT,
        )?;
        let api_token = required(
            self.api_token.or_else(|| env_var(ENV_API_TOKEN)),
            "api_token",
            ENV_API_TOKEN,
        )?;
        let region = required(
            self.region
                .or_else(|| env_var(ENV_REGION))
                .or_else(|| env_var(ENV_DEFAULT_REGION)),
            "region",
            ENV_REGION,
        )?;

        let partition = Partition::for_region(&region).ok_or_else(|| {
            ProviderError::InvalidConfiguration(format!(
                "region {} does not belong to a known partition",
                region
            ))
        })?;

        let insecure = self
            .insecure
            .or_else(|| env_var(ENV_INSECURE).and_then(|v| v.parse::<bool>().ok()))
            .unwrap_or(false);

        let max_retries = match self.max_retries {
            Some(n) => n,
            None => match env_var(ENV_MAX_RETRIES) {
                Some(v) => v.parse::<u32>().map_err(|_| {
                    ProviderError::InvalidConfiguration(format!(
                        "{} must be a non-negative integer, got {}",
                        ENV_MAX_RETRIES, v
                    ))
                })?,
                None => RetryConfig::default().max_retries,
            },
        };

        Ok(ResolvedConfig {
            endpoint,
            api_token,
            region,
            partition,
            insecure,
            retry: RetryConfig {
                max_retries,
                ..Default::default()
            },
        })
    }
}
