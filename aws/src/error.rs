use thiserror::Error;

use crate::api::ApiError;
use crate::diagnostics::Diagnostics;
use tfwait::WaitError;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured")]
    NotConfigured,

    #[error("Invalid provider configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid configuration: {0}")]
    Validation(Diagnostics),

    #[error("No matching {0} found")]
    NoMatch(String),

    #[error("Multiple matching {0} found")]
    MultipleMatches(String),

    #[error("Changing `{attribute}` requires replacing the resource")]
    RequiresReplacement { attribute: String },

    #[error("Unknown {kind}: {name}")]
    Unknown { kind: &'static str, name: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Wait(#[from] WaitError),
}

impl ProviderError {
    /// Whether the remote object addressed by the failing call is gone
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::Api(e) => e.is_not_found(),
            ProviderError::Wait(e) => e.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn no_match_messages() {
        assert_eq!(
            ProviderError::NoMatch("EC2 DHCP Options".to_string()).to_string(),
            "No matching EC2 DHCP Options found"
        );
        assert_eq!(
            ProviderError::MultipleMatches("EC2 DHCP Options".to_string()).to_string(),
            "Multiple matching EC2 DHCP Options found"
        );
    }

    #[test]
    fn wait_errors_keep_their_message() {
        let err: ProviderError = WaitError::Timeout {
            id: "rslvr-in-1".to_string(),
            last_status: "CREATING".to_string(),
            elapsed: Duration::from_secs(600),
        }
        .into();

        assert!(err.to_string().contains("rslvr-in-1"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn api_not_found_is_detected() {
        let err: ProviderError = ApiError::NotFound {
            code: None,
            message: "gone".to_string(),
        }
        .into();

        assert!(err.is_not_found());
    }
}
