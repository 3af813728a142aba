//! Resolver rule API implementation

use serde::Deserialize;

use crate::api::common::PageRequest;
use crate::api::{ApiError, Client};

const RULES_PATH: &str = "/route53resolver/rules";

fn rule_path(id: &str) -> String {
    format!("{}/{}", RULES_PATH, urlencoding::encode(id))
}

pub mod status {
    pub const COMPLETE: &str = "COMPLETE";
    pub const DELETING: &str = "DELETING";
    pub const UPDATING: &str = "UPDATING";
    pub const FAILED: &str = "FAILED";
    /// Never reported by the service; stands for a rule that is gone
    pub const DELETED: &str = "DELETED";
}

/// Rule type of the resolver-managed rules that cannot be deleted
pub const RULE_TYPE_RECURSIVE: &str = "RECURSIVE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolverRule {
    pub id: String,
    pub arn: String,
    #[serde(default)]
    pub name: Option<String>,
    pub domain_name: String,
    pub rule_type: String,
    pub status: String,
    #[serde(default)]
    pub resolver_endpoint_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResolverRulesResponse {
    #[serde(default)]
    pub resolver_rules: Vec<ResolverRule>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Rules API for resolver rule operations
pub struct RulesApi<'a> {
    client: &'a Client,
}

impl<'a> RulesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /route53resolver/rules
    pub async fn list(&self, page: &PageRequest) -> Result<ListResolverRulesResponse, ApiError> {
        let path = format!("{}{}", RULES_PATH, page.to_query_params().to_query_string());
        self.client.get(&path).await
    }

    /// GET /route53resolver/rules/{id}
    pub async fn get(&self, id: &str) -> Result<ResolverRule, ApiError> {
        self.client.get(&rule_path(id)).await
    }

    /// DELETE /route53resolver/rules/{id}
    pub async fn delete(&self, id: &str) -> Result<Option<ResolverRule>, ApiError> {
        self.client.delete(&rule_path(id)).await
    }
}
