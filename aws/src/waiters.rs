//! Status queries and wait requests for Route 53 Resolver objects

use async_trait::async_trait;
use std::time::Duration;
use tfwait::{BoxError, StatusQuery, WaitRequest};
use tracing::debug;

use crate::api::route53resolver::{endpoints, rules};
use crate::api::Client;

/// Default timeout for endpoint create, update and delete waits
pub const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default timeout for resolver rule deletion waits
pub const RULE_DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Reports the status of a resolver endpoint; a missing endpoint is `Ok(None)`
#[derive(Clone)]
pub struct EndpointStatusQuery {
    client: Client,
}

impl EndpointStatusQuery {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusQuery for EndpointStatusQuery {
    async fn query_status(&self, id: &str) -> Result<Option<String>, BoxError> {
        match self.client.route53resolver().endpoints().get(id).await {
            Ok(endpoint) => {
                debug!(endpoint_id = %id, status = %endpoint.status, "Resolver endpoint status");
                Ok(Some(endpoint.status))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }
}

/// Reports the status of a resolver rule; a missing rule is `Ok(None)`
#[derive(Clone)]
pub struct RuleStatusQuery {
    client: Client,
}

impl RuleStatusQuery {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusQuery for RuleStatusQuery {
    async fn query_status(&self, id: &str) -> Result<Option<String>, BoxError> {
        match self.client.route53resolver().rules().get(id).await {
            Ok(rule) => {
                debug!(rule_id = %id, status = %rule.status, "Resolver rule status");
                Ok(Some(rule.status))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }
}

/// Wait for a new endpoint to become operational
pub fn endpoint_created(id: &str, timeout: Duration, interval: Duration) -> WaitRequest {
    WaitRequest::new(id, timeout)
        .pending([endpoints::status::CREATING])
        .target([endpoints::status::OPERATIONAL])
        .poll_interval(interval)
}

/// Wait for an endpoint to settle after an IP address change
pub fn endpoint_updated(id: &str, timeout: Duration, interval: Duration) -> WaitRequest {
    WaitRequest::new(id, timeout)
        .pending([endpoints::status::CREATING, endpoints::status::UPDATING])
        .target([endpoints::status::OPERATIONAL])
        .poll_interval(interval)
}

/// Wait for an endpoint to disappear
pub fn endpoint_deleted(id: &str, timeout: Duration, interval: Duration) -> WaitRequest {
    WaitRequest::new(id, timeout)
        .pending([endpoints::status::DELETING])
        .target([endpoints::status::DELETED])
        .poll_interval(interval)
        .not_found_is_success(true)
}

/// Wait for a resolver rule to disappear
pub fn rule_deleted(id: &str, timeout: Duration, interval: Duration) -> WaitRequest {
    WaitRequest::new(id, timeout)
        .pending([rules::status::DELETING])
        .target([rules::status::DELETED])
        .poll_interval(interval)
        .not_found_is_success(true)
}
