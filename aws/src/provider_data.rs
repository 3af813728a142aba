//! Provider data structure passed to resources and data sources

use crate::api::Client;
use crate::partition::Partition;
use std::sync::Arc;

#[derive(Clone)]
pub struct AwsProviderData {
    pub client: Arc<Client>,
    pub region: String,
    pub partition: &'static Partition,
}

impl AwsProviderData {
    pub fn new(client: Client, region: impl Into<String>, partition: &'static Partition) -> Self {
        Self {
            client: Arc::new(client),
            region: region.into(),
            partition,
        }
    }

    /// ARN for a resource in the configured region
    pub fn arn(&self, service: &str, account_id: &str, resource: &str) -> String {
        self.partition
            .arn(service, &self.region, account_id, resource)
    }
}
