pub mod api;
pub mod config;
pub mod data_sources;
pub mod diagnostics;
pub mod error;
pub mod partition;
pub mod provider_data;
pub mod resources;
pub mod sweep;
pub mod waiters;

pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use provider_data::AwsProviderData;

use tracing::info;

pub struct AwsProvider {
    provider_data: Option<AwsProviderData>,
}

impl Default for AwsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn configure(&mut self, config: ProviderConfig) -> Result<()> {
        let resolved = config.resolve()?;
        let client = api::Client::with_config(
            &resolved.endpoint,
            &resolved.api_token,
            resolved.insecure,
            resolved.retry,
        )?;

        info!(
            region = %resolved.region,
            partition = resolved.partition.id,
            endpoint = %resolved.endpoint,
            "Configured AWS provider"
        );
        self.provider_data = Some(AwsProviderData::new(
            client,
            resolved.region,
            resolved.partition,
        ));
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.provider_data.is_some()
    }

    pub fn provider_data(&self) -> Result<&AwsProviderData> {
        self.provider_data
            .as_ref()
            .ok_or(ProviderError::NotConfigured)
    }

    pub fn resource_types(&self) -> &'static [&'static str] {
        &[resources::resolver_endpoint::TYPE_NAME]
    }

    pub fn data_source_types(&self) -> &'static [&'static str] {
        &[
            data_sources::partition::TYPE_NAME,
            data_sources::dhcp_options::TYPE_NAME,
        ]
    }

    pub fn partition_data_source(&self) -> Result<data_sources::PartitionDataSource> {
        Ok(data_sources::PartitionDataSource::new(
            self.provider_data()?.clone(),
        ))
    }

    pub fn dhcp_options_data_source(&self) -> Result<data_sources::DhcpOptionsDataSource> {
        Ok(data_sources::DhcpOptionsDataSource::new(
            self.provider_data()?.clone(),
        ))
    }

    pub fn resolver_endpoint_resource(&self) -> Result<resources::ResolverEndpointResource> {
        Ok(resources::ResolverEndpointResource::new(
            self.provider_data()?.clone(),
        ))
    }
}
