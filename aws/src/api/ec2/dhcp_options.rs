//! DHCP options set API implementation

use serde::{Deserialize, Serialize};

use crate::api::common::{ApiQueryParams, Tag};
use crate::api::{ApiError, Client};

const DHCP_OPTIONS_PATH: &str = "/ec2/dhcp-options";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpConfiguration {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpOptions {
    pub dhcp_options_id: String,
    pub owner_id: String,
    #[serde(default)]
    pub dhcp_configurations: Vec<DhcpConfiguration>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl DhcpOptions {
    /// Values configured for `key`, empty when the key is not set
    pub fn values(&self, key: &str) -> &[String] {
        self.dhcp_configurations
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.values.as_slice())
            .unwrap_or(&[])
    }
}

/// Server-side filter, e.g. `key = [domain-name]` or `tag:Name = [web]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeDhcpOptionsRequest {
    pub dhcp_options_ids: Vec<String>,
    pub filters: Vec<Filter>,
}

impl DescribeDhcpOptionsRequest {
    pub fn to_query_params(&self) -> ApiQueryParams {
        let mut params = ApiQueryParams::new();

        for (i, id) in self.dhcp_options_ids.iter().enumerate() {
            params = params.add(format!("DhcpOptionsId.{}", i + 1), id);
        }

        for (i, filter) in self.filters.iter().enumerate() {
            params = params.add(format!("Filter.{}.Name", i + 1), &filter.name);
            for (j, value) in filter.values.iter().enumerate() {
                params = params.add(format!("Filter.{}.Value.{}", i + 1, j + 1), value);
            }
        }

        params
    }
}

#[derive(Debug, Deserialize)]
struct DescribeDhcpOptionsResponse {
    #[serde(default)]
    dhcp_options: Vec<DhcpOptions>,
}

/// DHCP options API
pub struct DhcpOptionsApi<'a> {
    client: &'a Client,
}

impl<'a> DhcpOptionsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /ec2/dhcp-options
    pub async fn describe(
        &self,
        request: &DescribeDhcpOptionsRequest,
    ) -> Result<Vec<DhcpOptions>, ApiError> {
        let path = format!(
            "{}{}",
            DHCP_OPTIONS_PATH,
            request.to_query_params().to_query_string()
        );
        let response: DescribeDhcpOptionsResponse = self.client.get(&path).await?;
        Ok(response.dhcp_options)
    }
}
