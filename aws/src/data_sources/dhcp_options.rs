//! aws_vpc_dhcp_options data source

use std::collections::BTreeMap;
use tracing::debug;

use crate::api::common::tags_to_map;
use crate::api::ec2::{DescribeDhcpOptionsRequest, DhcpOptions, Filter};
use crate::diagnostics::Diagnostics;
use crate::error::{ProviderError, Result};
use crate::provider_data::AwsProviderData;

pub const TYPE_NAME: &str = "aws_vpc_dhcp_options";

const RESOURCE_NAME: &str = "EC2 DHCP Options";

const KEY_DOMAIN_NAME: &str = "domain-name";
const KEY_DOMAIN_NAME_SERVERS: &str = "domain-name-servers";
const KEY_NETBIOS_NAME_SERVERS: &str = "netbios-name-servers";
const KEY_NETBIOS_NODE_TYPE: &str = "netbios-node-type";
const KEY_NTP_SERVERS: &str = "ntp-servers";

/// Lookup arguments
#[derive(Debug, Clone, Default)]
pub struct DhcpOptionsQuery {
    pub dhcp_options_id: Option<String>,
    pub filters: Vec<Filter>,
    pub tags: BTreeMap<String, String>,
}

impl DhcpOptionsQuery {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            dhcp_options_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    fn to_request(&self) -> DescribeDhcpOptionsRequest {
        let mut filters = self.filters.clone();
        filters.extend(
            self.tags
                .iter()
                .map(|(k, v)| Filter::new(format!("tag:{}", k), [v.clone()])),
        );

        DescribeDhcpOptionsRequest {
            dhcp_options_ids: self.dhcp_options_id.iter().cloned().collect(),
            filters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpOptionsModel {
    pub id: String,
    pub dhcp_options_id: String,
    pub domain_name: Option<String>,
    pub domain_name_servers: Vec<String>,
    pub netbios_name_servers: Vec<String>,
    pub netbios_node_type: Option<String>,
    pub ntp_servers: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub owner_id: String,
    pub arn: String,
}

pub struct DhcpOptionsDataSource {
    provider_data: AwsProviderData,
}

impl DhcpOptionsDataSource {
    pub fn new(provider_data: AwsProviderData) -> Self {
        Self { provider_data }
    }

    pub fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    pub fn validate(&self, query: &DhcpOptionsQuery) -> Diagnostics {
        let mut diags = Diagnostics::new();

        if query.dhcp_options_id.is_none() && query.filters.is_empty() && query.tags.is_empty() {
            diags.add_error(
                "dhcp_options_id",
                "Missing lookup criteria",
                "one of dhcp_options_id, filter or tags must be set",
            );
        }

        if let Some(id) = &query.dhcp_options_id {
            if id.is_empty() {
                diags.add_error("dhcp_options_id", "Empty dhcp_options_id", "");
            }
        }

        for (i, filter) in query.filters.iter().enumerate() {
            if filter.name.is_empty() {
                diags.add_error(
                    format!("filter.{}.name", i),
                    "Empty filter name",
                    "filter name must not be empty",
                );
            }
            if filter.values.is_empty() {
                diags.add_error(
                    format!("filter.{}.values", i),
                    "Missing filter values",
                    "a filter needs at least one value",
                );
            }
        }

        diags
    }

    pub async fn read(&self, query: &DhcpOptionsQuery) -> Result<DhcpOptionsModel> {
        let diags = self.validate(query);
        if diags.has_errors() {
            return Err(ProviderError::Validation(diags));
        }

        let request = query.to_request();
        debug!(?request, "Describing DHCP options");

        let found = match self
            .provider_data
            .client
            .ec2()
            .dhcp_options()
            .describe(&request)
            .await
        {
            Ok(found) => found,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut found = found.into_iter();
        match (found.next(), found.next()) {
            (None, _) => Err(ProviderError::NoMatch(RESOURCE_NAME.to_string())),
            (Some(_), Some(_)) => Err(ProviderError::MultipleMatches(RESOURCE_NAME.to_string())),
            (Some(options), None) => Ok(self.to_model(options)),
        }
    }

    fn to_model(&self, options: DhcpOptions) -> DhcpOptionsModel {
        let single = |key: &str| options.values(key).first().cloned();
        let arn = self.provider_data.arn(
            "ec2",
            &options.owner_id,
            &format!("dhcp-options/{}", options.dhcp_options_id),
        );

        DhcpOptionsModel {
            id: options.dhcp_options_id.clone(),
            dhcp_options_id: options.dhcp_options_id.clone(),
            domain_name: single(KEY_DOMAIN_NAME),
            domain_name_servers: options.values(KEY_DOMAIN_NAME_SERVERS).to_vec(),
            netbios_name_servers: options.values(KEY_NETBIOS_NAME_SERVERS).to_vec(),
            netbios_node_type: single(KEY_NETBIOS_NODE_TYPE),
            ntp_servers: options.values(KEY_NTP_SERVERS).to_vec(),
            tags: tags_to_map(&options.tags),
            owner_id: options.owner_id.clone(),
            arn,
        }
    }
}
