//! aws_route53_resolver_endpoint resource

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::route53resolver::endpoints::{DIRECTION_INBOUND, DIRECTION_OUTBOUND};
use crate::api::route53resolver::{
    CreateResolverEndpointRequest, IpAddressRequest, IpAddressResponse, ResolverEndpoint,
    UpdateResolverEndpointRequest,
};
use crate::diagnostics::Diagnostics;
use crate::error::{ProviderError, Result};
use crate::provider_data::AwsProviderData;
use crate::waiters::{self, EndpointStatusQuery};

pub const TYPE_NAME: &str = "aws_route53_resolver_endpoint";

const CREATOR_REQUEST_ID_PREFIX: &str = "tf-r53-resolver-endpoint-";
const MIN_IP_ADDRESSES: usize = 2;
const MAX_IP_ADDRESSES: usize = 10;
const MAX_SECURITY_GROUPS: usize = 64;
const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAddressModel {
    pub subnet_id: String,
    pub ip: Option<String>,
    /// Assigned by the service
    pub ip_id: Option<String>,
}

impl IpAddressModel {
    pub fn new(subnet_id: impl Into<String>) -> Self {
        Self {
            subnet_id: subnet_id.into(),
            ip: None,
            ip_id: None,
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    fn to_request(&self) -> IpAddressRequest {
        IpAddressRequest {
            subnet_id: self.subnet_id.clone(),
            ip: self.ip.clone(),
            ip_id: self.ip_id.clone(),
        }
    }
}

impl From<IpAddressResponse> for IpAddressModel {
    fn from(response: IpAddressResponse) -> Self {
        Self {
            subnet_id: response.subnet_id,
            ip: Some(response.ip),
            ip_id: Some(response.ip_id),
        }
    }
}

/// Desired configuration as written by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverEndpointConfig {
    pub name: Option<String>,
    pub direction: String,
    pub security_group_ids: BTreeSet<String>,
    pub ip_addresses: Vec<IpAddressModel>,
    pub tags: BTreeMap<String, String>,
}

/// State of an endpoint as read back from the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverEndpointModel {
    pub id: String,
    pub arn: String,
    pub name: Option<String>,
    pub direction: String,
    pub security_group_ids: BTreeSet<String>,
    pub ip_addresses: Vec<IpAddressModel>,
    pub host_vpc_id: String,
    pub tags: BTreeMap<String, String>,
}

impl ResolverEndpointModel {
    fn from_api(endpoint: ResolverEndpoint, addresses: Vec<IpAddressResponse>) -> Self {
        Self {
            id: endpoint.id,
            arn: endpoint.arn,
            name: endpoint.name,
            direction: endpoint.direction,
            security_group_ids: endpoint.security_group_ids.into_iter().collect(),
            ip_addresses: addresses.into_iter().map(IpAddressModel::from).collect(),
            host_vpc_id: endpoint.host_vpc_id,
            tags: endpoint.tags,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: waiters::ENDPOINT_TIMEOUT,
            update: waiters::ENDPOINT_TIMEOUT,
            delete: waiters::ENDPOINT_TIMEOUT,
            poll_interval: tfwait::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// IP address changes needed to go from the prior state to the desired configuration
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IpAddressDiff {
    pub associate: Vec<IpAddressModel>,
    pub disassociate: Vec<IpAddressModel>,
}

impl IpAddressDiff {
    pub fn is_empty(&self) -> bool {
        self.associate.is_empty() && self.disassociate.is_empty()
    }
}

/// An entry without an explicit ip matches any prior address in the same subnet.
/// Exact matches are claimed first so they are never taken by a subnet-only entry.
pub fn diff_ip_addresses(prior: &[IpAddressModel], desired: &[IpAddressModel]) -> IpAddressDiff {
    let mut claimed = vec![false; prior.len()];
    let mut matched = vec![false; desired.len()];

    for (d, want) in desired.iter().enumerate() {
        let Some(ip) = &want.ip else { continue };
        if let Some(p) = prior.iter().enumerate().position(|(p, have)| {
            !claimed[p] && have.subnet_id == want.subnet_id && have.ip.as_ref() == Some(ip)
        }) {
            claimed[p] = true;
            matched[d] = true;
        }
    }

    for (d, want) in desired.iter().enumerate() {
        if matched[d] || want.ip.is_some() {
            continue;
        }
        if let Some(p) = prior
            .iter()
            .enumerate()
            .position(|(p, have)| !claimed[p] && have.subnet_id == want.subnet_id)
        {
            claimed[p] = true;
            matched[d] = true;
        }
    }

    IpAddressDiff {
        associate: desired
            .iter()
            .zip(&matched)
            .filter(|(_, m)| !**m)
            .map(|(a, _)| a.clone())
            .collect(),
        disassociate: prior
            .iter()
            .zip(&claimed)
            .filter(|(_, c)| !**c)
            .map(|(a, _)| a.clone())
            .collect(),
    }
}

pub struct ResolverEndpointResource {
    provider_data: AwsProviderData,
    timeouts: Timeouts,
}

impl ResolverEndpointResource {
    pub fn new(provider_data: AwsProviderData) -> Self {
        Self {
            provider_data,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn status_query(&self) -> EndpointStatusQuery {
        EndpointStatusQuery::new(self.provider_data.client.as_ref().clone())
    }

    pub fn validate(&self, config: &ResolverEndpointConfig) -> Diagnostics {
        let mut diags = Diagnostics::new();

        if config.direction != DIRECTION_INBOUND && config.direction != DIRECTION_OUTBOUND {
            diags.add_error(
                "direction",
                "Invalid direction",
                format!(
                    "direction must be one of [{}, {}], got {:?}",
                    DIRECTION_INBOUND, DIRECTION_OUTBOUND, config.direction
                ),
            );
        }

        let groups = config.security_group_ids.len();
        if groups == 0 || groups > MAX_SECURITY_GROUPS {
            diags.add_error(
                "security_group_ids",
                "Invalid security_group_ids",
                format!(
                    "between 1 and {} security groups required, got {}",
                    MAX_SECURITY_GROUPS, groups
                ),
            );
        }

        let addresses = config.ip_addresses.len();
        if !(MIN_IP_ADDRESSES..=MAX_IP_ADDRESSES).contains(&addresses) {
            diags.add_error(
                "ip_address",
                "Invalid ip_address",
                format!(
                    "between {} and {} ip_address blocks required, got {}",
                    MIN_IP_ADDRESSES, MAX_IP_ADDRESSES, addresses
                ),
            );
        }

        for (i, address) in config.ip_addresses.iter().enumerate() {
            if address.subnet_id.is_empty() {
                diags.add_error(
                    format!("ip_address.{}.subnet_id", i),
                    "Missing subnet_id",
                    "",
                );
            }
        }

        if let Some(name) = &config.name {
            if name.chars().count() > MAX_NAME_LEN {
                diags.add_error(
                    "name",
                    "Name too long",
                    format!("name must be at most {} characters", MAX_NAME_LEN),
                );
            }
        }

        diags
    }

    pub async fn create(&self, config: &ResolverEndpointConfig) -> Result<ResolverEndpointModel> {
        let diags = self.validate(config);
        if diags.has_errors() {
            return Err(ProviderError::Validation(diags));
        }

        let request = CreateResolverEndpointRequest {
            creator_request_id: format!("{}{}", CREATOR_REQUEST_ID_PREFIX, uuid::Uuid::new_v4()),
            name: config.name.clone(),
            direction: config.direction.clone(),
            security_group_ids: config.security_group_ids.iter().cloned().collect(),
            ip_addresses: config
                .ip_addresses
                .iter()
                .map(IpAddressModel::to_request)
                .collect(),
            tags: config.tags.clone(),
        };

        debug!(?request, "Creating Route53 Resolver endpoint");
        let endpoint = self
            .provider_data
            .client
            .route53resolver()
            .endpoints()
            .create(&request)
            .await?;
        info!(endpoint_id = %endpoint.id, "Created Route53 Resolver endpoint");

        waiters::endpoint_created(&endpoint.id, self.timeouts.create, self.timeouts.poll_interval)
            .wait(&self.status_query())
            .await?;

        self.read(&endpoint.id)
            .await?
            .ok_or_else(|| ProviderError::NoMatch(format!("Route53 Resolver endpoint {}", endpoint.id)))
    }

    /// `Ok(None)` when the endpoint no longer exists
    pub async fn read(&self, id: &str) -> Result<Option<ResolverEndpointModel>> {
        let api = self.provider_data.client.route53resolver().endpoints();

        let endpoint = match api.get(id).await {
            Ok(endpoint) => endpoint,
            Err(e) if e.is_not_found() => {
                warn!(endpoint_id = %id, "Route53 Resolver endpoint not found, removing from state");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let addresses = match api.list_ip_addresses(id).await {
            Ok(addresses) => addresses,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(ResolverEndpointModel::from_api(endpoint, addresses)))
    }

    pub async fn update(
        &self,
        prior: &ResolverEndpointModel,
        config: &ResolverEndpointConfig,
    ) -> Result<ResolverEndpointModel> {
        if prior.direction != config.direction {
            return Err(ProviderError::RequiresReplacement {
                attribute: "direction".to_string(),
            });
        }
        if prior.security_group_ids != config.security_group_ids {
            return Err(ProviderError::RequiresReplacement {
                attribute: "security_group_ids".to_string(),
            });
        }

        let diags = self.validate(config);
        if diags.has_errors() {
            return Err(ProviderError::Validation(diags));
        }

        let api = self.provider_data.client.route53resolver().endpoints();
        let id = prior.id.as_str();

        // The service cannot clear a name, so a removed name keeps the current one
        match &config.name {
            Some(name) if prior.name.as_ref() != Some(name) => {
                debug!(endpoint_id = %id, name = %name, "Updating Route53 Resolver endpoint name");
                api.update(
                    id,
                    &UpdateResolverEndpointRequest {
                        name: Some(name.clone()),
                    },
                )
                .await?;
            }
            _ => {}
        }

        // Associate before disassociating so the endpoint never drops below its minimum
        let diff = diff_ip_addresses(&prior.ip_addresses, &config.ip_addresses);
        for address in &diff.associate {
            info!(endpoint_id = %id, subnet_id = %address.subnet_id, "Associating IP address");
            api.associate_ip_address(id, &address.to_request()).await?;
            self.wait_updated(id).await?;
        }
        for address in &diff.disassociate {
            info!(endpoint_id = %id, subnet_id = %address.subnet_id, "Disassociating IP address");
            api.disassociate_ip_address(id, &address.to_request()).await?;
            self.wait_updated(id).await?;
        }

        if prior.tags != config.tags {
            debug!(endpoint_id = %id, "Replacing Route53 Resolver endpoint tags");
            api.replace_tags(id, &config.tags).await?;
        }

        self.read(id)
            .await?
            .ok_or_else(|| ProviderError::NoMatch(format!("Route53 Resolver endpoint {}", id)))
    }

    async fn wait_updated(&self, id: &str) -> Result<()> {
        waiters::endpoint_updated(id, self.timeouts.update, self.timeouts.poll_interval)
            .wait(&self.status_query())
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        info!(endpoint_id = %id, "Deleting Route53 Resolver endpoint");

        match self
            .provider_data
            .client
            .route53resolver()
            .endpoints()
            .delete(id)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        waiters::endpoint_deleted(id, self.timeouts.delete, self.timeouts.poll_interval)
            .wait(&self.status_query())
            .await?;
        Ok(())
    }

    pub async fn import(&self, id: &str) -> Result<ResolverEndpointModel> {
        self.read(id)
            .await?
            .ok_or_else(|| ProviderError::NoMatch(format!("Route53 Resolver endpoint {}", id)))
    }

    /// Whether the endpoint can still be fetched; used to confirm destruction
    pub async fn exists(&self, id: &str) -> Result<bool> {
        match self
            .provider_data
            .client
            .route53resolver()
            .endpoints()
            .get(id)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
