//! Resolver endpoint API implementation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::common::PageRequest;
use crate::api::{ApiError, Client};

const ENDPOINTS_PATH: &str = "/route53resolver/endpoints";

/// Path of one endpoint, with the id encoded as a single segment
fn endpoint_path(id: &str) -> String {
    format!("{}/{}", ENDPOINTS_PATH, urlencoding::encode(id))
}

/// Statuses reported for a resolver endpoint
pub mod status {
    pub const CREATING: &str = "CREATING";
    pub const OPERATIONAL: &str = "OPERATIONAL";
    pub const UPDATING: &str = "UPDATING";
    pub const AUTO_RECOVERING: &str = "AUTO_RECOVERING";
    pub const ACTION_NEEDED: &str = "ACTION_NEEDED";
    pub const DELETING: &str = "DELETING";
    /// Never reported by the service; stands for an endpoint that is gone
    pub const DELETED: &str = "DELETED";
}

pub const DIRECTION_INBOUND: &str = "INBOUND";
pub const DIRECTION_OUTBOUND: &str = "OUTBOUND";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverEndpoint {
    pub id: String,
    pub arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub direction: String,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default)]
    pub ip_address_count: u32,
    pub host_vpc_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_request_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// IP address to attach to (or detach from) an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpAddressRequest {
    pub subnet_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_id: Option<String>,
}

/// Item in the IP address list of an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpAddressResponse {
    pub ip_id: String,
    pub subnet_id: String,
    pub ip: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Request body for creating endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CreateResolverEndpointRequest {
    pub creator_request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub direction: String,
    pub security_group_ids: Vec<String>,
    pub ip_addresses: Vec<IpAddressRequest>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Request body for updating endpoints
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResolverEndpointRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResolverEndpointsResponse {
    #[serde(default)]
    pub resolver_endpoints: Vec<ResolverEndpoint>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListIpAddressesResponse {
    #[serde(default)]
    ip_addresses: Vec<IpAddressResponse>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct TagsRequest<'a> {
    tags: &'a BTreeMap<String, String>,
}

/// Endpoints API for resolver endpoint operations
pub struct EndpointsApi<'a> {
    client: &'a Client,
}

impl<'a> EndpointsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /route53resolver/endpoints
    pub async fn list(&self, page: &PageRequest) -> Result<ListResolverEndpointsResponse, ApiError> {
        let path = format!(
            "{}{}",
            ENDPOINTS_PATH,
            page.to_query_params().to_query_string()
        );
        self.client.get(&path).await
    }

    /// All endpoints, following `next_token` until the last page
    pub async fn list_all(&self) -> Result<Vec<ResolverEndpoint>, ApiError> {
        let mut endpoints = Vec::new();
        let mut page = PageRequest::new();

        loop {
            let response = self.list(&page).await?;
            endpoints.extend(response.resolver_endpoints);

            match response.next_token {
                Some(token) if !token.is_empty() => page = page.with_next_token(token),
                _ => break,
            }
        }

        Ok(endpoints)
    }

    /// GET /route53resolver/endpoints/{id}
    pub async fn get(&self, id: &str) -> Result<ResolverEndpoint, ApiError> {
        self.client
            .get(&endpoint_path(id))
            .await
    }

    /// POST /route53resolver/endpoints
    pub async fn create(
        &self,
        request: &CreateResolverEndpointRequest,
    ) -> Result<ResolverEndpoint, ApiError> {
        self.client.post(ENDPOINTS_PATH, request).await
    }

    /// PUT /route53resolver/endpoints/{id}
    pub async fn update(
        &self,
        id: &str,
        request: &UpdateResolverEndpointRequest,
    ) -> Result<ResolverEndpoint, ApiError> {
        self.client
            .put(&endpoint_path(id), request)
            .await
    }

    /// DELETE /route53resolver/endpoints/{id}
    pub async fn delete(&self, id: &str) -> Result<Option<ResolverEndpoint>, ApiError> {
        self.client
            .delete(&endpoint_path(id))
            .await
    }

    /// GET /route53resolver/endpoints/{id}/ip-addresses
    pub async fn list_ip_addresses(&self, id: &str) -> Result<Vec<IpAddressResponse>, ApiError> {
        let mut addresses = Vec::new();
        let mut page = PageRequest::new();

        loop {
            let path = format!(
                "{}/ip-addresses{}",
                endpoint_path(id),
                page.to_query_params().to_query_string()
            );
            let response: ListIpAddressesResponse = self.client.get(&path).await?;
            addresses.extend(response.ip_addresses);

            match response.next_token {
                Some(token) if !token.is_empty() => page = page.with_next_token(token),
                _ => break,
            }
        }

        Ok(addresses)
    }

    /// POST /route53resolver/endpoints/{id}/ip-addresses
    pub async fn associate_ip_address(
        &self,
        id: &str,
        address: &IpAddressRequest,
    ) -> Result<ResolverEndpoint, ApiError> {
        self.client
            .post(&format!("{}/ip-addresses", endpoint_path(id)), address)
            .await
    }

    /// POST /route53resolver/endpoints/{id}/ip-addresses/disassociate
    pub async fn disassociate_ip_address(
        &self,
        id: &str,
        address: &IpAddressRequest,
    ) -> Result<ResolverEndpoint, ApiError> {
        self.client
            .post(
                &format!("{}/ip-addresses/disassociate", endpoint_path(id)),
                address,
            )
            .await
    }

    /// PUT /route53resolver/endpoints/{id}/tags
    pub async fn replace_tags(
        &self,
        id: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), ApiError> {
        self.client
            .put::<(), _>(
                &format!("{}/tags", endpoint_path(id)),
                &TagsRequest { tags },
            )
            .await
    }
}
