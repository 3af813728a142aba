//! Route 53 Resolver API

pub mod endpoints;
pub mod rules;

use crate::api::Client;

pub use endpoints::{
    CreateResolverEndpointRequest, EndpointsApi, IpAddressRequest, IpAddressResponse,
    ResolverEndpoint, UpdateResolverEndpointRequest,
};
pub use rules::{ResolverRule, RulesApi};

/// Route 53 Resolver API providing endpoint and rule operations
pub struct Route53ResolverApi<'a> {
    client: &'a Client,
}

impl<'a> Route53ResolverApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Resolver endpoint operations
    pub fn endpoints(&self) -> EndpointsApi<'a> {
        EndpointsApi::new(self.client)
    }

    /// Resolver rule operations
    pub fn rules(&self) -> RulesApi<'a> {
        RulesApi::new(self.client)
    }
}
