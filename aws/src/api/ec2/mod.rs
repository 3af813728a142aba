//! EC2 API

pub mod dhcp_options;

use crate::api::Client;

pub use dhcp_options::{
    DescribeDhcpOptionsRequest, DhcpConfiguration, DhcpOptions, DhcpOptionsApi, Filter,
};

/// EC2 API providing VPC networking operations
pub struct Ec2Api<'a> {
    client: &'a Client,
}

impl<'a> Ec2Api<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// DHCP options set operations
    pub fn dhcp_options(&self) -> DhcpOptionsApi<'a> {
        DhcpOptionsApi::new(self.client)
    }
}
