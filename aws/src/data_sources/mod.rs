pub mod dhcp_options;
pub mod partition;

pub use dhcp_options::{DhcpOptionsDataSource, DhcpOptionsModel, DhcpOptionsQuery};
pub use partition::{PartitionDataSource, PartitionModel};
