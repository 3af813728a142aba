pub mod resolver_endpoint;

pub use resolver_endpoint::{
    IpAddressModel, ResolverEndpointConfig, ResolverEndpointModel, ResolverEndpointResource,
    Timeouts,
};
