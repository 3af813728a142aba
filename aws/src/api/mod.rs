//! Control-plane API client and typed service operations

pub mod client;
pub mod common;
pub mod ec2;
pub mod error;
pub mod route53resolver;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{Client, RetryConfig};
pub use common::{ApiQueryParams, PageRequest, Tag};
pub use error::ApiError;
