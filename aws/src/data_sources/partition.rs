//! aws_partition data source

use crate::provider_data::AwsProviderData;

pub const TYPE_NAME: &str = "aws_partition";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionModel {
    pub id: String,
    pub partition: String,
    pub dns_suffix: String,
    pub reverse_dns_prefix: String,
}

pub struct PartitionDataSource {
    provider_data: AwsProviderData,
}

impl PartitionDataSource {
    pub fn new(provider_data: AwsProviderData) -> Self {
        Self { provider_data }
    }

    pub fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    /// Derived from the configured region; no API call is made
    pub fn read(&self) -> PartitionModel {
        let partition = self.provider_data.partition;
        PartitionModel {
            id: partition.id.to_string(),
            partition: partition.id.to_string(),
            dns_suffix: partition.dns_suffix.to_string(),
            reverse_dns_prefix: partition.reverse_dns_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Client;
    use crate::partition::Partition;

    fn data_source(region: &str) -> PartitionDataSource {
        let client = Client::new("http://localhost:4566", "token", false).unwrap();
        let partition = Partition::for_region(region).unwrap();
        PartitionDataSource::new(AwsProviderData::new(client, region, partition))
    }

    #[test]
    fn reads_commercial_partition() {
        let model = data_source("us-west-2").read();

        assert_eq!(model.id, "aws");
        assert_eq!(model.partition, "aws");
        assert_eq!(model.dns_suffix, "amazonaws.com");
        assert_eq!(model.reverse_dns_prefix, "com.amazonaws");
    }

    #[test]
    fn reads_china_partition() {
        let model = data_source("cn-north-1").read();

        assert_eq!(model.partition, "aws-cn");
        assert_eq!(model.dns_suffix, "amazonaws.com.cn");
        assert_eq!(model.reverse_dns_prefix, "cn.com.amazonaws");
    }
}
