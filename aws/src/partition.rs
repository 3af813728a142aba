//! AWS partitions and the regions that belong to them

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub id: &'static str,
    pub dns_suffix: &'static str,
    region_pattern: &'static str,
}

const PARTITIONS: &[Partition] = &[
    Partition {
        id: "aws",
        dns_suffix: "amazonaws.com",
        region_pattern: r"^(us|eu|ap|sa|ca|me|af|il|mx)-\w+-\d+$",
    },
    Partition {
        id: "aws-cn",
        dns_suffix: "amazonaws.com.cn",
        region_pattern: r"^cn-\w+-\d+$",
    },
    Partition {
        id: "aws-us-gov",
        dns_suffix: "amazonaws.com",
        region_pattern: r"^us-gov-\w+-\d+$",
    },
    Partition {
        id: "aws-iso",
        dns_suffix: "c2s.ic.gov",
        region_pattern: r"^us-iso-\w+-\d+$",
    },
    Partition {
        id: "aws-iso-b",
        dns_suffix: "sc2s.sgov.gov",
        region_pattern: r"^us-isob-\w+-\d+$",
    },
];

fn region_matchers() -> &'static [(Regex, &'static Partition)] {
    static MATCHERS: OnceLock<Vec<(Regex, &'static Partition)>> = OnceLock::new();

    MATCHERS.get_or_init(|| {
        PARTITIONS
            .iter()
            .filter_map(|p| Regex::new(p.region_pattern).ok().map(|re| (re, p)))
            .collect()
    })
}

impl Partition {
    /// Partition owning `region`, or `None` for an unknown region
    pub fn for_region(region: &str) -> Option<&'static Partition> {
        region_matchers()
            .iter()
            .find(|(re, _)| re.is_match(region))
            .map(|(_, p)| *p)
    }

    pub fn by_id(id: &str) -> Option<&'static Partition> {
        PARTITIONS.iter().find(|p| p.id == id)
    }

    /// DNS suffix with its labels reversed, e.g. `com.amazonaws`
    pub fn reverse_dns_prefix(&self) -> String {
        self.dns_suffix.rsplit('.').collect::<Vec<_>>().join(".")
    }

    /// `arn:<partition>:<service>:<region>:<account>:<resource>`
    pub fn arn(&self, service: &str, region: &str, account_id: &str, resource: &str) -> String {
        format!(
            "arn:{}:{}:{}:{}:{}",
            self.id, service, region, account_id, resource
        )
    }
}
