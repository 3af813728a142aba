//! Sweepers that delete leftover test resources from a region

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tfwait::{StatusQuery, WaitRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::common::PageRequest;
use crate::api::route53resolver::rules::RULE_TYPE_RECURSIVE;
use crate::api::{ApiError, Client};
use crate::error::ProviderError;
use crate::waiters::{self, EndpointStatusQuery, RuleStatusQuery};

pub const RESOLVER_ENDPOINT_SWEEPER: &str = "aws_route53_resolver_endpoint";
pub const RESOLVER_RULE_SWEEPER: &str = "aws_route53_resolver_rule";

/// Default number of deletions in flight per sweeper
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweeper {
    pub name: &'static str,
    pub dependencies: &'static [&'static str],
}

#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct SweepFailure {
    pub context: String,
    #[source]
    pub source: ProviderError,
}

impl SweepFailure {
    fn new(context: impl Into<String>, source: impl Into<ProviderError>) -> Self {
        Self {
            context: context.into(),
            source: source.into(),
        }
    }
}

struct FailureList<'a>(&'a [SweepFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in self.0 {
            write!(f, "\n  * {}", failure)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("unknown sweeper: {0}")]
    UnknownSweeper(String),

    #[error("sweeper dependency cycle involving {0}")]
    DependencyCycle(String),

    #[error("{} error(s) occurred:{}", .0.len(), FailureList(.0))]
    Failed(Vec<SweepFailure>),
}

impl SweepError {
    pub fn failures(&self) -> &[SweepFailure] {
        match self {
            SweepError::Failed(failures) => failures,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub concurrency: usize,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: waiters::ENDPOINT_TIMEOUT,
            poll_interval: tfwait::DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: usize,
    /// Set when the region or credentials do not support the service
    pub skipped: bool,
}

/// Listing errors that mean the sweeper cannot run here rather than that it failed
pub fn skip_sweep_error(err: &ApiError) -> bool {
    match err {
        ApiError::AuthError | ApiError::AccessDenied(_) => true,
        ApiError::ApiError { message, .. } => {
            matches!(
                err.code(),
                Some("UnsupportedOperation" | "InvalidAction" | "UnrecognizedClientException")
            ) || message.contains("is not supported in this region")
        }
        _ => false,
    }
}

/// Known sweepers and the sweepers that must run before each of them
#[derive(Debug, Clone, Default)]
pub struct SweeperRegistry {
    sweepers: BTreeMap<&'static str, Sweeper>,
}

impl SweeperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sweeper: Sweeper) {
        self.sweepers.insert(sweeper.name, sweeper);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sweepers.keys().copied()
    }

    /// Selected sweepers plus their dependencies, dependencies first.
    /// An empty selection means every registered sweeper.
    pub fn run_order(&self, selected: &[String]) -> Result<Vec<&'static str>, SweepError> {
        let roots: Vec<&'static str> = if selected.is_empty() {
            self.names().collect()
        } else {
            selected
                .iter()
                .map(|name| {
                    self.sweepers
                        .get_key_value(name.as_str())
                        .map(|(k, _)| *k)
                        .ok_or_else(|| SweepError::UnknownSweeper(name.clone()))
                })
                .collect::<Result<_, _>>()?
        };

        let mut order = Vec::new();
        let mut done = BTreeSet::new();
        let mut visiting = BTreeSet::new();
        for root in roots {
            self.visit(root, &mut visiting, &mut done, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        name: &'static str,
        visiting: &mut BTreeSet<&'static str>,
        done: &mut BTreeSet<&'static str>,
        order: &mut Vec<&'static str>,
    ) -> Result<(), SweepError> {
        if done.contains(name) {
            return Ok(());
        }
        if !visiting.insert(name) {
            return Err(SweepError::DependencyCycle(name.to_string()));
        }

        let sweeper = self
            .sweepers
            .get(name)
            .ok_or_else(|| SweepError::UnknownSweeper(name.to_string()))?;
        for dependency in sweeper.dependencies {
            self.visit(*dependency, visiting, done, order)?;
        }

        visiting.remove(name);
        done.insert(name);
        order.push(name);
        Ok(())
    }
}

pub fn default_registry() -> SweeperRegistry {
    let mut registry = SweeperRegistry::new();
    registry.register(Sweeper {
        name: RESOLVER_RULE_SWEEPER,
        dependencies: &[],
    });
    registry.register(Sweeper {
        name: RESOLVER_ENDPOINT_SWEEPER,
        dependencies: &[RESOLVER_RULE_SWEEPER],
    });
    registry
}

/// Run one registered sweeper by name
pub async fn run_sweeper(
    client: &Client,
    name: &str,
    options: &SweepOptions,
) -> Result<SweepReport, SweepError> {
    match name {
        RESOLVER_ENDPOINT_SWEEPER => sweep_resolver_endpoints(client, options).await,
        RESOLVER_RULE_SWEEPER => sweep_resolver_rules(client, options).await,
        other => Err(SweepError::UnknownSweeper(other.to_string())),
    }
}

fn finish(report: SweepReport, failures: Vec<SweepFailure>) -> Result<SweepReport, SweepError> {
    if failures.is_empty() {
        Ok(report)
    } else {
        Err(SweepError::Failed(failures))
    }
}

/// One listed page of resource ids
struct ListedPage {
    ids: Vec<String>,
    next_token: Option<String>,
}

/// List, delete and await deletion of one resource type across every page.
/// `noun` names the resource in log lines and failure contexts.
async fn sweep_paged<Q, L, LFut, D, DFut>(
    noun: &str,
    options: &SweepOptions,
    query: &Q,
    deleted: fn(&str, Duration, Duration) -> WaitRequest,
    mut list: L,
    delete: D,
) -> Result<SweepReport, SweepError>
where
    Q: StatusQuery,
    L: FnMut(PageRequest) -> LFut,
    LFut: Future<Output = Result<ListedPage, ApiError>>,
    D: Fn(String) -> DFut,
    DFut: Future<Output = Result<(), ApiError>>,
{
    let mut report = SweepReport::default();
    let mut failures = Vec::new();
    let mut page = PageRequest::new();
    let mut first_page = true;

    loop {
        let listed = match list(page.clone()).await {
            Ok(listed) => listed,
            Err(e) if first_page && skip_sweep_error(&e) => {
                warn!(error = %e, "Skipping {} sweep", noun);
                report.skipped = true;
                return Ok(report);
            }
            Err(e) => {
                failures.push(SweepFailure::new(format!("error retrieving {}s", noun), e));
                break;
            }
        };
        first_page = false;

        let results: Vec<Result<bool, SweepFailure>> = stream::iter(listed.ids)
            .map(|id| {
                let deletion = delete(id.clone());
                async move {
                    info!(resource_id = %id, "Deleting {}", noun);
                    match deletion.await {
                        Ok(()) => {}
                        Err(e) if e.is_not_found() => return Ok(false),
                        Err(e) => {
                            return Err(SweepFailure::new(
                                format!("error deleting {} ({})", noun, id),
                                e,
                            ))
                        }
                    }

                    deleted(&id, options.timeout, options.poll_interval)
                        .wait(query)
                        .await
                        .map(|_| true)
                        .map_err(|e| {
                            SweepFailure::new(
                                format!("error waiting for {} ({}) deletion", noun, id),
                                e,
                            )
                        })
                }
            })
            .buffer_unordered(options.concurrency.max(1))
            .collect()
            .await;

        for result in results {
            match result {
                Ok(true) => report.deleted += 1,
                Ok(false) => {}
                Err(failure) => failures.push(failure),
            }
        }

        match listed.next_token {
            Some(token) if !token.is_empty() => page = page.with_next_token(token),
            _ => break,
        }
    }

    debug!(deleted = report.deleted, failed = failures.len(), "{} sweep done", noun);
    finish(report, failures)
}

/// Delete every resolver endpoint in the region and wait for each to disappear
pub async fn sweep_resolver_endpoints(
    client: &Client,
    options: &SweepOptions,
) -> Result<SweepReport, SweepError> {
    let query = EndpointStatusQuery::new(client.clone());
    sweep_paged(
        "Route53 Resolver endpoint",
        options,
        &query,
        waiters::endpoint_deleted,
        move |page| async move {
            let response = client.route53resolver().endpoints().list(&page).await?;
            Ok::<_, ApiError>(ListedPage {
                ids: response
                    .resolver_endpoints
                    .into_iter()
                    .map(|endpoint| endpoint.id)
                    .collect(),
                next_token: response.next_token,
            })
        },
        move |id| async move {
            client.route53resolver().endpoints().delete(&id).await?;
            Ok::<_, ApiError>(())
        },
    )
    .await
}

/// Delete every deletable resolver rule in the region.
/// Resolver-managed recursive rules are left alone.
pub async fn sweep_resolver_rules(
    client: &Client,
    options: &SweepOptions,
) -> Result<SweepReport, SweepError> {
    let query = RuleStatusQuery::new(client.clone());
    sweep_paged(
        "Route53 Resolver rule",
        options,
        &query,
        waiters::rule_deleted,
        move |page| async move {
            let response = client.route53resolver().rules().list(&page).await?;
            Ok::<_, ApiError>(ListedPage {
                ids: response
                    .resolver_rules
                    .into_iter()
                    .filter(|rule| rule.rule_type != RULE_TYPE_RECURSIVE)
                    .map(|rule| rule.id)
                    .collect(),
                next_token: response.next_token,
            })
        },
        move |id| async move {
            client.route53resolver().rules().delete(&id).await?;
            Ok::<_, ApiError>(())
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    fn fast_options() -> SweepOptions {
        SweepOptions {
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[test]
    fn endpoints_run_after_rules() {
        let registry = default_registry();

        let order = registry.run_order(&[]).unwrap();
        assert_eq!(order, vec![RESOLVER_RULE_SWEEPER, RESOLVER_ENDPOINT_SWEEPER]);

        let order = registry
            .run_order(&[RESOLVER_ENDPOINT_SWEEPER.to_string()])
            .unwrap();
        assert_eq!(order, vec![RESOLVER_RULE_SWEEPER, RESOLVER_ENDPOINT_SWEEPER]);
    }

    #[test]
    fn unknown_sweeper_is_rejected() {
        let err = default_registry()
            .run_order(&["aws_vpc".to_string()])
            .unwrap_err();
        assert!(matches!(err, SweepError::UnknownSweeper(name) if name == "aws_vpc"));
    }

    #[test]
    fn dependency_cycle_is_rejected() {
        let mut registry = SweeperRegistry::new();
        registry.register(Sweeper {
            name: "a",
            dependencies: &["b"],
        });
        registry.register(Sweeper {
            name: "b",
            dependencies: &["a"],
        });

        let err = registry.run_order(&[]).unwrap_err();
        assert!(matches!(err, SweepError::DependencyCycle(_)));
    }

    #[test]
    fn skip_errors() {
        assert!(skip_sweep_error(&ApiError::AuthError));
        assert!(skip_sweep_error(&ApiError::AccessDenied("no".to_string())));
        assert!(skip_sweep_error(&ApiError::ApiError {
            status: 400,
            message: "Route 53 Resolver is not supported in this region".to_string(),
            details: None,
        }));
        assert!(!skip_sweep_error(&ApiError::ServiceUnavailable));
    }

    #[test]
    fn failed_error_lists_every_failure() {
        let err = SweepError::Failed(vec![
            SweepFailure::new(
                "error deleting Route53 Resolver endpoint (rslvr-in-1)",
                ApiError::ServiceUnavailable,
            ),
            SweepFailure::new(
                "error deleting Route53 Resolver endpoint (rslvr-in-2)",
                ApiError::RateLimited,
            ),
        ]);

        let msg = err.to_string();
        assert!(msg.starts_with("2 error(s) occurred:"));
        assert!(msg.contains("rslvr-in-1"));
        assert!(msg.contains("rslvr-in-2"));
        assert_eq!(err.failures().len(), 2);
    }

    #[tokio::test]
    async fn endpoint_sweep_deletes_and_waits() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/route53resolver/endpoints")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"data":{"resolver_endpoints":[
                    {"id":"rslvr-in-1","arn":"arn1","direction":"INBOUND","host_vpc_id":"vpc-1","status":"OPERATIONAL"},
                    {"id":"rslvr-out-2","arn":"arn2","direction":"OUTBOUND","host_vpc_id":"vpc-1","status":"OPERATIONAL"}
                ]}}"#,
            )
            .create_async()
            .await;
        let delete_1 = server
            .mock("DELETE", "/route53resolver/endpoints/rslvr-in-1")
            .with_body(r#"{"data":null}"#)
            .create_async()
            .await;
        let delete_2 = server
            .mock("DELETE", "/route53resolver/endpoints/rslvr-out-2")
            .with_status(404)
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/route53resolver/endpoints/rslvr-in-1")
            .with_status(404)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let report = sweep_resolver_endpoints(&client, &fast_options())
            .await
            .unwrap();

        assert_eq!(report.deleted, 1);
        assert!(!report.skipped);
        delete_1.assert_async().await;
        delete_2.assert_async().await;
    }

    #[tokio::test]
    async fn endpoint_sweep_collects_failures_and_continues() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/route53resolver/endpoints")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"data":{"resolver_endpoints":[
                    {"id":"rslvr-in-1","arn":"arn1","direction":"INBOUND","host_vpc_id":"vpc-1","status":"OPERATIONAL"},
                    {"id":"rslvr-in-2","arn":"arn2","direction":"INBOUND","host_vpc_id":"vpc-1","status":"OPERATIONAL"}
                ]}}"#,
            )
            .create_async()
            .await;
        let _fail = server
            .mock("DELETE", "/route53resolver/endpoints/rslvr-in-1")
            .with_status(400)
            .with_body(r#"{"code":"InvalidRequestException","message":"in use"}"#)
            .create_async()
            .await;
        let ok = server
            .mock("DELETE", "/route53resolver/endpoints/rslvr-in-2")
            .with_body(r#"{"data":null}"#)
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/route53resolver/endpoints/rslvr-in-2")
            .with_status(404)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = sweep_resolver_endpoints(&client, &fast_options())
            .await
            .unwrap_err();

        assert_eq!(err.failures().len(), 1);
        assert!(err.failures()[0].context.contains("rslvr-in-1"));
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn endpoint_sweep_skips_unsupported_region() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/route53resolver/endpoints")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"message":"not authorized"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let report = sweep_resolver_endpoints(&client, &fast_options())
            .await
            .unwrap();

        assert!(report.skipped);
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn rule_sweep_leaves_recursive_rules() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/route53resolver/rules")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"data":{"resolver_rules":[
                    {"id":"rslvr-autodefined-rr-1","arn":"arn1","domain_name":".",
                     "rule_type":"RECURSIVE","status":"COMPLETE"},
                    {"id":"rslvr-rr-2","arn":"arn2","domain_name":"example.com",
                     "rule_type":"FORWARD","status":"COMPLETE"}
                ]}}"#,
            )
            .create_async()
            .await;
        let recursive = server
            .mock("DELETE", "/route53resolver/rules/rslvr-autodefined-rr-1")
            .expect(0)
            .create_async()
            .await;
        let forward = server
            .mock("DELETE", "/route53resolver/rules/rslvr-rr-2")
            .with_body(r#"{"data":null}"#)
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/route53resolver/rules/rslvr-rr-2")
            .with_status(404)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let report = sweep_resolver_rules(&client, &fast_options()).await.unwrap();

        assert_eq!(report.deleted, 1);
        recursive.assert_async().await;
        forward.assert_async().await;
    }

    #[tokio::test]
    async fn rule_sweep_follows_next_token() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/route53resolver/rules")
            .match_query(Matcher::Regex("^max_results=[0-9]+$".to_string()))
            .with_body(
                r#"{"data":{"resolver_rules":[
                    {"id":"rslvr-rr-1","arn":"arn1","domain_name":"a.example.com",
                     "rule_type":"FORWARD","status":"COMPLETE"}
                ],"next_token":"page-2"}}"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/route53resolver/rules")
            .match_query(Matcher::UrlEncoded(
                "next_token".to_string(),
                "page-2".to_string(),
            ))
            .with_body(
                r#"{"data":{"resolver_rules":[
                    {"id":"rslvr-rr-2","arn":"arn2","domain_name":"b.example.com",
                     "rule_type":"FORWARD","status":"COMPLETE"}
                ]}}"#,
            )
            .create_async()
            .await;
        let mut mocks = Vec::new();
        for id in ["rslvr-rr-1", "rslvr-rr-2"] {
            let path = format!("/route53resolver/rules/{}", id);
            mocks.push(
                server
                    .mock("DELETE", path.as_str())
                    .with_body(r#"{"data":null}"#)
                    .create_async()
                    .await,
            );
            mocks.push(
                server
                    .mock("GET", path.as_str())
                    .with_status(404)
                    .create_async()
                    .await,
            );
        }

        let client = create_test_client(&server.url());
        let report = sweep_resolver_rules(&client, &fast_options()).await.unwrap();

        assert_eq!(report.deleted, 2);
        first.assert_async().await;
        second.assert_async().await;
    }
}
