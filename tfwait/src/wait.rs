//! Poll a resource until it reaches a target status
//!
//! A wait issues one status query at a time. Statuses in the pending set
//! cause another poll after the poll interval, statuses in the target set end
//! the wait successfully, and anything else fails immediately. The deadline
//! is computed once from a monotonic clock when the wait starts.

use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::WaitError;
use crate::query::StatusQuery;

/// Poll interval used when a request does not set one
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Reported as the last status when no query answered before the deadline
pub const UNKNOWN_STATUS: &str = "unknown";

/// Deadline offset used when `start + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Describes what a wait is waiting for
#[derive(Debug, Clone)]
pub struct WaitRequest {
    id: String,
    pending: BTreeSet<String>,
    target: BTreeSet<String>,
    timeout: Duration,
    poll_interval: Duration,
    not_found_is_success: bool,
}

impl WaitRequest {
    pub fn new(id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            id: id.into(),
            pending: BTreeSet::new(),
            target: BTreeSet::new(),
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            not_found_is_success: false,
        }
    }

    /// Statuses for which polling continues
    pub fn pending<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending.extend(statuses.into_iter().map(Into::into));
        self
    }

    /// Statuses that satisfy the wait
    pub fn target<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target.extend(statuses.into_iter().map(Into::into));
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Treat a missing resource as having reached the target
    ///
    /// Only deletion waits should set this. Left off, a missing resource
    /// fails the wait with [`WaitError::NotFound`].
    pub fn not_found_is_success(mut self, enabled: bool) -> Self {
        self.not_found_is_success = enabled;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn accepts_not_found(&self) -> bool {
        self.not_found_is_success
    }

    pub fn validate(&self) -> Result<(), WaitError> {
        if self.target.is_empty() {
            return Err(WaitError::InvalidRequest(format!(
                "no target status given for {}",
                self.id
            )));
        }

        if let Some(status) = self.pending.intersection(&self.target).next() {
            return Err(WaitError::InvalidRequest(format!(
                "status '{}' is both pending and target for {}",
                status, self.id
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(WaitError::InvalidRequest(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Run this wait against `query`
    pub async fn wait<Q>(&self, query: &Q) -> Result<WaitSuccess, WaitError>
    where
        Q: StatusQuery + ?Sized,
    {
        wait_for_state(query, self).await
    }

    fn unexpected(&self, status: String) -> WaitError {
        WaitError::UnexpectedState {
            id: self.id.clone(),
            status,
            pending: self.pending.iter().cloned().collect(),
            target: self.target.iter().cloned().collect(),
        }
    }
}

/// Successful end of a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSuccess {
    /// Target status observed, `None` when the resource was gone
    pub status: Option<String>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl WaitSuccess {
    pub fn is_gone(&self) -> bool {
        self.status.is_none()
    }
}

/// Poll `query` until the resource described by `request` settles
pub async fn wait_for_state<Q>(query: &Q, request: &WaitRequest) -> Result<WaitSuccess, WaitError>
where
    Q: StatusQuery + ?Sized,
{
    request.validate()?;

    let start = Instant::now();
    let deadline = start
        .checked_add(request.timeout)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .ok_or_else(|| {
            WaitError::InvalidRequest(format!(
                "timeout {:?} for {} is out of range",
                request.timeout, request.id
            ))
        })?;
    let mut attempts: u32 = 0;
    let mut last_status: Option<String> = None;

    loop {
        attempts += 1;

        let in_flight = query.query_status(&request.id);
        let observed = match tokio::time::timeout_at(deadline, in_flight).await {
            Ok(result) => result.map_err(|source| WaitError::QueryFailed {
                id: request.id.clone(),
                source,
            })?,
            Err(_) => {
                return Err(WaitError::Timeout {
                    id: request.id.clone(),
                    last_status: last_status.unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
                    elapsed: start.elapsed(),
                })
            }
        };

        let status = match observed {
            Some(status) => status,
            None if request.not_found_is_success => {
                tracing::debug!(
                    "{} not found after {} queries, treating as done",
                    request.id,
                    attempts
                );
                return Ok(WaitSuccess {
                    status: None,
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            None => {
                return Err(WaitError::NotFound {
                    id: request.id.clone(),
                })
            }
        };

        if request.target.contains(&status) {
            tracing::debug!(
                "{} reached state {} after {} queries",
                request.id,
                status,
                attempts
            );
            return Ok(WaitSuccess {
                status: Some(status),
                attempts,
                elapsed: start.elapsed(),
            });
        }

        if !request.pending.contains(&status) {
            return Err(request.unexpected(status));
        }
        last_status = Some(status.clone());

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitError::Timeout {
                id: request.id.clone(),
                last_status: status,
                elapsed: now - start,
            });
        }

        let pause = request.poll_interval.min(deadline - now);
        tracing::debug!(
            "{} still {}, polling again in {:?} (attempt {})",
            request.id,
            status,
            pause,
            attempts
        );
        tokio::time::sleep(pause).await;
    }
}
