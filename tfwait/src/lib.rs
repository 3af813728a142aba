//! tfwait - bounded state-change waits for Terraform providers
//!
//! Remote control planes report resource status asynchronously. After a
//! mutating call (create, update, delete) a provider has to block until the
//! resource settles into one of a set of target statuses. This crate polls
//! an injected [`StatusQuery`] until that happens, the status leaves the
//! expected set, or the deadline passes.

pub mod error;
pub mod query;
pub mod wait;

pub use error::{BoxError, WaitError};
pub use query::{query_fn, QueryFn, StatusQuery};
pub use wait::{
    wait_for_state, WaitRequest, WaitSuccess, DEFAULT_POLL_INTERVAL, UNKNOWN_STATUS,
};
