//! Status query capability consumed by waits

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::error::BoxError;

/// Looks up the current status of a remote resource
///
/// `Ok(None)` means the resource does not exist. Any other failure is
/// returned as an error and ends the wait; retrying transient failures is up
/// to the implementation.
#[async_trait]
pub trait StatusQuery: Send + Sync {
    async fn query_status(&self, id: &str) -> Result<Option<String>, BoxError>;
}

#[async_trait]
impl<T: StatusQuery + ?Sized> StatusQuery for &T {
    async fn query_status(&self, id: &str) -> Result<Option<String>, BoxError> {
        (**self).query_status(id).await
    }
}

#[async_trait]
impl<T: StatusQuery + ?Sized> StatusQuery for Arc<T> {
    async fn query_status(&self, id: &str) -> Result<Option<String>, BoxError> {
        (**self).query_status(id).await
    }
}

/// Status query backed by a closure
pub struct QueryFn<F>(F);

/// Wrap a closure taking the resource id as a [`StatusQuery`]
pub fn query_fn<F, Fut>(f: F) -> QueryFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>, BoxError>> + Send,
{
    QueryFn(f)
}

#[async_trait]
impl<F, Fut> StatusQuery for QueryFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>, BoxError>> + Send,
{
    async fn query_status(&self, id: &str) -> Result<Option<String>, BoxError> {
        (self.0)(id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closure_query_receives_id() {
        let query = query_fn(|id: String| async move {
            Ok::<_, BoxError>(Some(format!("{}:OPERATIONAL", id)))
        });

        let status = query.query_status("rslvr-in-1").await.unwrap();
        assert_eq!(status.as_deref(), Some("rslvr-in-1:OPERATIONAL"));
    }

    #[tokio::test]
    async fn shared_query_delegates() {
        let query: Arc<dyn StatusQuery> =
            Arc::new(query_fn(|_id: String| async { Ok::<_, BoxError>(None) }));

        let status = query.query_status("gone").await.unwrap();
        assert!(status.is_none());
    }
}
