//! Workflow services between the handlers and the store.
//!
//! - [`transition`]: the Status Transition Engine, sole writer of status.
//! - [`queue`]: the review queue projection.
//!
//! Every store call made here goes through [`bounded`], so a slow or
//! unreachable store surfaces as `UpstreamUnavailable` instead of hanging.

pub mod queue;
pub mod transition;

use std::future::Future;
use std::time::Duration;

use htw_core::error::CoreError;
use htw_db::{with_timeout, StoreResult};

pub use transition::{Outcome, TransitionEngine, TransitionRequest};

/// Await a store call for at most `limit`. Never retries.
///
/// On expiry the future is dropped. A write may already have committed by
/// then; the transition engine re-reads after a timed-out write, other
/// callers see `UpstreamUnavailable` either way.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, CoreError>
where
    F: Future<Output = StoreResult<T>>,
{
    with_timeout(limit, fut).await.map_err(CoreError::from)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use htw_db::StoreError;

    use super::*;

    #[tokio::test]
    async fn slow_call_becomes_upstream_unavailable() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, StoreError>(1)
        };
        let result = bounded(Duration::from_millis(10), slow).await;
        assert_matches!(result, Err(CoreError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn store_errors_are_mapped() {
        let failing = async { Err::<(), _>(StoreError::StaleStatus { entity: "Event", id: 1 }) };
        let result = bounded(Duration::from_secs(1), failing).await;
        assert_matches!(result, Err(CoreError::ConcurrentModification { id: 1, .. }));
    }
}
