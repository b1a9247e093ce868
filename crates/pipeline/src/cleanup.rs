//! Compensating actions run after a primary operation.
//!
//! Every action is independently fallible and independently logged. A
//! failure is recorded in the [`CleanupReport`] and never propagated, so
//! cleanup cannot block the operation it follows.

use futures::stream::{self, StreamExt};
use vidhub_cloud::{StorageGateway, TranscodingGateway};

/// Worker count for bulk cleanup against the object store.
pub const BULK_CLEANUP_CONCURRENCY: usize = 4;

/// One best-effort external deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    DeleteObject(String),
    DeleteAsset(String),
}

/// Outcome of running a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub attempted: usize,
    pub failed: Vec<Compensation>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An ordered list of compensating actions.
#[derive(Debug, Clone, Default)]
pub struct CleanupPlan {
    actions: Vec<Compensation>,
}

impl CleanupPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete_object(mut self, key: impl Into<String>) -> Self {
        self.actions.push(Compensation::DeleteObject(key.into()));
        self
    }

    pub fn delete_asset(mut self, asset_id: impl Into<String>) -> Self {
        self.actions.push(Compensation::DeleteAsset(asset_id.into()));
        self
    }

    pub fn delete_objects(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.actions
            .extend(keys.into_iter().map(Compensation::DeleteObject));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[Compensation] {
        &self.actions
    }

    /// Run every action sequentially, in insertion order.
    pub async fn run_in_order(
        self,
        storage: &dyn StorageGateway,
        transcoder: &dyn TranscodingGateway,
    ) -> CleanupReport {
        let mut report = CleanupReport::default();
        for action in self.actions {
            report.attempted += 1;
            if !execute(&action, storage, transcoder).await {
                report.failed.push(action);
            }
        }
        report
    }

    /// Run actions with at most `limit` in flight.
    pub async fn run_bounded(
        self,
        storage: &dyn StorageGateway,
        transcoder: &dyn TranscodingGateway,
        limit: usize,
    ) -> CleanupReport {
        let attempted = self.actions.len();
        let failed: Vec<Compensation> = stream::iter(self.actions)
            .map(|action| async move {
                let ok = execute(&action, storage, transcoder).await;
                (!ok).then_some(action)
            })
            .buffer_unordered(limit.max(1))
            .filter_map(|failed| async move { failed })
            .collect()
            .await;

        CleanupReport { attempted, failed }
    }
}

async fn execute(
    action: &Compensation,
    storage: &dyn StorageGateway,
    transcoder: &dyn TranscodingGateway,
) -> bool {
    match action {
        Compensation::DeleteObject(key) => match storage.delete_object(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to delete object during cleanup");
                false
            }
        },
        Compensation::DeleteAsset(asset_id) => match transcoder.delete_asset(asset_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    asset_id = %asset_id,
                    error = %e,
                    "Failed to delete remote asset during cleanup",
                );
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use vidhub_cloud::memory::{FakeTranscoder, InMemoryStorage};
    use vidhub_cloud::StorageGateway;

    use super::*;

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let storage = InMemoryStorage::new();
        let transcoder = FakeTranscoder::new();
        storage
            .put_object("thumbnails/normal/a.png", Bytes::from_static(&[1]), "image/png").await.unwrap();
        transcoder.fail_deletes(true);

        let report = CleanupPlan::new()
            .delete_asset("asset-1")
            .delete_object("thumbnails/normal/a.png")
            .run_in_order(&storage, &transcoder)
            .await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, vec![Compensation::DeleteAsset("asset-1".into())]);
        assert!(!storage.contains("thumbnails/normal/a.png"));
    }

    #[tokio::test]
    async fn bounded_run_deletes_everything() {
        let storage = InMemoryStorage::new();
        let transcoder = FakeTranscoder::new();
        let keys: Vec<String> = (0..9).map(|i| format!("posts/{i}.png")).collect();
        for key in &keys {
            storage.put_object(key, Bytes::from_static(&[0]), "image/png").await.unwrap();
        }

        let report = CleanupPlan::new()
            .delete_objects(keys.clone())
            .run_bounded(&storage, &transcoder, BULK_CLEANUP_CONCURRENCY)
            .await;

        assert!(report.is_clean());
        assert_eq!(report.attempted, 9);
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn empty_plan_is_a_no_op() {
        let report = CleanupPlan::new()
            .run_in_order(&InMemoryStorage::new(), &FakeTranscoder::new())
            .await;
        assert_eq!(report, CleanupReport::default());
    }
}
