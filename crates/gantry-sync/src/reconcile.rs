//! Generic reconciliation
//!
//! One algorithm for every entity kind: fetch the remote collection, update
//! remote entities whose natural key matches a declared entity (a full
//! replace, not a patch), create declared entities with no remote match, and
//! leave unmatched remote entities alone; reconciliation never deletes.
//!
//! Per-kind behavior plugs in through [`EntitySync`]; updates and creates are
//! issued through a [`TaskGroup`] sized by the caller's concurrency limit,
//! and the first error observed by the group aborts the reconciliation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::group::TaskGroup;

/// Per-entity-kind operations the reconciler drives
#[async_trait]
pub trait EntitySync: Send + Sync + 'static {
    /// Declared (desired) representation
    type Declared: Clone + Send + Sync + 'static;
    /// Remote (current) representation
    type Remote: Send + Sync + 'static;

    /// Entity kind, for logs and error context
    fn kind(&self) -> &'static str;

    /// Extract a remote entity's natural key
    fn natural_key(&self, remote: &Self::Remote) -> String;

    /// Fetch the full remote collection for the current scope
    async fn fetch(&self) -> Result<Vec<Self::Remote>>;

    /// Replace a matched remote entity's attributes with the declared ones
    async fn update(&self, remote: Self::Remote, declared: Self::Declared) -> Result<()>;

    /// Create a declared entity that has no remote match
    async fn create(&self, key: String, declared: Self::Declared) -> Result<()>;
}

/// Counts of what a reconciliation pass issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Declared entities created remotely
    pub created: usize,
    /// Remote entities updated from their declared match
    pub updated: usize,
    /// Remote entities with no declared match, left untouched
    pub unmatched: usize,
    /// Declared entities skipped for an empty natural key
    pub skipped: usize,
}

/// Reconcile a declared collection against the remote collection.
///
/// `max_concurrency` sizes the task group updates and creates are issued
/// through; the group's first error wins and is returned in place of the
/// report.
pub async fn reconcile<S: EntitySync>(
    sync: Arc<S>,
    declared: &BTreeMap<String, S::Declared>,
    max_concurrency: usize,
) -> Result<ReconcileReport> {
    let kind = sync.kind();
    let remote = sync.fetch().await?;
    debug!(
        kind,
        declared = declared.len(),
        remote = remote.len(),
        "reconciling"
    );

    let mut report = ReconcileReport::default();
    let mut found: HashSet<String> = HashSet::new();
    let mut group = TaskGroup::new(max_concurrency);

    for entity in remote {
        let key = sync.natural_key(&entity);
        match declared.get(&key) {
            Some(d) if !key.is_empty() => {
                found.insert(key.clone());
                report.updated += 1;

                let sync = sync.clone();
                let declared = d.clone();
                group
                    .submit(async move {
                        let key = sync.natural_key(&entity);
                        sync.update(entity, declared)
                            .await
                            .map_err(|e| SyncError::entity(sync.kind(), key, e))
                    })
                    .await;
            }
            _ => {
                // No declared match: left untouched, never deleted.
                debug!(kind, key, "remote entity not declared, leaving as is");
                report.unmatched += 1;
            }
        }
    }

    for (key, d) in declared {
        if found.contains(key) {
            continue;
        }
        if key.is_empty() {
            warn!(kind, "declared entity has an empty natural key, skipping");
            report.skipped += 1;
            continue;
        }
        report.created += 1;

        let sync = sync.clone();
        let key = key.clone();
        let declared = d.clone();
        group
            .submit(async move {
                sync.create(key.clone(), declared)
                    .await
                    .map_err(|e| SyncError::entity(sync.kind(), key, e))
            })
            .await;
    }

    group.wait().await?;
    debug!(
        kind,
        created = report.created,
        updated = report.updated,
        unmatched = report.unmatched,
        "reconciled"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Remote entity for tests: a key plus an opaque id
    #[derive(Debug, Clone)]
    struct FakeRemote {
        id: String,
        key: String,
        value: String,
    }

    #[derive(Default)]
    struct FakeSync {
        remote: Vec<FakeRemote>,
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl FakeSync {
        fn with_remote(remote: Vec<FakeRemote>) -> Self {
            Self {
                remote,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EntitySync for FakeSync {
        type Declared = String;
        type Remote = FakeRemote;

        fn kind(&self) -> &'static str {
            "fake"
        }

        fn natural_key(&self, remote: &FakeRemote) -> String {
            remote.key.clone()
        }

        async fn fetch(&self) -> Result<Vec<FakeRemote>> {
            Ok(self.remote.clone())
        }

        async fn update(&self, remote: FakeRemote, declared: String) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("update {} {}", remote.id, declared));
            if self.fail_on.as_deref() == Some(remote.key.as_str()) {
                return Err(SyncError::TaskPanicked("update failed".to_string()));
            }
            Ok(())
        }

        async fn create(&self, key: String, declared: String) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create {} {}", key, declared));
            if self.fail_on.as_deref() == Some(key.as_str()) {
                return Err(SyncError::TaskPanicked("create failed".to_string()));
            }
            Ok(())
        }
    }

    fn declared(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_missing_remote_entity_is_created() {
        let sync = Arc::new(FakeSync::with_remote(vec![]));
        let report = reconcile(sync.clone(), &declared(&[("en-US", "X")]), 1)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(sync.calls(), vec!["create en-US X"]);
    }

    #[tokio::test]
    async fn test_matched_remote_entity_is_updated() {
        let sync = Arc::new(FakeSync::with_remote(vec![FakeRemote {
            id: "r1".to_string(),
            key: "en-US".to_string(),
            value: "old".to_string(),
        }]));
        let report = reconcile(sync.clone(), &declared(&[("en-US", "X")]), 1)
            .await
            .unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(sync.calls(), vec!["update r1 X"]);
    }

    #[tokio::test]
    async fn test_unmatched_remote_entity_never_touched() {
        let sync = Arc::new(FakeSync::with_remote(vec![
            FakeRemote {
                id: "r1".to_string(),
                key: "en-US".to_string(),
                value: "old".to_string(),
            },
            FakeRemote {
                id: "r2".to_string(),
                key: "de-DE".to_string(),
                value: "alt".to_string(),
            },
        ]));
        let report = reconcile(sync.clone(), &declared(&[("en-US", "X")]), 1)
            .await
            .unwrap();

        assert_eq!(report.unmatched, 1);
        // r2 appears in no mutating call
        assert_eq!(sync.calls(), vec!["update r1 X"]);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        // First run created en-US; model the second run's remote state as the
        // result of the first.
        let sync = Arc::new(FakeSync::with_remote(vec![FakeRemote {
            id: "r1".to_string(),
            key: "en-US".to_string(),
            value: "X".to_string(),
        }]));
        let report = reconcile(sync.clone(), &declared(&[("en-US", "X")]), 1)
            .await
            .unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(sync.calls(), vec!["update r1 X"]);
        assert_eq!(sync.remote[0].value, "X");
    }

    #[tokio::test]
    async fn test_empty_key_skipped_with_warning() {
        let sync = Arc::new(FakeSync::with_remote(vec![]));
        let report = reconcile(sync.clone(), &declared(&[("", "X"), ("en-US", "Y")]), 1)
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 1);
        assert_eq!(sync.calls(), vec!["create en-US Y"]);
    }

    #[tokio::test]
    async fn test_zero_declared_is_noop_after_fetch() {
        let sync = Arc::new(FakeSync::with_remote(vec![FakeRemote {
            id: "r1".to_string(),
            key: "en-US".to_string(),
            value: "old".to_string(),
        }]));
        let report = reconcile(sync.clone(), &BTreeMap::new(), 1).await.unwrap();

        assert_eq!(report.unmatched, 1);
        assert!(sync.calls().is_empty());
    }

    #[tokio::test]
    async fn test_error_carries_entity_context() {
        let sync = Arc::new(FakeSync {
            remote: vec![],
            fail_on: Some("en-US".to_string()),
            ..Default::default()
        });

        let err = reconcile(sync, &declared(&[("en-US", "X")]), 1)
            .await
            .unwrap_err();
        match err {
            SyncError::Entity { kind, key, .. } => {
                assert_eq!(kind, "fake");
                assert_eq!(key, "en-US");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_serial_failure_stops_later_work() {
        // Two creates, the first fails; with a serial group the second is
        // never executed.
        let sync = Arc::new(FakeSync {
            remote: vec![],
            fail_on: Some("a".to_string()),
            ..Default::default()
        });

        let err = reconcile(sync.clone(), &declared(&[("a", "1"), ("b", "2")]), 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'a'"));
        assert_eq!(sync.calls(), vec!["create a 1"]);
    }
}
