use tracing::{debug, info, instrument};

use crate::crd::node_class::InstanceProfilesStatus;
use crate::error::{ProfileError, ProfileOp};
use crate::inventory::InstanceInventory;
use crate::profile::ProfileStore;

/// Reclaims retired profiles that no live instance references anymore.
pub struct GarbageCollector<'a> {
    store: &'a dyn ProfileStore,
    inventory: &'a dyn InstanceInventory,
}

impl<'a> GarbageCollector<'a> {
    pub fn new(
        store: &'a dyn ProfileStore,
        inventory: &'a dyn InstanceInventory,
    ) -> Self {
        Self { store, inventory }
    }

    /// Walk `state.previous` newest to oldest, deleting every profile with no
    /// bound instances and dropping it from the history. Returns the removed
    /// names.
    ///
    /// The first failing query or delete ends the pass. Removals made before
    /// it stay applied to `state`; the failing entry and everything older are
    /// untouched and get another look on the next reconcile.
    #[instrument(skip_all, fields(retired = state.previous.len()))]
    pub async fn collect(
        &self,
        state: &mut InstanceProfilesStatus,
    ) -> Result<Vec<String>, ProfileError> {
        let mut removed = Vec::new();
        // Only index `i` is ever removed, so indices below it stay valid.
        for i in (0..state.previous.len()).rev() {
            let profile = state.previous[i].clone();
            let instances = self
                .inventory
                .query(&profile)
                .await
                .map_err(|e| ProfileError::query(&profile, e))?;
            if !instances.is_empty() {
                debug!(%profile, in_use = instances.len(), "retired profile still in use");
                continue;
            }
            self.store
                .delete(&profile)
                .await
                .map_err(|e| ProfileError::provider(ProfileOp::Delete, &profile, e))?;
            state.previous.remove(i);
            info!(%profile, "deleted unused instance profile");
            removed.push(profile);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InventoryError;
    use crate::inventory::{
        InstanceRef, MemoryInstanceInventory, MockInstanceInventory,
    };
    use crate::profile::{MemoryProfileStore, MockProfileStore, Tags};

    fn state(previous: &[&str]) -> InstanceProfilesStatus {
        InstanceProfilesStatus {
            current: "live".into(),
            previous: previous.iter().map(|s| s.to_string()).collect(),
            version: previous.len() as i64 + 1,
        }
    }

    async fn seeded(names: &[&str]) -> MemoryProfileStore {
        let store = MemoryProfileStore::new();
        for n in names {
            store.create(n, "role", Tags::new()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn empty_history_makes_no_calls() {
        let store = MockProfileStore::new();
        let inv = MockInstanceInventory::new();
        let gc = GarbageCollector::new(&store, &inv);
        let mut st = state(&[]);
        assert!(gc.collect(&mut st).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removes_exactly_the_unreferenced_entries() {
        let store = seeded(&["p1", "p2", "p3"]).await;
        let inv = MemoryInstanceInventory::new();
        inv.launch("i-1", "p2").await;
        let gc = GarbageCollector::new(&store, &inv);
        let mut st = state(&["p1", "p2", "p3"]);

        let removed = gc.collect(&mut st).await.unwrap();
        assert_eq!(removed, vec!["p3", "p1"]);
        assert_eq!(st.previous, vec!["p2"]);
        assert!(store.contains("p2").await);
        assert!(!store.contains("p1").await);
        assert!(!store.contains("p3").await);
        assert_eq!(st.version, 4, "collection never touches the version");
        assert_eq!(st.current, "live");
    }

    #[tokio::test]
    async fn walks_newest_first() {
        let store = seeded(&["p1", "p2", "p3"]).await;
        let inv = MemoryInstanceInventory::new();
        let gc = GarbageCollector::new(&store, &inv);
        let mut st = state(&["p1", "p2", "p3"]);
        gc.collect(&mut st).await.unwrap();
        assert_eq!(inv.queries().await, vec!["p3", "p2", "p1"]);
        assert!(st.previous.is_empty());
    }

    #[tokio::test]
    async fn query_failure_keeps_earlier_removals() {
        let store = seeded(&["p1", "p2", "p3", "p4"]).await;
        let inv = MemoryInstanceInventory::new();
        inv.fail("p2").await;
        let gc = GarbageCollector::new(&store, &inv);
        let mut st = state(&["p1", "p2", "p3", "p4"]);

        let err = gc.collect(&mut st).await.unwrap_err();
        assert!(matches!(err, ProfileError::Query { ref name, .. } if name == "p2"));
        // p4 and p3 went first; p2 failed; p1 was never visited
        assert_eq!(st.previous, vec!["p1", "p2"]);
        assert_eq!(inv.queries().await, vec!["p4", "p3", "p2"]);
        assert!(store.contains("p1").await);
        assert!(store.contains("p2").await);
    }

    #[tokio::test]
    async fn delete_failure_aborts_and_keeps_entry() {
        let store = seeded(&["p1", "p2"]).await;
        store.fail(ProfileOp::Delete, "p2").await;
        let inv = MemoryInstanceInventory::new();
        let gc = GarbageCollector::new(&store, &inv);
        let mut st = state(&["p1", "p2"]);

        let err = gc.collect(&mut st).await.unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Provider { op: ProfileOp::Delete, .. }
        ));
        assert_eq!(st.previous, vec!["p1", "p2"]);
        assert_eq!(inv.queries().await, vec!["p2"]);

        // next pass picks up where it left off
        store.clear_failures().await;
        let removed = gc.collect(&mut st).await.unwrap();
        assert_eq!(removed, vec!["p2", "p1"]);
        assert!(st.previous.is_empty());
    }

    #[tokio::test]
    async fn referenced_entries_are_never_deleted() {
        let mut store = MockProfileStore::new();
        store.expect_delete().times(0);
        let mut inv = MockInstanceInventory::new();
        inv.expect_query().times(2).returning(|p| {
            Ok(vec![InstanceRef {
                id: "i-1".into(),
                profile_arn: format!("arn:aws:iam::1:instance-profile/{p}"),
            }])
        });
        let gc = GarbageCollector::new(&store, &inv);
        let mut st = state(&["p1", "p2"]);
        assert!(gc.collect(&mut st).await.unwrap().is_empty());
        assert_eq!(st.previous, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn mock_query_error_is_wrapped_with_profile() {
        let store = MockProfileStore::new();
        let mut inv = MockInstanceInventory::new();
        inv.expect_query()
            .times(1)
            .returning(|_| Err(InventoryError::Rejected("bad filter".into())));
        let gc = GarbageCollector::new(&store, &inv);
        let mut st = state(&["p1"]);
        let err = gc.collect(&mut st).await.unwrap_err();
        assert_eq!(err.profile_name(), "p1");
        assert_eq!(st.previous, vec!["p1"]);
    }
}
