use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{InstanceInventory, InstanceRef};
use crate::error::InventoryError;

/// In-process instance inventory with per-profile failure injection.
#[derive(Clone, Default)]
pub struct MemoryInstanceInventory {
    instances: Arc<RwLock<Vec<InstanceRef>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    queries: Arc<RwLock<Vec<String>>>,
}

impl MemoryInstanceInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running instance launched with `profile`.
    pub async fn launch(&self, id: &str, profile: &str) {
        self.instances.write().await.push(InstanceRef {
            id: id.to_string(),
            profile_arn: format!(
                "arn:aws:iam::000000000000:instance-profile/{profile}"
            ),
        });
    }

    pub async fn terminate(&self, id: &str) {
        self.instances.write().await.retain(|i| i.id != id);
    }

    pub async fn fail(&self, profile: &str) {
        self.failing.write().await.insert(profile.to_string());
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    /// Profiles queried so far, in call order.
    pub async fn queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl InstanceInventory for MemoryInstanceInventory {
    async fn query(
        &self,
        profile: &str,
    ) -> Result<Vec<InstanceRef>, InventoryError> {
        self.queries.write().await.push(profile.to_string());
        if self.failing.read().await.contains(profile) {
            return Err(InventoryError::Unavailable(format!(
                "injected failure for {profile}"
            )));
        }
        let r = self.instances.read().await;
        Ok(r.iter().filter(|i| i.uses_profile(profile)).cloned().collect())
    }
}
