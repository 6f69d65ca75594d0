use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Profile, ProfileStore, Tags};
use crate::error::{ProfileOp, ProfileStoreError};

/// In-process profile store for local runs and tests.
///
/// Failures can be injected per operation and profile name; every call is
/// recorded in order so callers can assert on the I/O pattern.
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, Profile>>>,
    failures: Arc<RwLock<HashSet<(ProfileOp, String)>>>,
    calls: Arc<RwLock<Vec<(ProfileOp, String)>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile bound to `role`, bypassing the call log.
    pub async fn insert(&self, name: &str, role: &str) {
        let mut w = self.profiles.write().await;
        w.insert(
            name.to_string(),
            Profile {
                name: name.to_string(),
                roles: vec![role.to_string()],
                tags: Tags::new(),
            },
        );
    }

    /// Make every `op` on `name` fail until cleared.
    pub async fn fail(&self, op: ProfileOp, name: &str) {
        self.failures.write().await.insert((op, name.to_string()));
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.profiles.read().await.contains_key(name)
    }

    pub async fn profile(&self, name: &str) -> Option<Profile> {
        self.profiles.read().await.get(name).cloned()
    }

    pub async fn calls(&self) -> Vec<(ProfileOp, String)> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, op: ProfileOp) -> usize {
        self.calls.read().await.iter().filter(|(o, _)| *o == op).count()
    }

    async fn record(
        &self,
        op: ProfileOp,
        name: &str,
    ) -> Result<(), ProfileStoreError> {
        self.calls.write().await.push((op, name.to_string()));
        if self.failures.read().await.contains(&(op, name.to_string())) {
            return Err(ProfileStoreError::Provider(format!(
                "injected {op} failure"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, name: &str) -> Result<Profile, ProfileStoreError> {
        self.record(ProfileOp::Get, name).await?;
        self.profiles
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ProfileStoreError::NotFound(name.to_string()))
    }

    async fn create(
        &self,
        name: &str,
        role: &str,
        tags: Tags,
    ) -> Result<(), ProfileStoreError> {
        self.record(ProfileOp::Create, name).await?;
        let mut w = self.profiles.write().await;
        match w.get(name) {
            Some(existing) if existing.bound_role() == Some(role) => Ok(()),
            Some(_) => Err(ProfileStoreError::AlreadyExists(name.to_string())),
            None => {
                w.insert(
                    name.to_string(),
                    Profile {
                        name: name.to_string(),
                        roles: vec![role.to_string()],
                        tags,
                    },
                );
                Ok(())
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<(), ProfileStoreError> {
        self.record(ProfileOp::Delete, name).await?;
        self.profiles.write().await.remove(name);
        Ok(())
    }
}
