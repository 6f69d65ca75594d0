//! Instance profile collaborators: the provider-side store and the naming
//! function used when a node class needs a fresh profile.

mod memory;
mod naming;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::ProfileStoreError;

pub use memory::MemoryProfileStore;
pub use naming::{HashedProfileNamer, NamingInput, ProfileNamer};

pub type Tags = BTreeMap<String, String>;

/// An instance profile as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub name: String,
    /// Roles attached to the profile. Providers allow at most one, so the
    /// first entry is the effective binding.
    pub roles: Vec<String>,
    pub tags: Tags,
}

impl Profile {
    pub fn bound_role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }
}

/// Access to the identity provider's instance profiles.
///
/// `create` must be safe to call again with the same arguments after an
/// earlier failure; `delete` of an unknown profile should succeed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Profile, ProfileStoreError>;

    async fn create(
        &self,
        name: &str,
        role: &str,
        tags: Tags,
    ) -> Result<(), ProfileStoreError>;

    async fn delete(&self, name: &str) -> Result<(), ProfileStoreError>;
}
