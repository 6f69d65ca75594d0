mod memory;

use async_trait::async_trait;

use crate::error::InventoryError;

pub use memory::MemoryInstanceInventory;

/// A live compute instance and the profile it was launched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub id: String,
    pub profile_arn: String,
}

impl InstanceRef {
    /// Whether the instance is bound to `profile`. Profile ARNs carry an
    /// arbitrary path, so only the trailing `/<name>` segment is compared.
    pub fn uses_profile(&self, profile: &str) -> bool {
        self.profile_arn
            .rsplit_once('/')
            .map(|(_, tail)| tail == profile)
            .unwrap_or(false)
    }
}

/// Lookup of running instances by attached profile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceInventory: Send + Sync {
    async fn query(
        &self,
        profile: &str,
    ) -> Result<Vec<InstanceRef>, InventoryError>;
}
