use std::fmt;

use thiserror::Error;

/// Failure reported by a [`ProfileStore`](crate::profile::ProfileStore).
#[derive(Error, Debug)]
pub enum ProfileStoreError {
    #[error("instance profile not found: {0}")]
    NotFound(String),

    #[error("instance profile already exists: {0}")]
    AlreadyExists(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl ProfileStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProfileStoreError::NotFound(_))
    }
}

/// Failure reported by an [`InstanceInventory`](crate::inventory::InstanceInventory).
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("inventory unavailable: {0}")]
    Unavailable(String),

    #[error("inventory query rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileOp {
    Get,
    Create,
    Delete,
}

impl fmt::Display for ProfileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileOp::Get => write!(f, "get"),
            ProfileOp::Create => write!(f, "create"),
            ProfileOp::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("{op} instance profile {name}: {source}")]
    Provider {
        op: ProfileOp,
        name: String,
        #[source]
        source: ProfileStoreError,
    },

    #[error("checking instances using profile {name}: {source}")]
    Query {
        name: String,
        #[source]
        source: InventoryError,
    },
}

impl ProfileError {
    pub fn provider(
        op: ProfileOp,
        name: impl Into<String>,
        source: ProfileStoreError,
    ) -> Self {
        ProfileError::Provider {
            op,
            name: name.into(),
            source,
        }
    }

    pub fn query(name: impl Into<String>, source: InventoryError) -> Self {
        ProfileError::Query {
            name: name.into(),
            source,
        }
    }

    /// Profile the failing call was about.
    pub fn profile_name(&self) -> &str {
        match self {
            ProfileError::Provider { name, .. } => name,
            ProfileError::Query { name, .. } => name,
        }
    }
}

/// Failure of one reconcile cycle, tagged with the step that aborted it.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("creating instance profile: {0}")]
    Rotate(#[source] ProfileError),

    #[error("garbage collecting instance profiles: {0}")]
    Collect(#[source] ProfileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_names_operation_and_profile() {
        let err = ProfileError::provider(
            ProfileOp::Create,
            "oaas_42",
            ProfileStoreError::Provider("quota exceeded".into()),
        );
        assert_eq!(err.profile_name(), "oaas_42");
        assert_eq!(
            err.to_string(),
            "create instance profile oaas_42: provider error: quota exceeded"
        );
    }

    #[test]
    fn reconcile_error_prefixes_step() {
        let err = ReconcileError::Collect(ProfileError::query(
            "oaas_7",
            InventoryError::Unavailable("timeout".into()),
        ));
        assert_eq!(
            err.to_string(),
            "garbage collecting instance profiles: checking instances using profile oaas_7: inventory unavailable: timeout"
        );
    }
}
