use sha2::{Digest, Sha256};

use super::Tags;

pub const TAG_NODE_CLASS: &str = "oaas.io/nodeclass";
pub const TAG_MANAGED_BY: &str = "oaas.io/managed-by";
pub const TAG_REGION: &str = "topology.kubernetes.io/region";

/// Inputs that identify one generation of a node class's profile.
#[derive(Debug, Clone, Copy)]
pub struct NamingInput<'a> {
    pub cluster: &'a str,
    pub region: &'a str,
    pub node_class: &'a str,
    /// Role the profile will be bound to.
    pub role: &'a str,
    /// Rotation version the profile is created for.
    pub generation: i64,
}

/// Deterministic naming and tagging for managed profiles. Implementations
/// must be pure: the same input always yields the same name, so a rotation
/// retried after a failed create targets the same profile. Inputs that differ
/// in role must yield different names, since a profile's role is fixed once
/// created.
pub trait ProfileNamer: Send + Sync {
    fn name(&self, input: &NamingInput<'_>) -> String;

    fn tags(&self, input: &NamingInput<'_>, extra: &Tags) -> Tags;
}

/// `<cluster>_<digest>` names where the digest covers region, node class,
/// role and generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedProfileNamer;

impl ProfileNamer for HashedProfileNamer {
    fn name(&self, input: &NamingInput<'_>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.region.as_bytes());
        hasher.update(b"/");
        hasher.update(input.node_class.as_bytes());
        hasher.update(b"/");
        hasher.update(input.role.as_bytes());
        hasher.update(b"/");
        hasher.update(input.generation.to_be_bytes());
        let digest = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        format!("{}_{}", input.cluster, u64::from_be_bytes(prefix))
    }

    fn tags(&self, input: &NamingInput<'_>, extra: &Tags) -> Tags {
        let mut tags = extra.clone();
        tags.insert(
            format!("kubernetes.io/cluster/{}", input.cluster),
            "owned".into(),
        );
        tags.insert(TAG_MANAGED_BY.into(), input.cluster.into());
        tags.insert(TAG_NODE_CLASS.into(), input.node_class.into());
        tags.insert(TAG_REGION.into(), input.region.into());
        tags
    }
}
