#![allow(dead_code)]

use oprc_nodeclass::controller::ReconcileDriver;
use oprc_nodeclass::crd::node_class::{
    InstanceProfilesStatus, NodeClass, NodeClassSpec, NodeClassStatus,
};
use oprc_nodeclass::inventory::MemoryInstanceInventory;
use oprc_nodeclass::profile::{
    HashedProfileNamer, MemoryProfileStore, NamingInput, ProfileNamer, Tags,
};

pub const CLUSTER: &str = "it-cluster";
pub const REGION: &str = "ap-southeast-1";
pub const NODE_CLASS: &str = "general";

/// In-memory collaborators shared across reconcile cycles.
#[derive(Clone, Default)]
pub struct Harness {
    pub store: MemoryProfileStore,
    pub inventory: MemoryInstanceInventory,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(&self) -> ReconcileDriver<'_> {
        ReconcileDriver::new(
            &self.store,
            &self.inventory,
            &HashedProfileNamer,
            CLUSTER,
            REGION,
        )
    }
}

/// Name the controller gives the profile created for `role` at `generation`.
pub fn profile_name(role: &str, generation: i64) -> String {
    HashedProfileNamer.name(&NamingInput {
        cluster: CLUSTER,
        region: REGION,
        node_class: NODE_CLASS,
        role,
        generation,
    })
}

pub fn node_class(role: Option<&str>, external: Option<&str>) -> NodeClass {
    NodeClass::new(
        NODE_CLASS,
        NodeClassSpec {
            role: role.map(str::to_string),
            instance_profile: external.map(str::to_string),
            tags: Tags::new(),
        },
    )
}

pub fn with_profiles(
    mut nc: NodeClass,
    current: &str,
    previous: &[&str],
    version: i64,
) -> NodeClass {
    nc.status = Some(NodeClassStatus {
        instance_profile: Some(current.to_string()),
        instance_profiles: Some(InstanceProfilesStatus {
            current: current.to_string(),
            previous: previous.iter().map(|s| s.to_string()).collect(),
            version,
        }),
        ..Default::default()
    });
    nc
}

pub fn profiles(nc: &NodeClass) -> InstanceProfilesStatus {
    nc.status
        .as_ref()
        .and_then(|s| s.instance_profiles.clone())
        .unwrap_or_default()
}
