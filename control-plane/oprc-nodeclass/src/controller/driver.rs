use chrono::Utc;
use kube::ResourceExt;
use tracing::{info, instrument};

use super::gc::GarbageCollector;
use super::role::{RoleReconciler, Rotation};
use super::status::{REASON_EXTERNAL, REASON_MANAGED, mark_profile_ready};
use crate::crd::node_class::NodeClass;
use crate::error::ReconcileError;
use crate::inventory::InstanceInventory;
use crate::profile::{ProfileNamer, ProfileStore};

/// What one reconcile cycle changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// False when the node class points at an externally managed profile.
    pub managed: bool,
    pub rotation: Option<Rotation>,
    /// Retired profiles deleted during this cycle, newest first.
    pub collected: Vec<String>,
}

/// Runs role reconciliation followed by garbage collection for one node
/// class.
///
/// The caller must not run two cycles for the same node class concurrently;
/// the status is borrowed mutably for the whole call and no locking happens
/// here.
pub struct ReconcileDriver<'a> {
    store: &'a dyn ProfileStore,
    inventory: &'a dyn InstanceInventory,
    namer: &'a dyn ProfileNamer,
    cluster: &'a str,
    region: &'a str,
}

impl<'a> ReconcileDriver<'a> {
    pub fn new(
        store: &'a dyn ProfileStore,
        inventory: &'a dyn InstanceInventory,
        namer: &'a dyn ProfileNamer,
        cluster: &'a str,
        region: &'a str,
    ) -> Self {
        Self {
            store,
            inventory,
            namer,
            cluster,
            region,
        }
    }

    /// Reconcile `node_class.status` in place.
    ///
    /// On error the status may hold a partial garbage-collection pass but
    /// never a half-applied rotation, and readiness is not marked. Callers
    /// persist the status only on `Ok`.
    #[instrument(skip_all, fields(node_class = %node_class.name_any()))]
    pub async fn run(
        &self,
        node_class: &mut NodeClass,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let name = node_class.name_any();
        let now = Utc::now().to_rfc3339();
        let spec = &node_class.spec;
        let status = node_class.status.get_or_insert_with(Default::default);

        let role = spec.desired_role();
        if role.is_empty() {
            let external = spec.instance_profile.clone().unwrap_or_default();
            info!(profile = %external, "using externally managed instance profile");
            mark_profile_ready(
                status,
                REASON_EXTERNAL,
                format!("Using instance profile {external}"),
                &now,
            );
            status.instance_profile = Some(external);
            return Ok(ReconcileOutcome::default());
        }

        let profiles = status.instance_profiles.get_or_insert_with(Default::default);

        let rotation = RoleReconciler::new(
            self.store,
            self.namer,
            self.cluster,
            self.region,
        )
        .reconcile(&name, role, &spec.tags, profiles)
        .await
        .map_err(ReconcileError::Rotate)?;
        status.instance_profile = Some(profiles.current.clone());

        let collected = GarbageCollector::new(self.store, self.inventory)
            .collect(profiles)
            .await
            .map_err(ReconcileError::Collect)?;

        let message = format!(
            "Instance profile {} at version {}",
            profiles.current, profiles.version
        );
        mark_profile_ready(status, REASON_MANAGED, message, &now);

        Ok(ReconcileOutcome {
            managed: true,
            rotation,
            collected,
        })
    }
}
