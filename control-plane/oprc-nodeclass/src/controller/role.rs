use tracing::{debug, info, instrument};

use crate::crd::node_class::InstanceProfilesStatus;
use crate::error::{ProfileError, ProfileOp};
use crate::profile::{NamingInput, ProfileNamer, ProfileStore, Tags};

/// A committed profile rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    /// Profile that was current before the rotation, if any.
    pub from: Option<String>,
    pub to: String,
    pub version: i64,
}

/// Detects role drift on the current profile and rotates to a new one.
pub struct RoleReconciler<'a> {
    store: &'a dyn ProfileStore,
    namer: &'a dyn ProfileNamer,
    cluster: &'a str,
    region: &'a str,
}

impl<'a> RoleReconciler<'a> {
    pub fn new(
        store: &'a dyn ProfileStore,
        namer: &'a dyn ProfileNamer,
        cluster: &'a str,
        region: &'a str,
    ) -> Self {
        Self {
            store,
            namer,
            cluster,
            region,
        }
    }

    /// Bring `state` in line with `desired_role`.
    ///
    /// An empty role means the node class uses an external profile and the
    /// store is never touched. On a failed create `state` is left exactly as
    /// it was.
    #[instrument(skip_all, fields(node_class = %node_class, role = %desired_role))]
    pub async fn reconcile(
        &self,
        node_class: &str,
        desired_role: &str,
        extra_tags: &Tags,
        state: &mut InstanceProfilesStatus,
    ) -> Result<Option<Rotation>, ProfileError> {
        if desired_role.is_empty() {
            return Ok(None);
        }

        let bound = self.bound_role(&state.current).await;
        if bound.as_deref() == Some(desired_role) {
            debug!(profile = %state.current, "role binding up to date");
            return Ok(None);
        }

        let naming = NamingInput {
            cluster: self.cluster,
            region: self.region,
            node_class,
            role: desired_role,
            generation: state.next_version(),
        };
        let name = self.namer.name(&naming);
        let tags = self.namer.tags(&naming, extra_tags);
        info!(
            profile = %name,
            current = %state.current,
            bound = ?bound,
            "role drift detected; creating instance profile"
        );
        self.store
            .create(&name, desired_role, tags)
            .await
            .map_err(|e| ProfileError::provider(ProfileOp::Create, &name, e))?;

        let from = state.has_current().then(|| state.current.clone());
        state.rotate(name.clone());
        info!(profile = %name, version = state.version, "instance profile rotated");
        Ok(Some(Rotation {
            from,
            to: name,
            version: state.version,
        }))
    }

    /// Role bound to `profile`. Any lookup failure reads as "no binding" so a
    /// provider read outage cannot hold back a needed rotation.
    async fn bound_role(&self, profile: &str) -> Option<String> {
        if profile.is_empty() {
            return None;
        }
        match self.store.get(profile).await {
            Ok(p) => p.bound_role().map(str::to_string),
            Err(e) => {
                debug!(%profile, error = %e, "profile lookup failed; treating as unbound");
                None
            }
        }
    }
}
