use tracing::{debug, trace};

use crate::crd::node_class::{
    Condition, ConditionStatus, ConditionType, NodeClassStatus,
};

pub const REASON_MANAGED: &str = "Managed";
pub const REASON_EXTERNAL: &str = "ExternalProfile";

/// Mark `InstanceProfileReady=True` on `status`.
pub fn mark_profile_ready(
    status: &mut NodeClassStatus,
    reason: &str,
    message: String,
    now: &str,
) {
    let cond = Condition {
        type_: ConditionType::InstanceProfileReady,
        status: ConditionStatus::True,
        reason: Some(reason.into()),
        message: Some(message),
        last_transition_time: Some(now.to_string()),
    };
    let existing = status.conditions.take().unwrap_or_default();
    status.conditions = Some(upsert_conditions(existing, vec![cond]));
}

/// Upsert `incoming` by condition type. A condition whose status did not flip
/// keeps its previous `lastTransitionTime`.
pub fn upsert_conditions(
    existing: Vec<Condition>,
    incoming: Vec<Condition>,
) -> Vec<Condition> {
    let mut out = existing;
    for mut inc in incoming {
        if let Some(idx) = out.iter().position(|c| c.type_ == inc.type_) {
            if out[idx].status == inc.status
                && out[idx].last_transition_time.is_some()
            {
                inc.last_transition_time =
                    out[idx].last_transition_time.clone();
            }
            out[idx] = inc;
        } else {
            out.push(inc);
        }
    }
    out.sort_by_key(|c| cond_rank(&c.type_));
    out
}

fn cond_rank(t: &ConditionType) -> u8 {
    match t {
        ConditionType::InstanceProfileReady => 0,
        ConditionType::Unknown => 250,
    }
}

/// Whether persisting `desired` would change anything beyond bookkeeping:
/// `lastUpdated`, `observedGeneration` and condition transition times are
/// ignored.
pub fn should_patch_status(
    current: Option<&NodeClassStatus>,
    desired: &NodeClassStatus,
) -> bool {
    let Some(current) = current else {
        debug!("node class has no status yet");
        return true;
    };
    let changed = without_bookkeeping(current) != without_bookkeeping(desired);
    if changed {
        debug!(
            profile = ?desired.instance_profile,
            profiles = ?desired.instance_profiles,
            "node class status changed"
        );
    } else {
        trace!("node class status unchanged");
    }
    changed
}

fn without_bookkeeping(s: &NodeClassStatus) -> NodeClassStatus {
    let mut s = s.clone();
    s.last_updated = None;
    s.observed_generation = None;
    for c in s.conditions.iter_mut().flatten() {
        c.last_transition_time = None;
    }
    s
}
