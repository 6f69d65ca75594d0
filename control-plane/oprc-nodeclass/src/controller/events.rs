use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder};

use super::driver::ReconcileOutcome;

pub const REASON_ROTATED: &str = "InstanceProfileRotated";
pub const REASON_DELETED: &str = "InstanceProfileDeleted";

pub async fn emit_event(
    recorder: &Recorder,
    obj_ref: &ObjectReference,
    reason: &str,
    action: &str,
    note: Option<String>,
) {
    let _ = recorder
        .publish(
            &Event {
                type_: EventType::Normal,
                reason: reason.into(),
                note,
                action: action.into(),
                secondary: None,
            },
            obj_ref,
        )
        .await;
}

/// Publish one event per rotation and per deleted profile.
pub async fn emit_outcome(
    recorder: &Recorder,
    obj_ref: &ObjectReference,
    outcome: &ReconcileOutcome,
) {
    if let Some(rot) = &outcome.rotation {
        let note = match &rot.from {
            Some(from) => format!(
                "Rotated instance profile {} -> {} (version {})",
                from, rot.to, rot.version
            ),
            None => format!(
                "Created instance profile {} (version {})",
                rot.to, rot.version
            ),
        };
        emit_event(recorder, obj_ref, REASON_ROTATED, "Rotate", Some(note))
            .await;
    }
    for profile in &outcome.collected {
        emit_event(
            recorder,
            obj_ref,
            REASON_DELETED,
            "Delete",
            Some(format!("Deleted unused instance profile {profile}")),
        )
        .await;
    }
}
