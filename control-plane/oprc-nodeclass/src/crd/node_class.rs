use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "oaas.io",
    version = "v1alpha1",
    kind = "NodeClass",
    plural = "nodeclasses",
    status = "NodeClassStatus"
)]
pub struct NodeClassSpec {
    /// Role the controller binds to a managed instance profile. When empty the
    /// node class launches with `instance_profile` instead and no profile is
    /// managed for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Externally managed instance profile, used only when `role` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_profile: Option<String>,
    /// Extra tags applied to every profile created for this node class.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl NodeClassSpec {
    /// Desired role, with an empty string meaning "not managed".
    pub fn desired_role(&self) -> &str {
        self.role.as_deref().unwrap_or("")
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
pub struct NodeClassStatus {
    /// Profile instances of this node class are launched with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_profile: Option<String>,
    /// Rotation record for the managed profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_profiles: Option<InstanceProfilesStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

/// Rotation history of the managed instance profile.
///
/// `current` never appears in `previous`, `previous` is ordered oldest first,
/// and `version` moves by exactly one per rotation. Garbage collection only
/// ever shrinks `previous`.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq, Eq)]
pub struct InstanceProfilesStatus {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub previous: Vec<String>,
    #[serde(default)]
    pub version: i64,
}

impl InstanceProfilesStatus {
    pub fn has_current(&self) -> bool {
        !self.current.is_empty()
    }

    /// Version the next rotation will produce.
    pub fn next_version(&self) -> i64 {
        self.version + 1
    }

    /// Commit a rotation to `profile`, retiring the current profile.
    pub fn rotate(&mut self, profile: String) {
        self.version += 1;
        if self.has_current() && self.current != profile {
            let retired = std::mem::take(&mut self.current);
            self.previous.push(retired);
        }
        self.previous.retain(|p| *p != profile);
        self.current = profile;
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: ConditionType,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        rename = "lastTransitionTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_transition_time: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionType {
    InstanceProfileReady,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rotation_has_nothing_to_retire() {
        let mut st = InstanceProfilesStatus::default();
        st.rotate("p1".into());
        assert_eq!(st.current, "p1");
        assert!(st.previous.is_empty());
        assert_eq!(st.version, 1);
    }

    #[test]
    fn rotation_retires_current_at_the_end() {
        let mut st = InstanceProfilesStatus {
            current: "p2".into(),
            previous: vec!["p0".into(), "p1".into()],
            version: 2,
        };
        st.rotate("p3".into());
        assert_eq!(st.current, "p3");
        assert_eq!(st.previous, vec!["p0", "p1", "p2"]);
        assert_eq!(st.version, 3);
    }

    #[test]
    fn rotating_onto_same_name_never_retires_it() {
        let mut st = InstanceProfilesStatus {
            current: "p1".into(),
            previous: vec![],
            version: 1,
        };
        st.rotate("p1".into());
        assert_eq!(st.current, "p1");
        assert!(st.previous.is_empty());
        assert_eq!(st.version, 2);
    }

    #[test]
    fn rotating_back_to_a_retired_name_pulls_it_out_of_history() {
        let mut st = InstanceProfilesStatus {
            current: "p2".into(),
            previous: vec!["p1".into()],
            version: 2,
        };
        st.rotate("p1".into());
        assert_eq!(st.current, "p1");
        assert_eq!(st.previous, vec!["p2"]);
    }

    #[test]
    fn status_deserializes_with_missing_fields() {
        let st: InstanceProfilesStatus =
            serde_json::from_value(serde_json::json!({"current": "p1"}))
                .unwrap();
        assert_eq!(st.current, "p1");
        assert!(st.previous.is_empty());
        assert_eq!(st.version, 0);
    }

    #[test]
    fn desired_role_defaults_to_empty() {
        let spec = NodeClassSpec {
            role: None,
            instance_profile: Some("ext".into()),
            tags: BTreeMap::new(),
        };
        assert_eq!(spec.desired_role(), "");
    }
}
