use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The server-side record of a tenant workspace.
///
/// Instances are addressed by a generated name in a single, fixed namespace.
/// The owner-facing name is carried in `spec.displayName` (and mirrored in the
/// display-name label).
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "workspaces.konflux-ci.dev",
    version = "v1alpha1",
    kind = "InternalWorkspace",
    status = "InternalWorkspaceStatus",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct InternalWorkspaceSpec {
    pub display_name: String,
    pub visibility: InternalWorkspaceVisibility,
    pub owner: Owner,
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum InternalWorkspaceVisibility {
    #[default]
    Private,
    Community,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Owner {
    pub identity: OwnerIdentity,
}

/// Identity claims of the user that owns a workspace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct OwnerIdentity {
    pub subject: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

/// Written exclusively by the workspace reconciler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalWorkspaceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpaceInfo {
    pub name: String,
    #[serde(default)]
    pub is_home: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_cluster: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct OwnerStatus {
    pub username: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub typ: String,
    pub status: String,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// The user-facing workspace, addressed by `(owner, display name)`: its
/// namespace is the owner's username and its name is the display name.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "workspaces.konflux-ci.dev",
    version = "v1alpha1",
    kind = "Workspace",
    status = "WorkspaceStatus",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
pub struct WorkspaceSpec {
    pub visibility: WorkspaceVisibility,
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceVisibility {
    #[default]
    Private,
    Community,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct WorkspaceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

// === impl InternalWorkspaceVisibility ===

impl InternalWorkspaceVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Community => "community",
        }
    }
}

impl fmt::Display for InternalWorkspaceVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<WorkspaceVisibility> for InternalWorkspaceVisibility {
    fn from(v: WorkspaceVisibility) -> Self {
        match v {
            WorkspaceVisibility::Private => Self::Private,
            WorkspaceVisibility::Community => Self::Community,
        }
    }
}

// === impl WorkspaceVisibility ===

impl From<InternalWorkspaceVisibility> for WorkspaceVisibility {
    fn from(v: InternalWorkspaceVisibility) -> Self {
        match v {
            InternalWorkspaceVisibility::Private => Self::Private,
            InternalWorkspaceVisibility::Community => Self::Community,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_serializes_lowercase() {
        let json = serde_json::to_string(&InternalWorkspaceVisibility::Community).unwrap();
        assert_eq!(json, "\"community\"");
        let v: WorkspaceVisibility = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(v, WorkspaceVisibility::Private);
    }

    #[test]
    fn internal_workspace_spec_shape() {
        let spec: InternalWorkspaceSpec = serde_json::from_value(serde_json::json!({
            "displayName": "foo",
            "visibility": "community",
            "owner": { "identity": { "subject": "sub-1", "username": "alice" } },
        }))
        .expect("spec must deserialize");

        assert_eq!(spec.display_name, "foo");
        assert_eq!(spec.visibility, InternalWorkspaceVisibility::Community);
        assert_eq!(spec.owner.identity.username, "alice");
        assert!(spec.owner.identity.email.is_empty());
    }
}
