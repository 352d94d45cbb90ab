//! Read-only views of the identity and access-grant resources managed by the
//! toolchain host operator.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Grantee value that matches every authenticated user.
pub const PUBLIC_VIEWER: &str = "kubesaw-authenticated";

/// Maps an authentication subject to a compliant username.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "toolchain.dev.openshift.com",
    version = "v1alpha1",
    kind = "UserSignup",
    status = "UserSignupStatus",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct UserSignupSpec {
    #[serde(default)]
    pub identity_claims: IdentityClaims,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default, rename = "userID", skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preferred_username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSignupStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub compliant_username: String,
}

/// Grants a user a role on a space.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "toolchain.dev.openshift.com",
    version = "v1alpha1",
    kind = "SpaceBinding",
    derive = "PartialEq",
    derive = "Default",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SpaceBindingSpec {
    /// The grantee: a compliant username, or [`PUBLIC_VIEWER`].
    pub master_user_record: String,
    pub space: String,
    pub space_role: String,
}

impl UserSignup {
    /// Returns the compliant username, if the signup has been approved.
    pub fn compliant_username(&self) -> Option<&str> {
        self.status
            .as_ref()
            .map(|s| s.compliant_username.as_str())
            .filter(|name| !name.is_empty())
    }
}
