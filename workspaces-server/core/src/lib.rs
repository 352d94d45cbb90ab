#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod error;
pub mod verbs;

pub use self::{
    error::{Error, Result},
    verbs::{CreateUserWorkspace, ListUserWorkspaces, ReadUserWorkspace, UpdateUserWorkspace},
};
use std::fmt;
use workspaces_server_k8s_api::labels::Selector;

/// The name reserved for a user's home workspace.
pub const HOME_WORKSPACE: &str = "default";

/// Addresses a workspace as its owner sees it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceKey {
    pub owner: String,
    pub name: String,
}

/// Request-shaped filtering for list calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Restricts results to workspaces owned by this user.
    pub namespace: Option<String>,
    pub label_selector: Selector,
}

// === impl SpaceKey ===

impl SpaceKey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SpaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
