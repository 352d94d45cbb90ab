//! Each verb is its own capability so that a backend only implements the
//! operations it actually supports.

use crate::{ListOptions, Result};
use workspaces_server_k8s_api::Workspace;

/// Lists the workspaces visible to a user.
#[async_trait::async_trait]
pub trait ListUserWorkspaces {
    async fn list_user_workspaces(&self, user: &str, opts: &ListOptions)
        -> Result<Vec<Workspace>>;
}

/// Reads a single workspace, addressed by owner and name, as a user.
#[async_trait::async_trait]
pub trait ReadUserWorkspace {
    async fn read_user_workspace(&self, user: &str, owner: &str, name: &str) -> Result<Workspace>;
}

/// Creates a workspace on behalf of a user.
///
/// The workspace is created in the user's own namespace; a request naming any
/// other namespace is rejected. Creating a second workspace with the same
/// display name fails with `Error::AlreadyExists`.
///
/// On success `workspace` is overwritten with the created object, including
/// its server-assigned generation.
#[async_trait::async_trait]
pub trait CreateUserWorkspace {
    async fn create_user_workspace(&self, user: &str, workspace: &mut Workspace) -> Result<()>;
}

/// Updates a workspace on behalf of a user.
///
/// `workspace` must carry the generation the user last read. On success it is
/// overwritten with the updated object.
#[async_trait::async_trait]
pub trait UpdateUserWorkspace {
    async fn update_user_workspace(&self, user: &str, workspace: &mut Workspace) -> Result<()>;
}
