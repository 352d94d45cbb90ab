#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use workspaces_server_core as core;
pub use workspaces_server_k8s_access as access;
pub use workspaces_server_k8s_api as k8s;
pub use workspaces_server_k8s_index as index;

mod args;

pub use self::args::Args;

use self::{
    access::{
        AuthorizedQuery, IdentityResolver, Impersonator, ReadModel, WorkspaceWriter, WriteModel,
    },
    core::{
        CreateUserWorkspace, ListOptions, ListUserWorkspaces, ReadUserWorkspace, Result,
        UpdateUserWorkspace,
    },
    index::{CacheConfig, ResourceCache},
    k8s::Workspace,
};

/// Serves every workspace verb from a single cache.
///
/// Handed to the transport layer once the cache has synced.
#[derive(Clone, Debug)]
pub struct Backend<W = Impersonator> {
    read: ReadModel,
    write: WriteModel<W>,
    identity: IdentityResolver,
}

// === impl Backend ===

impl<W> Backend<W> {
    pub fn new(cache: ResourceCache, config: &CacheConfig, writer: W) -> Self {
        let query = AuthorizedQuery::new(cache.clone(), config);
        let identity = IdentityResolver::new(cache, config);
        Self {
            read: ReadModel::new(query.clone()),
            write: WriteModel::new(
                writer,
                query,
                identity.clone(),
                config.workspaces_namespace.clone(),
            ),
            identity,
        }
    }

    /// Resolves an authenticated subject to the username that every other
    /// operation expects.
    pub fn resolve_user(&self, subject: &str) -> Result<String> {
        self.identity.compliant_username(subject)
    }
}

#[async_trait::async_trait]
impl<W: Send + Sync> ListUserWorkspaces for Backend<W> {
    async fn list_user_workspaces(&self, user: &str, opts: &ListOptions) -> Result<Vec<Workspace>> {
        self.read.list_user_workspaces(user, opts).await
    }
}

#[async_trait::async_trait]
impl<W: Send + Sync> ReadUserWorkspace for Backend<W> {
    async fn read_user_workspace(&self, user: &str, owner: &str, name: &str) -> Result<Workspace> {
        self.read.read_user_workspace(user, owner, name).await
    }
}

#[async_trait::async_trait]
impl<W: WorkspaceWriter + Send + Sync> CreateUserWorkspace for Backend<W> {
    async fn create_user_workspace(&self, user: &str, workspace: &mut Workspace) -> Result<()> {
        self.write.create_user_workspace(user, workspace).await
    }
}

#[async_trait::async_trait]
impl<W: WorkspaceWriter + Send + Sync> UpdateUserWorkspace for Backend<W> {
    async fn update_user_workspace(&self, user: &str, workspace: &mut Workspace) -> Result<()> {
        self.write.update_user_workspace(user, workspace).await
    }
}
