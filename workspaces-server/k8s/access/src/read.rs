use crate::{mapper, AuthorizedQuery};
use workspaces_server_core::{
    Error, ListOptions, ListUserWorkspaces, ReadUserWorkspace, Result, SpaceKey,
};
use workspaces_server_k8s_api::{labels, ResourceExt, Workspace};

/// Serves workspace reads from the cache.
#[derive(Clone, Debug)]
pub struct ReadModel {
    query: AuthorizedQuery,
}

// === impl ReadModel ===

impl ReadModel {
    pub fn new(query: AuthorizedQuery) -> Self {
        Self { query }
    }
}

#[async_trait::async_trait]
impl ListUserWorkspaces for ReadModel {
    async fn list_user_workspaces(&self, user: &str, opts: &ListOptions) -> Result<Vec<Workspace>> {
        if let Some(key) = opts.label_selector.keys().find(|k| labels::is_internal(k)) {
            return Err(Error::InternalLabelSelector(key.to_string()));
        }

        let readable = self.query.list_as_user(user)?;
        let mut workspaces = mapper::to_external_list(readable.iter().map(|ws| &**ws))?;

        if let Some(ns) = opts.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            workspaces.retain(|ws| ws.metadata.namespace.as_deref() == Some(ns));
        }

        for ws in &mut workspaces {
            let is_owner = ws.metadata.namespace.as_deref() == Some(user);
            ws.labels_mut()
                .insert(labels::IS_OWNER.to_string(), is_owner.to_string());
        }

        workspaces.retain(|ws| opts.label_selector.matches(ws.labels()));
        tracing::debug!(%user, count = workspaces.len(), "Listed workspaces");
        Ok(workspaces)
    }
}

#[async_trait::async_trait]
impl ReadUserWorkspace for ReadModel {
    async fn read_user_workspace(&self, user: &str, owner: &str, name: &str) -> Result<Workspace> {
        let key = SpaceKey::new(owner, name);
        let ws = self.query.get_as_user(user, &key).map_err(|error| match error {
            Error::WorkspaceNotFound(_) | Error::Unauthorized { .. } => {
                Error::WorkspaceNotFound(key.clone())
            }
            Error::MoreThanOneFound(_) => {
                tracing::warn!(workspace = %key, "Multiple workspaces share a display name and owner");
                Error::WorkspaceNotFound(key.clone())
            }
            error => error,
        })?;
        mapper::to_external(&ws)
    }
}
