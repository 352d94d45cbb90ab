use crate::{mapper, AuthorizedQuery, IdentityResolver};
use tracing::instrument;
use workspaces_server_core::{CreateUserWorkspace, Error, Result, SpaceKey, UpdateUserWorkspace};
use workspaces_server_k8s_api::{labels, InternalWorkspace, ResourceExt, Workspace};

/// Sends workspace writes to the API server as a given user.
#[async_trait::async_trait]
pub trait WorkspaceWriter {
    async fn create(&self, user: &str, ws: &InternalWorkspace) -> kube::Result<InternalWorkspace>;

    /// Replaces `ws` by name. The write is rejected with a conflict if the
    /// stored resource version no longer matches `ws`.
    async fn replace(&self, user: &str, ws: &InternalWorkspace) -> kube::Result<InternalWorkspace>;
}

/// Serves workspace writes.
///
/// Writes bypass the cache: authorization is left to the API server, which
/// evaluates each request as the impersonated user.
#[derive(Clone, Debug)]
pub struct WriteModel<W> {
    writer: W,
    query: AuthorizedQuery,
    identity: IdentityResolver,
    namespace: String,
}

// === impl WriteModel ===

impl<W> WriteModel<W> {
    pub fn new(
        writer: W,
        query: AuthorizedQuery,
        identity: IdentityResolver,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            writer,
            query,
            identity,
            namespace: namespace.into(),
        }
    }
}

#[async_trait::async_trait]
impl<W> CreateUserWorkspace for WriteModel<W>
where
    W: WorkspaceWriter + Send + Sync,
{
    /// Workspaces are always created in the caller's own namespace. A request
    /// may omit the namespace but may not name another one.
    #[instrument(skip_all, fields(%user, name = ?workspace.metadata.name))]
    async fn create_user_workspace(&self, user: &str, workspace: &mut Workspace) -> Result<()> {
        let mut request = workspace.clone();
        match request.metadata.namespace.as_deref() {
            None | Some("") => request.metadata.namespace = Some(user.to_string()),
            Some(ns) if ns == user => {}
            Some(ns) => {
                return Err(Error::NamespaceMismatch {
                    user: user.to_string(),
                    namespace: ns.to_string(),
                })
            }
        }
        let mut internal = mapper::to_internal(&request)?;
        let key = SpaceKey::new(user, &internal.spec.display_name);

        // A generated name never collides, so duplicates must be caught here.
        if !self.query.find(&key)?.is_empty() {
            return Err(Error::AlreadyExists(key));
        }

        internal.spec.owner.identity = self.identity.owner_identity(user)?;
        internal.metadata.name = None;
        internal.metadata.generate_name = Some(format!("{}-", internal.spec.display_name));
        internal.metadata.namespace = Some(self.namespace.clone());

        let created = self
            .writer
            .create(user, &internal)
            .await
            .map_err(|error| Error::from_platform(key, error))?;
        tracing::info!(name = %created.name_any(), "Created workspace");

        *workspace = mapper::to_external(&created)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<W> UpdateUserWorkspace for WriteModel<W>
where
    W: WorkspaceWriter + Send + Sync,
{
    #[instrument(
        skip_all,
        fields(
            %user,
            namespace = ?workspace.metadata.namespace,
            name = ?workspace.metadata.name,
        )
    )]
    async fn update_user_workspace(&self, user: &str, workspace: &mut Workspace) -> Result<()> {
        let requested = mapper::to_internal(workspace)?;
        let key = SpaceKey::new(
            &requested.spec.owner.identity.username,
            &requested.spec.display_name,
        );

        let current = self
            .query
            .get_as_user(user, &key)
            .map_err(|error| match error {
                Error::WorkspaceNotFound(_)
                | Error::Unauthorized { .. }
                | Error::MoreThanOneFound(_) => {
                    tracing::debug!(%error, "Workspace is not readable");
                    Error::WorkspaceNotFound(key.clone())
                }
                error => error,
            })?;

        if requested.metadata.generation != current.metadata.generation {
            return Err(Error::Conflict {
                workspace: key,
                requested: requested.metadata.generation,
                current: current.metadata.generation,
            });
        }

        let mut updated = InternalWorkspace::clone(&current);
        updated.spec.visibility = requested.spec.visibility;
        // The visibility label is derived by the cache and is never stored.
        updated.labels_mut().remove(labels::VISIBILITY);

        let updated = self
            .writer
            .replace(user, &updated)
            .await
            .map_err(|error| match Error::from_platform(key.clone(), error) {
                Error::Conflict { .. } => Error::Conflict {
                    workspace: key.clone(),
                    requested: requested.metadata.generation,
                    current: None,
                },
                error => error,
            })?;
        tracing::info!(
            name = %updated.name_any(),
            generation = ?updated.metadata.generation,
            "Updated workspace"
        );

        *workspace = mapper::to_external(&updated)?;
        Ok(())
    }
}
