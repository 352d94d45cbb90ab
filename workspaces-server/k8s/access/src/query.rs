use std::{collections::BTreeMap, sync::Arc};
use workspaces_server_core::{Error, Result, SpaceKey};
use workspaces_server_k8s_api::{
    InternalWorkspace, InternalWorkspaceVisibility, ResourceExt, SpaceBinding,
};
use workspaces_server_k8s_index::{self as index, CacheConfig, Field, ListQuery, ResourceCache};

/// Answers workspace lookups on behalf of a user.
///
/// A workspace is visible to a user when it has community visibility or when
/// a `SpaceBinding` in the identity namespace grants the user access to it.
/// Nothing is memoized between calls.
#[derive(Clone, Debug)]
pub struct AuthorizedQuery {
    cache: ResourceCache,
    identity_namespace: String,
    workspaces_namespace: String,
}

// === impl AuthorizedQuery ===

impl AuthorizedQuery {
    pub fn new(cache: ResourceCache, config: &CacheConfig) -> Self {
        Self {
            cache,
            identity_namespace: config.identity_namespace.clone(),
            workspaces_namespace: config.workspaces_namespace.clone(),
        }
    }

    /// Resolves the workspace `key` names and checks that `user` may read it.
    ///
    /// A key that matches more than one workspace is reported as
    /// [`Error::MoreThanOneFound`]; no match is ever picked arbitrarily.
    pub fn get_as_user(&self, user: &str, key: &SpaceKey) -> Result<Arc<InternalWorkspace>> {
        let mut owned = self.find(key)?.into_iter();

        let workspace = match (owned.next(), owned.next()) {
            (Some(ws), None) => ws,
            (None, _) => return Err(Error::WorkspaceNotFound(key.clone())),
            (Some(_), Some(_)) => return Err(Error::MoreThanOneFound(key.clone())),
        };

        if workspace.spec.visibility == InternalWorkspaceVisibility::Community {
            return Ok(workspace);
        }

        let name = workspace.name_unchecked();
        if self.granted(user)?.any(|b| b.spec.space == name) {
            return Ok(workspace);
        }

        tracing::debug!(%user, workspace = %key, "No space binding grants access");
        Err(Error::Unauthorized {
            user: user.to_string(),
            workspace: key.clone(),
        })
    }

    /// Lists every workspace `user` may read, ordered by name.
    ///
    /// Bindings that refer to workspaces missing from the cache are skipped.
    pub fn list_as_user(&self, user: &str) -> Result<Vec<Arc<InternalWorkspace>>> {
        let community = self
            .cache
            .list::<InternalWorkspace>(
                &self.workspaces_namespace,
                &ListQuery::Field(
                    Field::Visibility,
                    InternalWorkspaceVisibility::Community.to_string(),
                ),
            )
            .map_err(Error::internal)?;

        let mut readable = community
            .into_iter()
            .map(|ws| (ws.name_unchecked(), ws))
            .collect::<BTreeMap<_, _>>();

        for binding in self.granted(user)? {
            let space = &binding.spec.space;
            if readable.contains_key(space) {
                continue;
            }
            match self
                .cache
                .get::<InternalWorkspace>(&self.workspaces_namespace, space)
            {
                Ok(ws) => {
                    readable.insert(space.clone(), ws);
                }
                Err(index::Error::NotFound { .. }) => {
                    tracing::debug!(
                        %user,
                        binding = %binding.name_unchecked(),
                        %space,
                        "Skipping binding to a missing workspace"
                    );
                }
                Err(error) => return Err(Error::internal(error)),
            }
        }

        Ok(readable.into_values().collect())
    }

    /// Returns every cached workspace `key` names, regardless of who may
    /// read it.
    pub fn find(&self, key: &SpaceKey) -> Result<Vec<Arc<InternalWorkspace>>> {
        let named = self
            .cache
            .list::<InternalWorkspace>(
                &self.workspaces_namespace,
                &ListQuery::Field(Field::DisplayName, key.name.clone()),
            )
            .map_err(Error::internal)?;
        Ok(named
            .into_iter()
            .filter(|ws| ws.spec.owner.identity.username == key.owner)
            .collect())
    }

    fn granted(&self, user: &str) -> Result<impl Iterator<Item = Arc<SpaceBinding>>> {
        let bindings = self
            .cache
            .list::<SpaceBinding>(
                &self.identity_namespace,
                &ListQuery::Field(Field::Grantee, user.to_string()),
            )
            .map_err(Error::internal)?;
        Ok(bindings.into_iter())
    }
}
