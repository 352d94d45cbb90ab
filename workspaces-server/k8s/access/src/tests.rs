mod query;

use crate::*;
use kubert::index::IndexNamespacedResource;
use maplit::btreemap;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};
use workspaces_server_k8s_api::{
    labels, ErrorResponse, IdentityClaims, InternalWorkspace, InternalWorkspaceSpec,
    InternalWorkspaceStatus, InternalWorkspaceVisibility, ObjectMeta, Owner, OwnerIdentity,
    ResourceExt, SpaceBinding, SpaceBindingSpec, SpaceInfo, UserSignup, UserSignupSpec,
    UserSignupStatus,
};
use workspaces_server_k8s_index::{CacheConfig, Index, ResourceCache, SharedIndex};

const IDENTITY_NS: &str = "toolchain-host-operator";
const WORKSPACES_NS: &str = "workspaces-system";

struct TestConfig {
    index: SharedIndex,
    api: FakeApiServer,
    query: AuthorizedQuery,
    read: ReadModel,
    write: WriteModel<FakeApiServer>,
    _tracing: tracing::subscriber::DefaultGuard,
}

/// An in-memory stand-in for the API server's handling of internal
/// workspaces. Every successful write is delivered to the index immediately,
/// as if by a watch.
#[derive(Clone, Debug, Default)]
struct FakeApiServer {
    index: Option<SharedIndex>,
    state: Arc<Mutex<ApiState>>,
}

#[derive(Debug, Default)]
struct ApiState {
    stored: BTreeMap<String, InternalWorkspace>,
    next_suffix: u32,
    next_version: u64,
    forbidden: HashSet<String>,
    requests: Vec<(&'static str, String)>,
}

fn config() -> CacheConfig {
    CacheConfig {
        identity_namespace: IDENTITY_NS.to_string(),
        workspaces_namespace: WORKSPACES_NS.to_string(),
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        let _tracing = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::TRACE)
                .finish(),
        );
        let config = config();
        let index = Index::shared(&config);
        let cache = ResourceCache::new(index.clone());
        let query = AuthorizedQuery::new(cache.clone(), &config);
        let api = FakeApiServer {
            index: Some(index.clone()),
            ..Default::default()
        };
        let write = WriteModel::new(
            api.clone(),
            query.clone(),
            IdentityResolver::new(cache, &config),
            WORKSPACES_NS,
        );
        Self {
            index,
            read: ReadModel::new(query.clone()),
            query,
            write,
            api,
            _tracing,
        }
    }
}

impl TestConfig {
    /// Stores a workspace through the fake API server so that subsequent
    /// writes can replace it.
    fn store(&self, ws: InternalWorkspace) {
        self.api.put(ws);
    }

    fn grant(&self, binding: SpaceBinding) {
        self.index.write().apply(binding);
    }

    fn signup(&self, signup: UserSignup) {
        self.index.write().apply(signup);
    }
}

// === impl FakeApiServer ===

impl FakeApiServer {
    fn put(&self, mut ws: InternalWorkspace) -> InternalWorkspace {
        let mut state = self.state.lock();
        state.next_version += 1;
        ws.metadata.resource_version = Some(state.next_version.to_string());
        state.stored.insert(ws.name_any(), ws.clone());
        drop(state);

        if let Some(index) = self.index.as_ref() {
            index.write().apply(ws.clone());
        }
        ws
    }

    fn get(&self, name: &str) -> Option<InternalWorkspace> {
        self.state.lock().stored.get(name).cloned()
    }

    fn stored(&self) -> Vec<InternalWorkspace> {
        self.state.lock().stored.values().cloned().collect()
    }

    fn forbid(&self, user: &str) {
        self.state.lock().forbidden.insert(user.to_string());
    }

    fn requests(&self) -> Vec<(&'static str, String)> {
        self.state.lock().requests.clone()
    }

    /// Changes the stored resource without going through a model, as another
    /// client would.
    fn bump(&self, name: &str) {
        if let Some(mut ws) = self.get(name) {
            ws.metadata.generation = ws.metadata.generation.map(|g| g + 1);
            self.put(ws);
        }
    }

    fn admit(&self, verb: &'static str, user: &str) -> kube::Result<()> {
        let mut state = self.state.lock();
        state.requests.push((verb, user.to_string()));
        if state.forbidden.contains(user) {
            return Err(api_error(403, "Forbidden"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WorkspaceWriter for FakeApiServer {
    async fn create(&self, user: &str, ws: &InternalWorkspace) -> kube::Result<InternalWorkspace> {
        self.admit("create", user)?;

        let mut ws = ws.clone();
        let suffix = {
            let mut state = self.state.lock();
            state.next_suffix += 1;
            state.next_suffix
        };
        let prefix = ws.metadata.generate_name.clone().unwrap_or_default();
        ws.metadata.name = Some(format!("{prefix}{suffix:05}"));
        ws.metadata.generation = Some(1);
        Ok(self.put(ws))
    }

    async fn replace(&self, user: &str, ws: &InternalWorkspace) -> kube::Result<InternalWorkspace> {
        self.admit("replace", user)?;

        let current = self
            .get(&ws.name_any())
            .ok_or_else(|| api_error(404, "NotFound"))?;
        if current.metadata.resource_version != ws.metadata.resource_version {
            return Err(api_error(409, "Conflict"));
        }

        let mut ws = ws.clone();
        if ws.spec != current.spec {
            ws.metadata.generation = current.metadata.generation.map(|g| g + 1);
        }
        Ok(self.put(ws))
    }
}

fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("request failed: {reason}"),
        reason: reason.to_string(),
        code,
    })
}

fn mk_workspace(
    name: &str,
    display_name: &str,
    owner: &str,
    visibility: InternalWorkspaceVisibility,
) -> InternalWorkspace {
    InternalWorkspace {
        metadata: ObjectMeta {
            namespace: Some(WORKSPACES_NS.to_string()),
            name: Some(name.to_string()),
            labels: Some(btreemap! {
                labels::DISPLAY_NAME.to_string() => display_name.to_string(),
                labels::WORKSPACE_OWNER.to_string() => owner.to_string(),
            }),
            generation: Some(1),
            ..Default::default()
        },
        spec: InternalWorkspaceSpec {
            display_name: display_name.to_string(),
            visibility,
            owner: Owner {
                identity: OwnerIdentity {
                    subject: format!("sub-{owner}"),
                    username: owner.to_string(),
                    email: format!("{owner}@example.com"),
                },
            },
        },
        status: Some(InternalWorkspaceStatus {
            space: Some(SpaceInfo {
                name: name.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
    }
}

fn mk_signup(username: &str) -> UserSignup {
    UserSignup {
        metadata: ObjectMeta {
            namespace: Some(IDENTITY_NS.to_string()),
            name: Some(username.to_string()),
            ..Default::default()
        },
        spec: UserSignupSpec {
            identity_claims: IdentityClaims {
                sub: format!("sub-{username}"),
                email: format!("{username}@example.com"),
                ..Default::default()
            },
        },
        status: Some(UserSignupStatus {
            compliant_username: username.to_string(),
        }),
    }
}

fn mk_binding(grantee: &str, space: &str) -> SpaceBinding {
    SpaceBinding {
        metadata: ObjectMeta {
            namespace: Some(IDENTITY_NS.to_string()),
            name: Some(format!("{grantee}-{space}")),
            ..Default::default()
        },
        spec: SpaceBindingSpec {
            master_user_record: grantee.to_string(),
            space: space.to_string(),
            space_role: "contributor".to_string(),
        },
    }
}

fn names(workspaces: &[Arc<InternalWorkspace>]) -> Vec<String> {
    workspaces.iter().map(|ws| ws.name_any()).collect()
}
