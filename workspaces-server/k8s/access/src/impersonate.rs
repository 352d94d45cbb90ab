use crate::WorkspaceWriter;
use workspaces_server_k8s_api::{Api, Client, InternalWorkspace, PostParams, ResourceExt};

/// Writes internal workspaces to the API server as the requesting user.
///
/// Each request uses a client whose credentials impersonate the user, so the
/// API server's RBAC decides whether the write is permitted.
#[derive(Clone, Debug)]
pub struct Impersonator {
    config: kube::Config,
    namespace: String,
}

// === impl Impersonator ===

impl Impersonator {
    /// `config` holds the server's own credentials, which must be allowed to
    /// impersonate users.
    pub fn new(config: kube::Config, namespace: impl Into<String>) -> Self {
        Self {
            config,
            namespace: namespace.into(),
        }
    }

    pub fn client_for(&self, user: &str) -> kube::Result<Client> {
        Client::try_from(self.config_for(user))
    }

    fn config_for(&self, user: &str) -> kube::Config {
        let mut config = self.config.clone();
        config.auth_info.impersonate = Some(user.to_string());
        config.auth_info.impersonate_groups = None;
        config
    }

    fn api(&self, user: &str) -> kube::Result<Api<InternalWorkspace>> {
        Ok(Api::namespaced(self.client_for(user)?, &self.namespace))
    }
}

#[async_trait::async_trait]
impl WorkspaceWriter for Impersonator {
    async fn create(&self, user: &str, ws: &InternalWorkspace) -> kube::Result<InternalWorkspace> {
        let api = self.api(user)?;
        api.create(&PostParams::default(), ws).await
    }

    async fn replace(&self, user: &str, ws: &InternalWorkspace) -> kube::Result<InternalWorkspace> {
        let api = self.api(user)?;
        api.replace(&ws.name_any(), &PostParams::default(), ws).await
    }
}
