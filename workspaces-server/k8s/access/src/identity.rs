use workspaces_server_core::{Error, Result};
use workspaces_server_k8s_api::{OwnerIdentity, UserSignup};
use workspaces_server_k8s_index::{CacheConfig, Field, ListQuery, ResourceCache};

/// Resolves users through the `UserSignup` resources in the identity
/// namespace.
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    cache: ResourceCache,
    namespace: String,
}

// === impl IdentityResolver ===

impl IdentityResolver {
    pub fn new(cache: ResourceCache, config: &CacheConfig) -> Self {
        Self {
            cache,
            namespace: config.identity_namespace.clone(),
        }
    }

    /// Returns the compliant username assigned to an authentication subject.
    pub fn compliant_username(&self, subject: &str) -> Result<String> {
        let signup = self.unique(Field::Subject, subject)?;
        signup
            .compliant_username()
            .map(str::to_string)
            .ok_or_else(|| Error::IdentityNotFound(subject.to_string()))
    }

    /// Returns the identity that owns workspaces created by `username`.
    pub fn owner_identity(&self, username: &str) -> Result<OwnerIdentity> {
        let signup = self.unique(Field::CompliantUsername, username)?;
        let claims = &signup.spec.identity_claims;
        Ok(OwnerIdentity {
            subject: claims.sub.clone(),
            username: username.to_string(),
            email: claims.email.clone(),
        })
    }

    fn unique(&self, field: Field, value: &str) -> Result<std::sync::Arc<UserSignup>> {
        let mut signups = self
            .cache
            .list::<UserSignup>(&self.namespace, &ListQuery::Field(field, value.to_string()))
            .map_err(Error::internal)?
            .into_iter();
        match (signups.next(), signups.next()) {
            (Some(signup), None) => Ok(signup),
            (None, _) => Err(Error::IdentityNotFound(value.to_string())),
            (Some(_), Some(_)) => Err(Error::internal(format!(
                "more than one user signup has {field:?} {value}"
            ))),
        }
    }
}
