use crate::{
    store::{Field, Store},
    Index,
};
use workspaces_server_k8s_api::{ResourceExt, SpaceBinding, UserSignup};

pub(crate) fn signup_store(namespace: &str) -> Store<UserSignup> {
    Store::new(namespace)
        .with_index(Field::CompliantUsername, UserSignup::compliant_username)
        .with_index(Field::Subject, subject)
}

pub(crate) fn binding_store(namespace: &str) -> Store<SpaceBinding> {
    Store::new(namespace)
        .with_index(Field::Grantee, grantee)
        .with_index(Field::GrantSpace, space)
}

fn subject(signup: &UserSignup) -> Option<&str> {
    Some(signup.spec.identity_claims.sub.as_str())
}

fn grantee(binding: &SpaceBinding) -> Option<&str> {
    Some(binding.spec.master_user_record.as_str())
}

fn space(binding: &SpaceBinding) -> Option<&str> {
    Some(binding.spec.space.as_str())
}

impl kubert::index::IndexNamespacedResource<UserSignup> for Index {
    fn apply(&mut self, signup: UserSignup) {
        let name = signup.name_unchecked();
        if self.signups.apply(signup) {
            tracing::debug!(%name, "Indexed user signup");
        } else {
            tracing::warn!(%name, "Ignoring user signup outside of the identity namespace");
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if namespace == self.signups.namespace() && self.signups.delete(&name).is_some() {
            tracing::debug!(%name, "Removed user signup");
        }
    }
}

impl kubert::index::IndexNamespacedResource<SpaceBinding> for Index {
    fn apply(&mut self, binding: SpaceBinding) {
        let name = binding.name_unchecked();
        tracing::debug!(
            %name,
            grantee = %binding.spec.master_user_record,
            space = %binding.spec.space,
            "Indexing space binding"
        );
        if !self.bindings.apply(binding) {
            tracing::warn!(%name, "Ignoring space binding outside of the identity namespace");
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if namespace == self.bindings.namespace() && self.bindings.delete(&name).is_some() {
            tracing::debug!(%name, "Removed space binding");
        }
    }
}
