use crate::{
    store::{Field, Store},
    Index,
};
use workspaces_server_k8s_api::{labels, InternalWorkspace, ResourceExt};

pub(crate) fn store(namespace: &str) -> Store<InternalWorkspace> {
    Store::new(namespace)
        .with_index(Field::OwnerUsername, owner_username)
        .with_index(Field::OwnerEmail, owner_email)
        .with_index(Field::OwnerSubject, owner_subject)
        .with_index(Field::Visibility, visibility)
        .with_index(Field::DisplayName, display_name)
        .with_index(Field::SpaceName, space_name)
}

fn owner_username(ws: &InternalWorkspace) -> Option<&str> {
    Some(ws.spec.owner.identity.username.as_str())
}

fn owner_email(ws: &InternalWorkspace) -> Option<&str> {
    Some(ws.spec.owner.identity.email.as_str())
}

fn owner_subject(ws: &InternalWorkspace) -> Option<&str> {
    Some(ws.spec.owner.identity.subject.as_str())
}

fn visibility(ws: &InternalWorkspace) -> Option<&str> {
    ws.labels().get(labels::VISIBILITY).map(String::as_str)
}

fn display_name(ws: &InternalWorkspace) -> Option<&str> {
    ws.labels().get(labels::DISPLAY_NAME).map(String::as_str)
}

fn space_name(ws: &InternalWorkspace) -> Option<&str> {
    ws.status
        .as_ref()?
        .space
        .as_ref()
        .map(|space| space.name.as_str())
}

/// Sets the derived visibility label from `spec.visibility`, replacing any
/// value the stored resource may carry.
pub fn with_visibility_label(mut ws: InternalWorkspace) -> InternalWorkspace {
    let visibility = ws.spec.visibility.as_str().to_string();
    ws.labels_mut()
        .insert(labels::VISIBILITY.to_string(), visibility);
    ws
}

impl kubert::index::IndexNamespacedResource<InternalWorkspace> for Index {
    fn apply(&mut self, ws: InternalWorkspace) {
        let name = ws.name_unchecked();
        let ns = ws.namespace();
        let ws = with_visibility_label(ws);
        if self.workspaces.apply(ws) {
            tracing::debug!(%name, "Indexed workspace");
        } else {
            tracing::warn!(
                %name,
                namespace = ?ns,
                expected = %self.workspaces.namespace(),
                "Ignoring workspace outside of the workspaces namespace"
            );
        }
    }

    fn delete(&mut self, namespace: String, name: String) {
        if namespace != self.workspaces.namespace() {
            return;
        }
        if self.workspaces.delete(&name).is_some() {
            tracing::debug!(%name, "Removed workspace");
        }
    }
}
