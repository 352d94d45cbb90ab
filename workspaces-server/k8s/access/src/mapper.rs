//! Converts between `InternalWorkspace` and `Workspace` resources.
//!
//! An internal workspace has a generated name and lives in the workspaces
//! namespace. Users address it by its display name within a namespace named
//! after its owner, so both of these must be recoverable from the internal
//! resource. Neither is ever defaulted.

use workspaces_server_core::{Error, Result, HOME_WORKSPACE};
use workspaces_server_k8s_api::{
    labels, InternalWorkspace, InternalWorkspaceSpec, InternalWorkspaceStatus, ObjectMeta, Owner,
    OwnerIdentity, ResourceExt, SpaceInfo, Workspace, WorkspaceSpec, WorkspaceStatus,
};

/// Maps a stored workspace to the shape users see.
pub fn to_external(ws: &InternalWorkspace) -> Result<Workspace> {
    let display_name = ws
        .labels()
        .get(labels::DISPLAY_NAME)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::MissingDisplayNameLabel(ws.name_any()))?;

    let owner = &ws.spec.owner.identity.username;
    if owner.is_empty() {
        return Err(Error::MissingOwnerLabel(ws.name_any()));
    }

    let metadata = ObjectMeta {
        name: Some(display_name.clone()),
        namespace: Some(owner.clone()),
        labels: Some(user_labels(ws.labels())),
        generation: ws.metadata.generation,
        creation_timestamp: ws.metadata.creation_timestamp.clone(),
        ..Default::default()
    };

    let status = ws.status.as_ref().map(|status| WorkspaceStatus {
        space: status.space.clone(),
        owner: status.owner.clone(),
        conditions: status.conditions.clone(),
    });

    Ok(Workspace {
        metadata,
        spec: WorkspaceSpec {
            visibility: ws.spec.visibility.into(),
        },
        status,
    })
}

/// Maps a user-supplied workspace to the shape stored in the cluster.
///
/// The result has neither a name nor a namespace, and its owner identity
/// carries only the username; the caller is responsible for completing both.
pub fn to_internal(ws: &Workspace) -> Result<InternalWorkspace> {
    let display_name = ws.metadata.name.clone().unwrap_or_default();
    if display_name.is_empty() {
        return Err(Error::MissingDisplayNameLabel(display_name));
    }
    let owner = ws.metadata.namespace.clone().unwrap_or_default();
    if owner.is_empty() {
        return Err(Error::MissingOwnerLabel(display_name));
    }

    let mut internal_labels = user_labels(ws.labels());
    internal_labels.insert(labels::DISPLAY_NAME.to_string(), display_name.clone());
    internal_labels.insert(labels::WORKSPACE_OWNER.to_string(), owner.clone());

    let current = ws.status.as_ref().and_then(|s| s.space.as_ref());
    let space = SpaceInfo {
        name: current.map(|s| s.name.clone()).unwrap_or_default(),
        is_home: display_name == HOME_WORKSPACE,
        target_cluster: current
            .map(|s| s.target_cluster.clone())
            .unwrap_or_default(),
    };

    Ok(InternalWorkspace {
        metadata: ObjectMeta {
            labels: Some(internal_labels),
            generation: ws.metadata.generation,
            ..Default::default()
        },
        spec: InternalWorkspaceSpec {
            display_name,
            visibility: ws.spec.visibility.into(),
            owner: Owner {
                identity: OwnerIdentity {
                    username: owner,
                    ..Default::default()
                },
            },
        },
        status: Some(InternalWorkspaceStatus {
            space: Some(space),
            owner: ws.status.as_ref().and_then(|s| s.owner.clone()),
            conditions: ws
                .status
                .as_ref()
                .map(|s| s.conditions.clone())
                .unwrap_or_default(),
        }),
    })
}

/// Maps each workspace in order, failing on the first that cannot be mapped.
pub fn to_external_list<'w>(
    workspaces: impl IntoIterator<Item = &'w InternalWorkspace>,
) -> Result<Vec<Workspace>> {
    workspaces.into_iter().map(to_external).collect()
}

/// Maps each workspace in order, failing on the first that cannot be mapped.
pub fn to_internal_list<'w>(
    workspaces: impl IntoIterator<Item = &'w Workspace>,
) -> Result<Vec<InternalWorkspace>> {
    workspaces.into_iter().map(to_internal).collect()
}

fn user_labels(all: &labels::Map) -> labels::Map {
    all.iter()
        .filter(|(k, _)| !labels::is_internal(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;
    use workspaces_server_k8s_api::{
        Condition, InternalWorkspaceVisibility, OwnerStatus, WorkspaceVisibility,
    };

    fn mk_internal() -> InternalWorkspace {
        InternalWorkspace {
            metadata: ObjectMeta {
                name: Some("ws-8xk2p".to_string()),
                namespace: Some("workspaces-system".to_string()),
                labels: Some(btreemap! {
                    labels::DISPLAY_NAME.to_string() => "project".to_string(),
                    labels::WORKSPACE_OWNER.to_string() => "alice".to_string(),
                    labels::VISIBILITY.to_string() => "community".to_string(),
                    "team".to_string() => "blue".to_string(),
                }),
                generation: Some(3),
                ..Default::default()
            },
            spec: InternalWorkspaceSpec {
                display_name: "project".to_string(),
                visibility: InternalWorkspaceVisibility::Community,
                owner: Owner {
                    identity: OwnerIdentity {
                        subject: "f81d4fae".to_string(),
                        username: "alice".to_string(),
                        email: "alice@example.com".to_string(),
                    },
                },
            },
            status: Some(InternalWorkspaceStatus {
                space: Some(SpaceInfo {
                    name: "alice-project".to_string(),
                    is_home: false,
                    target_cluster: "member-1".to_string(),
                }),
                owner: Some(OwnerStatus {
                    username: "alice".to_string(),
                }),
                conditions: vec![Condition {
                    typ: "Ready".to_string(),
                    status: "True".to_string(),
                    ..Default::default()
                }],
            }),
        }
    }

    #[test]
    fn maps_internal_to_external() {
        let ws = to_external(&mk_internal()).unwrap();
        assert_eq!(ws.metadata.name.as_deref(), Some("project"));
        assert_eq!(ws.metadata.namespace.as_deref(), Some("alice"));
        assert_eq!(ws.metadata.generation, Some(3));
        assert_eq!(
            ws.metadata.labels,
            Some(btreemap! { "team".to_string() => "blue".to_string() })
        );
        assert_eq!(ws.spec.visibility, WorkspaceVisibility::Community);

        let status = ws.status.expect("status must be copied");
        assert_eq!(status.space.unwrap().name, "alice-project");
        assert_eq!(status.owner.unwrap().username, "alice");
        assert_eq!(status.conditions.len(), 1);
    }

    #[test]
    fn requires_display_name_label() {
        let mut internal = mk_internal();
        internal.labels_mut().remove(labels::DISPLAY_NAME);
        assert!(matches!(
            to_external(&internal),
            Err(Error::MissingDisplayNameLabel(name)) if name == "ws-8xk2p"
        ));
    }

    #[test]
    fn requires_owner() {
        let mut internal = mk_internal();
        internal.spec.owner.identity.username.clear();
        assert!(matches!(
            to_external(&internal),
            Err(Error::MissingOwnerLabel(name)) if name == "ws-8xk2p"
        ));
    }

    #[test]
    fn maps_external_to_internal() {
        let external = Workspace {
            metadata: ObjectMeta {
                name: Some("default".to_string()),
                namespace: Some("bob".to_string()),
                labels: Some(btreemap! {
                    "team".to_string() => "red".to_string(),
                    labels::VISIBILITY.to_string() => "community".to_string(),
                }),
                generation: Some(7),
                ..Default::default()
            },
            spec: WorkspaceSpec {
                visibility: WorkspaceVisibility::Private,
            },
            status: None,
        };

        let internal = to_internal(&external).unwrap();
        assert_eq!(internal.metadata.name, None);
        assert_eq!(internal.metadata.namespace, None);
        assert_eq!(internal.metadata.generation, Some(7));
        assert_eq!(
            internal.metadata.labels,
            Some(btreemap! {
                "team".to_string() => "red".to_string(),
                labels::DISPLAY_NAME.to_string() => "default".to_string(),
                labels::WORKSPACE_OWNER.to_string() => "bob".to_string(),
            })
        );
        assert_eq!(internal.spec.display_name, "default");
        assert_eq!(internal.spec.owner.identity.username, "bob");
        assert_eq!(internal.spec.visibility, InternalWorkspaceVisibility::Private);

        let space = internal.status.unwrap().space.unwrap();
        assert!(space.is_home, "the default workspace is the home workspace");
    }

    #[test]
    fn only_the_default_workspace_is_home() {
        let mut external = to_external(&mk_internal()).unwrap();
        external.metadata.name = Some("defaults".to_string());
        let internal = to_internal(&external).unwrap();
        assert!(!internal.status.unwrap().space.unwrap().is_home);
    }

    #[test]
    fn external_requires_name_and_namespace() {
        let mut external = to_external(&mk_internal()).unwrap();
        external.metadata.namespace = None;
        assert!(matches!(
            to_internal(&external),
            Err(Error::MissingOwnerLabel(_))
        ));

        external.metadata.name = None;
        assert!(matches!(
            to_internal(&external),
            Err(Error::MissingDisplayNameLabel(_))
        ));
    }

    #[test]
    fn list_mapping_aborts_on_first_failure() {
        let good = mk_internal();
        let mut bad = mk_internal();
        bad.metadata.name = Some("ws-broken".to_string());
        bad.labels_mut().remove(labels::DISPLAY_NAME);

        let mapped = to_external_list([&good, &good]).unwrap();
        assert_eq!(mapped.len(), 2);

        assert!(matches!(
            to_external_list([&good, &bad, &good]),
            Err(Error::MissingDisplayNameLabel(name)) if name == "ws-broken"
        ));
    }

    #[test]
    fn round_trips_through_internal() {
        let external = to_external(&mk_internal()).unwrap();
        let internal = to_internal_list([&external]).unwrap();
        let back = to_external_list(&internal).unwrap();
        assert_eq!(back, vec![external]);
    }
}
