use super::*;
use workspaces_server_core::{Error, SpaceKey};
use workspaces_server_k8s_api::PUBLIC_VIEWER;

#[test]
fn community_workspaces_are_readable_by_anyone() {
    let test = TestConfig::default();
    test.store(mk_workspace(
        "ws-1",
        "shared",
        "alice",
        InternalWorkspaceVisibility::Community,
    ));

    let ws = test
        .query
        .get_as_user("mallory", &SpaceKey::new("alice", "shared"))
        .expect("community workspace must be readable");
    assert_eq!(ws.name_any(), "ws-1");
}

#[test]
fn private_workspaces_require_a_binding() {
    let test = TestConfig::default();
    test.store(mk_workspace(
        "ws-1",
        "secret",
        "alice",
        InternalWorkspaceVisibility::Private,
    ));
    let key = SpaceKey::new("alice", "secret");

    assert!(matches!(
        test.query.get_as_user("bob", &key),
        Err(Error::Unauthorized { user, workspace }) if user == "bob" && workspace == key
    ));

    test.grant(mk_binding("bob", "ws-1"));
    let ws = test
        .query
        .get_as_user("bob", &key)
        .expect("bound user must be authorized");
    assert_eq!(ws.name_any(), "ws-1");

    // A binding to some other workspace grants nothing here.
    test.grant(mk_binding("carol", "ws-2"));
    assert!(matches!(
        test.query.get_as_user("carol", &key),
        Err(Error::Unauthorized { .. })
    ));
}

#[test]
fn public_viewer_binding_does_not_authorize_private_workspaces() {
    let test = TestConfig::default();
    test.store(mk_workspace(
        "ws-1",
        "secret",
        "alice",
        InternalWorkspaceVisibility::Private,
    ));
    test.grant(mk_binding(PUBLIC_VIEWER, "ws-1"));

    assert!(matches!(
        test.query
            .get_as_user("bob", &SpaceKey::new("alice", "secret")),
        Err(Error::Unauthorized { .. })
    ));
    assert!(test.query.list_as_user("bob").unwrap().is_empty());
}

#[test]
fn resolves_by_owner_and_display_name() {
    let test = TestConfig::default();
    test.store(mk_workspace(
        "ws-a",
        "project",
        "alice",
        InternalWorkspaceVisibility::Community,
    ));
    test.store(mk_workspace(
        "ws-b",
        "project",
        "bob",
        InternalWorkspaceVisibility::Community,
    ));

    let ws = test
        .query
        .get_as_user("carol", &SpaceKey::new("bob", "project"))
        .unwrap();
    assert_eq!(ws.name_any(), "ws-b");

    let key = SpaceKey::new("carol", "project");
    assert!(matches!(
        test.query.get_as_user("carol", &key),
        Err(Error::WorkspaceNotFound(k)) if k == key
    ));
}

#[test]
fn duplicate_workspaces_are_ambiguous() {
    let test = TestConfig::default();
    test.store(mk_workspace(
        "ws-1",
        "project",
        "alice",
        InternalWorkspaceVisibility::Community,
    ));
    test.store(mk_workspace(
        "ws-2",
        "project",
        "alice",
        InternalWorkspaceVisibility::Community,
    ));

    let key = SpaceKey::new("alice", "project");
    assert!(matches!(
        test.query.get_as_user("alice", &key),
        Err(Error::MoreThanOneFound(k)) if k == key
    ));
}

#[test]
fn lists_community_and_bound_workspaces() {
    let test = TestConfig::default();
    test.store(mk_workspace(
        "ws-c",
        "open",
        "alice",
        InternalWorkspaceVisibility::Community,
    ));
    test.store(mk_workspace(
        "ws-a",
        "mine",
        "bob",
        InternalWorkspaceVisibility::Private,
    ));
    test.store(mk_workspace(
        "ws-b",
        "theirs",
        "alice",
        InternalWorkspaceVisibility::Private,
    ));
    test.grant(mk_binding("bob", "ws-a"));
    // Bound and community at once; listed once.
    test.grant(mk_binding("bob", "ws-c"));

    assert_eq!(
        names(&test.query.list_as_user("bob").unwrap()),
        ["ws-a", "ws-c"]
    );
    assert_eq!(names(&test.query.list_as_user("dave").unwrap()), ["ws-c"]);
}

#[test]
fn skips_bindings_to_missing_workspaces() {
    let test = TestConfig::default();
    test.store(mk_workspace(
        "ws-1",
        "mine",
        "bob",
        InternalWorkspaceVisibility::Private,
    ));
    test.grant(mk_binding("bob", "ws-1"));
    test.grant(mk_binding("bob", "ws-deleted"));

    assert_eq!(names(&test.query.list_as_user("bob").unwrap()), ["ws-1"]);
}

#[test]
fn reports_misconfigured_namespaces() {
    let test = TestConfig::default();
    let query = AuthorizedQuery::new(
        ResourceCache::new(test.index.clone()),
        &CacheConfig {
            identity_namespace: "elsewhere".to_string(),
            workspaces_namespace: WORKSPACES_NS.to_string(),
        },
    );
    assert!(matches!(
        query.list_as_user("bob"),
        Err(Error::Internal(_))
    ));
}
