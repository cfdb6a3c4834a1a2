//! Route-table and guard integration tests: every protected path is reachable
//! only with an authenticated principal in the owning role's namespace, and
//! redirects always target that role's own login route.

use advocase::identity::{Principal, Role, SessionStore};
use advocase::routes::{Resolution, RouteTable};
use advocase::views::ViewKind;

fn signed_in(store: &SessionStore, role: Role) {
    store.set(Principal::authenticated(role, "u")).expect("session write");
}

/// One representative protected path per role, plus its dashboard.
fn protected_paths(role: Role) -> Vec<&'static str> {
    match role {
        Role::Admin => vec!["/admin-dashboard", "/admin/applications", "/admin/bank-accounts"],
        Role::Employee => vec!["/employee-dashboard", "/employee/notifications", "/employee/attendance"],
        Role::BankEmployee => vec!["/bank-employee-dashboard", "/bank-employee/submissions"],
        Role::BankManager => vec!["/bank-manager-dashboard", "/bank-manager/document-tracking"],
        Role::Guest => vec![],
    }
}

#[test]
fn no_session_redirects_to_owning_login() {
    let table = RouteTable::standard();
    let store = SessionStore::in_memory();
    for role in Role::AUTHENTICATED {
        for path in protected_paths(role) {
            match table.resolve(path, &store) {
                Resolution::Redirect { location, role: owner } => {
                    assert_eq!(location, role.login_path(), "{path} must redirect to its own role's login");
                    assert_eq!(owner, role);
                }
                other => panic!("{path} without a session should redirect, got {other:?}"),
            }
        }
    }
}

#[test]
fn admin_redirect_targets_advocate_login_not_another_roles() {
    let table = RouteTable::standard();
    let store = SessionStore::in_memory();
    match table.resolve("/admin-dashboard", &store) {
        Resolution::Redirect { location, .. } => {
            assert_eq!(location, "/advocate-login");
            assert_ne!(location, "/employee-login");
        }
        other => panic!("expected redirect, got {other:?}"),
    }
}

#[test]
fn authenticated_role_renders_protected_view() {
    let table = RouteTable::standard();
    for role in Role::AUTHENTICATED {
        let store = SessionStore::in_memory();
        signed_in(&store, role);
        for path in protected_paths(role) {
            match table.resolve(path, &store) {
                Resolution::Render { entry, principal } => {
                    assert_eq!(entry.path, path);
                    let p = principal.expect("guarded render carries the principal");
                    assert_eq!(p.role, role);
                    assert!(p.authenticated);
                }
                other => panic!("{path} with a live {role} session should render, got {other:?}"),
            }
        }
    }
}

#[test]
fn clearing_the_session_revokes_on_next_resolve() {
    let table = RouteTable::standard();
    let store = SessionStore::in_memory();
    signed_in(&store, Role::Employee);
    assert!(matches!(table.resolve("/employee-dashboard", &store), Resolution::Render { .. }));

    // Revocation takes effect without any reload: the guard re-checks per resolve.
    store.clear(Role::Employee);
    match table.resolve("/employee-dashboard", &store) {
        Resolution::Redirect { location, .. } => assert_eq!(location, "/employee-login"),
        other => panic!("cleared session should redirect, got {other:?}"),
    }
}

#[test]
fn unauthenticated_flag_blocks_even_with_a_stored_principal() {
    let table = RouteTable::standard();
    let store = SessionStore::in_memory();
    let mut p = Principal::authenticated(Role::Admin, "half-logged-in");
    p.authenticated = false;
    store.set(p).unwrap();
    assert!(matches!(table.resolve("/admin-dashboard", &store), Resolution::Redirect { .. }));
}

#[test]
fn namespaces_are_independent_across_roles() {
    let table = RouteTable::standard();
    let store = SessionStore::in_memory();
    signed_in(&store, Role::Employee);
    let mut stale_admin = Principal::authenticated(Role::Admin, "a");
    stale_admin.authenticated = false;
    store.set(stale_admin).unwrap();

    // Employee session carries its own paths...
    assert!(matches!(table.resolve("/employee-dashboard", &store), Resolution::Render { .. }));
    // ...and says nothing about admin paths.
    assert!(matches!(table.resolve("/admin-dashboard", &store), Resolution::Redirect { .. }));

    // Setting one role never disturbs another's stored principal.
    assert_eq!(store.get(Role::Employee).unwrap().identifier, "u");
}

#[test]
fn unmatched_paths_render_not_found_regardless_of_session() {
    let table = RouteTable::standard();
    let store = SessionStore::in_memory();
    for path in ["/does-not-exist", "/admin-dashboard/extra", "/Admin-Dashboard"] {
        match table.resolve(path, &store) {
            Resolution::Render { entry, .. } => assert_eq!(entry.view, ViewKind::NotFound, "{path}"),
            other => panic!("{path} should hit the catch-all, got {other:?}"),
        }
    }

    // A live session changes nothing about unmatched paths.
    signed_in(&store, Role::Admin);
    match table.resolve("/does-not-exist", &store) {
        Resolution::Render { entry, .. } => assert_eq!(entry.view, ViewKind::NotFound),
        other => panic!("expected catch-all, got {other:?}"),
    }
}

#[test]
fn full_route_set_is_present() {
    let table = RouteTable::standard();
    let expect = [
        "/", "/advocate-login", "/employee-login", "/bank-login", "/attendance",
        "/bank-manager-dashboard", "/bank-manager/document-tracking",
        "/bank-manager/queries-monitoring", "/bank-manager/reports-analytics",
        "/admin-dashboard", "/admin/applications", "/admin/loan-recovery",
        "/admin/past-applications", "/admin/payment-details",
        "/admin/create-employee-account", "/admin/create-bank-account", "/admin/bank-accounts",
        "/employee-dashboard", "/employee/applications", "/employee/notifications",
        "/employee/past-applications", "/employee/request-to-bank",
        "/employee/received-from-bank", "/employee/attendance",
        "/bank-employee-dashboard", "/bank-employee/create-application",
        "/bank-employee/submissions", "/bank-employee/queries", "/bank-employee/completed",
        "/bank-employee/payments", "/bank-employee/hiring-status",
        "*",
    ];
    for path in expect {
        assert!(table.entries().iter().any(|e| e.path == path), "missing route: {path}");
    }
    assert_eq!(table.entries().len(), expect.len());
}
