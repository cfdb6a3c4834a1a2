//! Static route table and its resolution. Entries are built once at startup,
//! matched in order with exact paths, and finished by a trailing catch-all
//! that renders the not-found view. Protected entries compose the role guard;
//! public entries resolve without touching the session store.

use once_cell::sync::Lazy;

use crate::identity::{Decision, Principal, Role, RoleGuard, SessionStore};
use crate::views::ViewKind;

#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path: &'static str,
    pub required_role: Option<Role>,
    pub view: ViewKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Render { entry: &'a RouteEntry, principal: Option<Principal> },
    Redirect { location: &'static str, role: Role },
}

impl PartialEq for RouteEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

const ADVOCATE_LOGIN: &[Role] = &[Role::Admin];
const EMPLOYEE_LOGIN: &[Role] = &[Role::Employee];
const BANK_LOGIN: &[Role] = &[Role::BankEmployee, Role::BankManager];

fn public(path: &'static str, view: ViewKind) -> RouteEntry {
    RouteEntry { path, required_role: None, view }
}

fn guarded(path: &'static str, role: Role, view: ViewKind) -> RouteEntry {
    RouteEntry { path, required_role: Some(role), view }
}

/// Process-wide table, constructed once and immutable thereafter.
pub static ROUTES: Lazy<RouteTable> = Lazy::new(RouteTable::standard);

impl RouteTable {
    /// The portal's full route set, grouped by owning role. Custom entries
    /// stay above the trailing catch-all.
    pub fn standard() -> RouteTable {
        use Role::*;
        use ViewKind::*;

        let mut entries = vec![
            public("/", Landing),
            public("/advocate-login", Login { title: "Advocate Office Sign In", roles: ADVOCATE_LOGIN }),
            public("/employee-login", Login { title: "Employee Sign In", roles: EMPLOYEE_LOGIN }),
            public("/bank-login", Login { title: "Bank Sign In", roles: BANK_LOGIN }),
        ];

        // Bank manager
        entries.extend([
            guarded("/bank-manager-dashboard", BankManager, Dashboard(BankManager)),
            guarded("/bank-manager/document-tracking", BankManager, Board { collection: "documents", title: "Document Tracking" }),
            guarded("/bank-manager/queries-monitoring", BankManager, Board { collection: "queries", title: "Queries Monitoring" }),
            guarded(
                "/bank-manager/reports-analytics",
                BankManager,
                Console { title: "Reports & Analytics", blurb: "Weekly disbursal and turnaround reports are published here." },
            ),
        ]);

        // Admin
        entries.extend([
            guarded("/admin-dashboard", Admin, Dashboard(Admin)),
            guarded("/admin/applications", Admin, Applications { title: "Loan Applications", filter: None, mine: false }),
            guarded("/admin/loan-recovery", Admin, Board { collection: "recoveries", title: "Loan Recovery" }),
            guarded(
                "/admin/past-applications",
                Admin,
                Applications { title: "Past Applications", filter: Some(("status", "completed")), mine: false },
            ),
            guarded("/admin/payment-details", Admin, Board { collection: "payments", title: "Payment Details" }),
            guarded("/admin/create-employee-account", Admin, AccountForm { role: Employee, title: "Create Employee Account" }),
            guarded("/admin/create-bank-account", Admin, AccountForm { role: BankEmployee, title: "Create Bank Account" }),
            guarded("/admin/bank-accounts", Admin, AccountList { role: BankEmployee, title: "Bank Accounts" }),
        ]);

        // Employee
        entries.extend([
            guarded("/employee-dashboard", Employee, Dashboard(Employee)),
            guarded("/employee/applications", Employee, Applications { title: "Loan Applications", filter: None, mine: false }),
            guarded("/employee/notifications", Employee, Board { collection: "notifications", title: "Notifications" }),
            guarded(
                "/employee/past-applications",
                Employee,
                Applications { title: "Past Applications", filter: Some(("status", "completed")), mine: false },
            ),
            guarded("/employee/request-to-bank", Employee, Board { collection: "bank-requests", title: "Requests To Bank" }),
            guarded("/employee/received-from-bank", Employee, Board { collection: "bank-dispatches", title: "Received From Bank" }),
            guarded("/employee/attendance", Employee, Board { collection: "attendance", title: "Attendance Log" }),
        ]);

        // Bank employee
        entries.extend([
            guarded("/bank-employee-dashboard", BankEmployee, Dashboard(BankEmployee)),
            guarded("/bank-employee/create-application", BankEmployee, ApplicationForm),
            guarded("/bank-employee/submissions", BankEmployee, Applications { title: "My Submissions", filter: None, mine: true }),
            guarded("/bank-employee/queries", BankEmployee, Board { collection: "queries", title: "Queries" }),
            guarded(
                "/bank-employee/completed",
                BankEmployee,
                Applications { title: "Completed Applications", filter: Some(("status", "completed")), mine: false },
            ),
            guarded("/bank-employee/payments", BankEmployee, Board { collection: "payments", title: "Payments" }),
            guarded(
                "/bank-employee/hiring-status",
                BankEmployee,
                Console { title: "Hiring Status", blurb: "Openings at partner branches and the state of your referrals." },
            ),
        ]);

        // Shared
        entries.push(public("/attendance", Attendance));

        // Catch-all stays last
        entries.push(public("*", NotFound));

        RouteTable { entries }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Match `path` against the table in order and apply the owning guard.
    /// The guard runs on every resolution, so a cleared session redirects on
    /// the very next request with no restart.
    pub fn resolve(&self, path: &str, store: &SessionStore) -> Resolution<'_> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.path == path)
            .or_else(|| self.entries.iter().find(|e| e.path == "*"))
            .expect("route table always carries a catch-all entry");
        match entry.required_role {
            Some(role) => match RoleGuard::new(role).decide(store) {
                Decision::Allow(principal) => Resolution::Render { entry, principal: Some(principal) },
                Decision::Redirect(location) => Resolution::Redirect { location, role },
            },
            None => Resolution::Render { entry, principal: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_all_is_last() {
        let table = RouteTable::standard();
        assert_eq!(table.entries().last().unwrap().path, "*");
        assert_eq!(table.entries().iter().filter(|e| e.path == "*").count(), 1);
    }

    #[test]
    fn exact_paths_are_unique() {
        let table = RouteTable::standard();
        for (i, a) in table.entries().iter().enumerate() {
            for b in table.entries().iter().skip(i + 1) {
                assert_ne!(a.path, b.path, "duplicate route: {}", a.path);
            }
        }
    }

    #[test]
    fn public_routes_resolve_without_a_session() {
        let table = RouteTable::standard();
        let store = SessionStore::in_memory();
        for path in ["/", "/advocate-login", "/employee-login", "/bank-login", "/attendance"] {
            match table.resolve(path, &store) {
                Resolution::Render { entry, principal } => {
                    assert_eq!(entry.path, path);
                    assert!(principal.is_none());
                }
                other => panic!("{path} should render, got {other:?}"),
            }
        }
    }
}
