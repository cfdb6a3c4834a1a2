use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role tags known to the portal. `Guest` is the unauthenticated visitor; the
/// other four each own a session namespace, a login entry point and a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Guest,
    Admin,
    Employee,
    BankEmployee,
    BankManager,
}

impl Role {
    /// The roles that can hold an authenticated session.
    pub const AUTHENTICATED: [Role; 4] = [Role::Admin, Role::Employee, Role::BankEmployee, Role::BankManager];

    pub fn slug(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::BankEmployee => "bank-employee",
            Role::BankManager => "bank-manager",
        }
    }

    pub fn parse_slug(s: &str) -> Option<Role> {
        match s {
            "guest" => Some(Role::Guest),
            "admin" => Some(Role::Admin),
            "employee" => Some(Role::Employee),
            "bank-employee" => Some(Role::BankEmployee),
            "bank-manager" => Some(Role::BankManager),
            _ => None,
        }
    }

    /// The login route this role's guard redirects to. This table is the single
    /// place the redirect-target contract lives; bank-employee and bank-manager
    /// share the bank entry point.
    pub fn login_path(&self) -> &'static str {
        match self {
            Role::Guest => "/",
            Role::Admin => "/advocate-login",
            Role::Employee => "/employee-login",
            Role::BankEmployee | Role::BankManager => "/bank-login",
        }
    }

    /// Where a successful login lands.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Guest => "/",
            Role::Admin => "/admin-dashboard",
            Role::Employee => "/employee-dashboard",
            Role::BankEmployee => "/bank-employee-dashboard",
            Role::BankManager => "/bank-manager-dashboard",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// The authenticated actor as known to the front end. Lives only in the
/// session store; created at login, destroyed at logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub role: Role,
    pub identifier: String,
    pub authenticated: bool,
    #[serde(default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl Principal {
    pub fn authenticated<S: Into<String>>(role: Role, identifier: S) -> Self {
        Principal {
            role,
            identifier: identifier.into(),
            authenticated: true,
            issued_at: Utc::now(),
        }
    }
}
