use super::principal::{Principal, Role};
use super::session::SessionStore;

/// Outcome of a guard check: admit the request with the proven principal, or
/// redirect to the required role's login route.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allow(Principal),
    Redirect(&'static str),
}

/// Gate for a protected subtree. One generic guard parametrized by role; the
/// four per-role guards of the portal are just the four values of `Role`.
///
/// The decision is never cached: `decide` re-reads the session store each
/// time, so clearing a session takes effect on the very next request. The
/// redirect is produced before any data fetch for the wrapped view.
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard {
    required: Role,
}

impl RoleGuard {
    pub fn new(required: Role) -> Self {
        RoleGuard { required }
    }

    pub fn required(&self) -> Role {
        self.required
    }

    pub fn decide(&self, store: &SessionStore) -> Decision {
        match store.get(self.required) {
            Some(p) if p.authenticated && p.role == self.required => Decision::Allow(p),
            _ => Decision::Redirect(self.required.login_path()),
        }
    }
}
