//! Central identity and session management for the portal.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod guard;

pub use principal::{Principal, Role};
pub use session::SessionStore;
pub use provider::{ensure_default_accounts, hash_password, verify_password, AccountRecord, AuthProvider, LocalAuthProvider, LoginRequest, LoginResponse};
pub use guard::{Decision, RoleGuard};
