use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::principal::{Principal, Role};

/// Role-namespaced principal storage. Each role's session is independent:
/// logging into one role neither clears nor validates another. Writes are
/// last-write-wins per namespace and visible immediately; guards read the
/// store on every request.
///
/// In durable mode each namespace persists as one JSON file under the root, so
/// sessions survive a restart and files written by outside tooling are honored
/// on the next cache miss.
pub struct SessionStore {
    root: Option<PathBuf>,
    cache: RwLock<HashMap<Role, Principal>>,
}

impl SessionStore {
    /// Durable store rooted at `root` (created if missing).
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create session root: {}", root.display()))?;
        Ok(SessionStore { root: Some(root), cache: RwLock::new(HashMap::new()) })
    }

    /// Volatile store with no disk backing; used by tests and ephemeral runs.
    pub fn in_memory() -> Self {
        SessionStore { root: None, cache: RwLock::new(HashMap::new()) }
    }

    fn namespace_path(&self, role: Role) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join(format!("{}.session.json", role.slug())))
    }

    /// Persist a principal under its role's namespace.
    pub fn set(&self, principal: Principal) -> Result<()> {
        let role = principal.role;
        if let Some(path) = self.namespace_path(role) {
            let body = serde_json::to_string_pretty(&principal)?;
            std::fs::write(&path, body)
                .with_context(|| format!("Failed to write session file: {}", path.display()))?;
        }
        self.cache.write().insert(role, principal);
        debug!(target: "session", role = %role, "session set");
        Ok(())
    }

    /// The stored principal for `role`, or `None` if never set, cleared, or
    /// unreadable on disk. Unreadable files are logged and treated as absent.
    pub fn get(&self, role: Role) -> Option<Principal> {
        if let Some(p) = self.cache.read().get(&role) {
            return Some(p.clone());
        }
        // Cache miss: honor a session file written by outside code.
        let path = self.namespace_path(role)?;
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(body) => match serde_json::from_str::<Principal>(&body) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(target: "session", role = %role, "ignoring malformed session file: {e}");
                    None
                }
            },
            Err(e) => {
                warn!(target: "session", role = %role, "failed to read session file: {e}");
                None
            }
        }
    }

    /// Remove the principal for `role`. Subsequent `get` returns absent; other
    /// namespaces are untouched.
    pub fn clear(&self, role: Role) {
        self.cache.write().remove(&role);
        if let Some(path) = self.namespace_path(role) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(target: "session", role = %role, "failed to remove session file: {e}"),
            }
        }
        debug!(target: "session", role = %role, "session cleared");
    }
}
