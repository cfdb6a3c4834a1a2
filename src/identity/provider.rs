use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};

use super::principal::{Principal, Role};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub role: Role,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub principal: Principal,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse>;
}

/// One row of the local account catalog. The password is stored as an Argon2
/// PHC string, never in the clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Role,
}

fn accounts_path(state_root: &Path) -> PathBuf {
    state_root.join("accounts.json")
}

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

fn read_accounts(path: &Path) -> Result<Vec<AccountRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read account catalog: {}", path.display()))?;
    let accounts = serde_json::from_str(&body)
        .with_context(|| format!("Malformed account catalog: {}", path.display()))?;
    Ok(accounts)
}

fn write_accounts(path: &Path, accounts: &[AccountRecord]) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).ok();
    }
    let body = serde_json::to_string_pretty(accounts)?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write account catalog: {}", path.display()))?;
    Ok(())
}

/// Provision one account per authenticated role on first run. No-op when the
/// catalog already exists.
pub fn ensure_default_accounts(state_root: &Path) -> Result<()> {
    let path = accounts_path(state_root);
    if path.exists() {
        return Ok(());
    }
    let mut accounts = Vec::new();
    for role in Role::AUTHENTICATED {
        accounts.push(AccountRecord {
            username: role.slug().to_string(),
            display_name: format!("Default {}", role.slug()),
            password_hash: hash_password("advocase")?,
            role,
        });
    }
    write_accounts(&path, &accounts)?;
    info!(target: "startup", "provisioned default accounts for {} roles under {}", accounts.len(), path.display());
    Ok(())
}

/// Catalog-backed credential check. Accounts live in `accounts.json` under the
/// state root, so an operator can manage them with plain tooling.
pub struct LocalAuthProvider {
    state_root: PathBuf,
}

impl LocalAuthProvider {
    pub fn new<P: AsRef<Path>>(state_root: P) -> Self {
        LocalAuthProvider { state_root: state_root.as_ref().to_path_buf() }
    }

    /// Insert or replace the account for `username`.
    pub fn add_account(&self, username: &str, display_name: &str, password: &str, role: Role) -> Result<()> {
        let path = accounts_path(&self.state_root);
        let mut accounts = read_accounts(&path)?;
        accounts.retain(|a| a.username != username);
        accounts.push(AccountRecord {
            username: username.to_string(),
            display_name: display_name.to_string(),
            password_hash: hash_password(password)?,
            role,
        });
        write_accounts(&path, &accounts)?;
        info!(target: "accounts", username, role = %role, "account upserted");
        Ok(())
    }

    /// Accounts holding the given role, hashes omitted from display paths by
    /// the caller.
    pub fn list_accounts(&self, role: Role) -> Result<Vec<AccountRecord>> {
        let accounts = read_accounts(&accounts_path(&self.state_root))?;
        Ok(accounts.into_iter().filter(|a| a.role == role).collect())
    }
}

impl AuthProvider for LocalAuthProvider {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        let accounts = read_accounts(&accounts_path(&self.state_root))
            .map_err(|e| AppError::io("accounts_io", e.to_string()))?;
        // Same failure for unknown user, wrong role and wrong password: the
        // caller learns nothing about which part was wrong.
        let account = accounts
            .iter()
            .find(|a| a.username == req.username && a.role == req.role)
            .ok_or_else(|| AppError::auth("invalid_credentials", "invalid credentials"))?;
        if !verify_password(&account.password_hash, &req.password) {
            return Err(AppError::auth("invalid_credentials", "invalid credentials"));
        }
        info!(target: "auth", username = %req.username, role = %req.role, "login ok");
        Ok(LoginResponse { principal: Principal::authenticated(req.role, account.username.clone()) })
    }
}
