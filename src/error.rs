//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the HTTP surface and the
//! page renderers, along with the transient-notice mapping shown to users.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Auth { code: String, message: String },
    Forbidden { code: String, message: String },
    Upstream { code: String, message: String },
    Io { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Upstream { code, .. }
            | AppError::Io { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Upstream { message, .. }
            | AppError::Io { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn auth<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn upstream<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Upstream { code: code.into(), message: msg.into() } }
    pub fn io<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Io { code: code.into(), message: msg.into() } }
    pub fn internal<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Upstream { .. } => 502,
            AppError::Io { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }

    /// Map to the transient notice a degraded page shows in place of a crash.
    /// Auth problems are never surfaced this way: guards recover them with a redirect.
    pub fn notice(&self) -> Notice {
        match self {
            AppError::UserInput { message, .. } => Notice::error(message.clone()),
            AppError::NotFound { message, .. } => Notice::info(message.clone()),
            AppError::Auth { .. } | AppError::Forbidden { .. } => Notice::info("Please sign in again.".to_string()),
            AppError::Upstream { .. } | AppError::Io { .. } => {
                Notice::error("The records service is unavailable. Showing what we have.".to_string())
            }
            AppError::Internal { .. } => Notice::error("Something went wrong on our side.".to_string()),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

/// Transient, dismissible notification rendered at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

impl Notice {
    pub fn info<S: Into<String>>(msg: S) -> Self { Notice { level: NoticeLevel::Info, message: msg.into() } }
    pub fn success<S: Into<String>>(msg: S) -> Self { Notice { level: NoticeLevel::Success, message: msg.into() } }
    pub fn error<S: Into<String>>(msg: S) -> Self { Notice { level: NoticeLevel::Error, message: msg.into() } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
        assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
        assert_eq!(AppError::auth("auth", "no").http_status(), 401);
        assert_eq!(AppError::forbidden("forbidden", "blocked").http_status(), 403);
        assert_eq!(AppError::upstream("upstream", "down").http_status(), 502);
        assert_eq!(AppError::io("io", "io").http_status(), 503);
        assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
    }

    #[test]
    fn notice_mapping() {
        let n = AppError::upstream("upstream", "records service down").notice();
        assert_eq!(n.level, NoticeLevel::Error);

        // Session problems surface as a soft prompt, not an error banner
        let n = AppError::auth("auth", "expired").notice();
        assert_eq!(n.level, NoticeLevel::Info);

        let n = AppError::user("bad_input", "amount must be positive").notice();
        assert_eq!(n.message, "amount must be positive");
    }
}
