//! Tagged record types consumed from the remote-data facade. Construction is
//! validated at the boundary so loosely-shaped payloads are rejected before
//! they reach a view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    QueryRaised,
    Approved,
    Rejected,
    Completed,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::QueryRaised,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under-review",
            ApplicationStatus::QueryRaised => "query-raised",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        Self::ALL.iter().copied().find(|st| st.as_str() == s)
    }

    /// Terminal states land in the past-applications listings.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Completed)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan application as consumed by listing and dashboard views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub applicant: String,
    pub bank: String,
    pub amount: i64,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
}

fn str_field<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> AppResult<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::upstream("bad_record", format!("application record missing string field '{key}'")))
}

impl Application {
    /// Validated construction from an opaque backend payload. Unknown extra
    /// fields are ignored; missing or mistyped required fields reject the
    /// whole record.
    pub fn from_value(v: &Value) -> AppResult<Application> {
        let obj = v
            .as_object()
            .ok_or_else(|| AppError::upstream("bad_record", "application record is not an object".to_string()))?;
        let id = str_field(obj, "id")?.to_string();
        let applicant = str_field(obj, "applicant")?.to_string();
        let bank = str_field(obj, "bank")?.to_string();
        let amount = obj
            .get("amount")
            .and_then(Value::as_i64)
            .ok_or_else(|| AppError::upstream("bad_record", "application record missing integer field 'amount'".to_string()))?;
        if amount < 0 {
            return Err(AppError::upstream("bad_record", format!("application {id} carries a negative amount")));
        }
        let status_raw = str_field(obj, "status")?;
        let status = ApplicationStatus::parse(status_raw)
            .ok_or_else(|| AppError::upstream("bad_record", format!("unknown application status '{status_raw}'")))?;
        let submitted_raw = str_field(obj, "submitted_at")?;
        let submitted_at = DateTime::parse_from_rfc3339(submitted_raw)
            .map_err(|e| AppError::upstream("bad_record", format!("bad submitted_at '{submitted_raw}': {e}")))?
            .with_timezone(&Utc);
        Ok(Application { id, applicant, bank, amount, status, submitted_at })
    }

    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "applicant": self.applicant,
            "bank": self.bank,
            "amount": self.amount,
            "status": self.status.as_str(),
            "submitted_at": self.submitted_at.to_rfc3339(),
        })
    }
}
