//! Remote-data facade: the narrow boundary every page goes through to fetch,
//! mutate and obtain time-limited file access. Backed by the external records
//! service over HTTP, or by an in-process store when no backend is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::records::{Application, ApplicationStatus};

/// Upper bound on signed-URL lifetime; requested TTLs are clamped to this.
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 3600;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("records service rejected {collection}: {message}")]
    Upstream { collection: String, message: String },
    #[error("records service unreachable: {0}")]
    Transport(String),
    #[error("malformed payload from records service: {0}")]
    BadPayload(String),
    #[error("no such collection: {0}")]
    UnknownCollection(String),
}

impl From<reqwest::Error> for FacadeError {
    fn from(e: reqwest::Error) -> Self {
        FacadeError::Transport(e.to_string())
    }
}

impl From<FacadeError> for AppError {
    fn from(e: FacadeError) -> Self {
        match e {
            FacadeError::UnknownCollection(c) => AppError::not_found("unknown_collection", format!("no such collection: {c}")),
            other => AppError::upstream("facade", other.to_string()),
        }
    }
}

/// Equality filter on one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub equals: String,
}

impl Filter {
    pub fn eq<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Filter { field: field.into(), equals: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub descending: bool,
}

impl Order {
    pub fn desc<F: Into<String>>(field: F) -> Self {
        Order { field: field.into(), descending: true }
    }
}

#[derive(Debug, Clone)]
pub enum Mutation {
    Create { record: Value },
    Update { id: String, patch: Value },
}

/// The portal's only obligation toward the backend: await completion before
/// rendering fetched data, and surface failures as degraded views. No
/// pagination contract is assumed.
#[async_trait]
pub trait DataFacade: Send + Sync {
    async fn query(&self, collection: &str, filters: &[Filter], order: Option<&Order>) -> Result<Vec<Value>, FacadeError>;
    async fn mutate(&self, collection: &str, op: Mutation) -> Result<Value, FacadeError>;
    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, FacadeError>;
}

// --- HTTP-backed facade ---

pub struct HttpFacade {
    base: String,
    client: reqwest::Client,
}

impl HttpFacade {
    pub fn new(base_url: &str) -> Result<Self, FacadeError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| FacadeError::Transport(e.to_string()))?;
        Ok(HttpFacade { base: base_url.trim_end_matches('/').to_string(), client })
    }

    fn collection_url(&self, collection: &str, filters: &[Filter], order: Option<&Order>) -> String {
        let mut url = format!("{}/{}", self.base, urlencoding::encode(collection));
        let mut params: Vec<String> = filters
            .iter()
            .map(|f| format!("{}={}", urlencoding::encode(&f.field), urlencoding::encode(&f.equals)))
            .collect();
        if let Some(o) = order {
            let dir = if o.descending { "desc" } else { "asc" };
            params.push(format!("order={}.{}", urlencoding::encode(&o.field), dir));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    async fn expect_json(resp: reqwest::Response, collection: &str) -> Result<Value, FacadeError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FacadeError::Upstream { collection: collection.to_string(), message: format!("{status}: {message}") });
        }
        resp.json::<Value>().await.map_err(|e| FacadeError::BadPayload(e.to_string()))
    }
}

#[async_trait]
impl DataFacade for HttpFacade {
    async fn query(&self, collection: &str, filters: &[Filter], order: Option<&Order>) -> Result<Vec<Value>, FacadeError> {
        let url = self.collection_url(collection, filters, order);
        debug!(target: "facade", %url, "query");
        let resp = self.client.get(&url).send().await?;
        let body = Self::expect_json(resp, collection).await?;
        body.as_array()
            .cloned()
            .ok_or_else(|| FacadeError::BadPayload(format!("{collection} listing is not an array")))
    }

    async fn mutate(&self, collection: &str, op: Mutation) -> Result<Value, FacadeError> {
        let resp = match op {
            Mutation::Create { record } => {
                let url = format!("{}/{}", self.base, urlencoding::encode(collection));
                self.client.post(&url).json(&record).send().await?
            }
            Mutation::Update { id, patch } => {
                let url = format!("{}/{}/{}", self.base, urlencoding::encode(collection), urlencoding::encode(&id));
                self.client.patch(&url).json(&patch).send().await?
            }
        };
        Self::expect_json(resp, collection).await
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, FacadeError> {
        let ttl = ttl_secs.min(MAX_SIGNED_URL_TTL_SECS);
        let url = format!("{}/storage/sign", self.base);
        let resp = self.client.post(&url).json(&json!({ "path": path, "ttl": ttl })).send().await?;
        let body = Self::expect_json(resp, "storage").await?;
        body.get("url")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| FacadeError::BadPayload("sign response carries no url".to_string()))
    }
}

// --- In-process facade ---

fn value_matches(record: &Value, filter: &Filter) -> bool {
    match record.get(&filter.field) {
        Some(Value::String(s)) => s == &filter.equals,
        Some(Value::Number(n)) => n.to_string() == filter.equals,
        Some(Value::Bool(b)) => b.to_string() == filter.equals,
        _ => false,
    }
}

fn cmp_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering as O;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(O::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => O::Greater,
        (None, Some(_)) => O::Less,
        _ => O::Equal,
    }
}

/// Records held in process behind a lock. Used when no backend URL is
/// configured, and by tests that need a facade they can seed and inspect.
pub struct MemoryFacade {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryFacade {
    pub fn new() -> Self {
        MemoryFacade { collections: RwLock::new(HashMap::new()) }
    }

    /// Empty startup seed: a handful of applications across the status space
    /// plus the side collections the role pages list.
    pub fn with_demo_data() -> Self {
        let facade = MemoryFacade::new();
        let now = Utc::now();
        let seed: Vec<(&str, &str, i64, ApplicationStatus)> = vec![
            ("K. Subramanian", "Canara Bank", 450_000, ApplicationStatus::Submitted),
            ("M. Devi", "State Bank of India", 1_200_000, ApplicationStatus::UnderReview),
            ("A. Farooq", "Indian Bank", 300_000, ApplicationStatus::QueryRaised),
            ("P. Nair", "Canara Bank", 850_000, ApplicationStatus::Approved),
            ("S. Reddy", "Union Bank", 600_000, ApplicationStatus::Completed),
            ("V. Menon", "Indian Bank", 150_000, ApplicationStatus::Rejected),
        ];
        {
            let mut map = facade.collections.write();
            let apps = map.entry("applications".to_string()).or_default();
            for (i, (applicant, bank, amount, status)) in seed.into_iter().enumerate() {
                let mut app = Application {
                    id: format!("app-{:04}", i + 1),
                    applicant: applicant.to_string(),
                    bank: bank.to_string(),
                    amount,
                    status,
                    submitted_at: now - chrono::Duration::days(i as i64),
                }
                .to_value();
                app["created_by"] = Value::String("bank-employee".to_string());
                apps.push(app);
            }
            map.insert(
                "queries".to_string(),
                vec![
                    json!({"id": "q-0001", "application": "app-0003", "raised_by": "admin", "text": "Income proof is older than three months", "open": true}),
                    json!({"id": "q-0002", "application": "app-0002", "raised_by": "employee", "text": "Collateral valuation missing", "open": false}),
                ],
            );
            map.insert(
                "documents".to_string(),
                vec![
                    json!({"id": "d-0001", "application": "app-0002", "name": "sale-deed.pdf", "stage": "with-bank"}),
                    json!({"id": "d-0002", "application": "app-0004", "name": "title-search.pdf", "stage": "verified"}),
                ],
            );
            map.insert(
                "payments".to_string(),
                vec![json!({"id": "p-0001", "application": "app-0005", "amount": 15_000, "mode": "neft", "received": true})],
            );
            map.insert(
                "notifications".to_string(),
                vec![json!({"id": "n-0001", "for": "employee", "text": "Application app-0003 has an open query", "read": false})],
            );
        }
        info!(target: "startup", "empty startup detected, seeded demo dataset into the in-process facade");
        facade
    }

    /// Direct seed hook for tests.
    pub fn insert(&self, collection: &str, record: Value) {
        self.collections.write().entry(collection.to_string()).or_default().push(record);
    }
}

impl Default for MemoryFacade {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataFacade for MemoryFacade {
    async fn query(&self, collection: &str, filters: &[Filter], order: Option<&Order>) -> Result<Vec<Value>, FacadeError> {
        let map = self.collections.read();
        let mut rows: Vec<Value> = map
            .get(collection)
            .map(|rows| rows.iter().filter(|r| filters.iter().all(|f| value_matches(r, f))).cloned().collect())
            .unwrap_or_default();
        if let Some(o) = order {
            rows.sort_by(|a, b| {
                let ord = cmp_values(a.get(&o.field), b.get(&o.field));
                if o.descending { ord.reverse() } else { ord }
            });
        }
        Ok(rows)
    }

    async fn mutate(&self, collection: &str, op: Mutation) -> Result<Value, FacadeError> {
        let mut map = self.collections.write();
        match op {
            Mutation::Create { mut record } => {
                if record.get("id").and_then(Value::as_str).is_none() {
                    record["id"] = Value::String(Uuid::new_v4().to_string());
                }
                map.entry(collection.to_string()).or_default().push(record.clone());
                Ok(record)
            }
            Mutation::Update { id, patch } => {
                let rows = map
                    .get_mut(collection)
                    .ok_or_else(|| FacadeError::UnknownCollection(collection.to_string()))?;
                let row = rows
                    .iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()))
                    .ok_or_else(|| FacadeError::Upstream {
                        collection: collection.to_string(),
                        message: format!("no record with id {id}"),
                    })?;
                if let (Some(obj), Some(patch_obj)) = (row.as_object_mut(), patch.as_object()) {
                    for (k, v) in patch_obj {
                        obj.insert(k.clone(), v.clone());
                    }
                }
                Ok(row.clone())
            }
        }
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, FacadeError> {
        let ttl = ttl_secs.min(MAX_SIGNED_URL_TTL_SECS);
        let expires = Utc::now().timestamp() + ttl as i64;
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(format!("{path}:{expires}"));
        Ok(format!("memory://files/{}?expires={}&token={}", urlencoding::encode(path), expires, token))
    }
}

// --- Stale-response discarding ---

/// Generation-counted snapshot holder. A navigation calls `begin` to obtain a
/// ticket; `begin` invalidates every earlier ticket, so a slow fetch that
/// completes after a newer navigation fails its `commit` and is discarded.
pub struct QueryCache {
    generation: AtomicU64,
    slot: RwLock<Option<(u64, Vec<Value>)>>,
}

impl QueryCache {
    pub fn new() -> Self {
        QueryCache { generation: AtomicU64::new(0), slot: RwLock::new(None) }
    }

    /// Start a fetch; the returned ticket is valid until the next `begin`.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Commit fetched rows. Returns false (and stores nothing) when the
    /// ticket has been superseded.
    pub fn commit(&self, ticket: u64, rows: Vec<Value>) -> bool {
        if self.generation.load(Ordering::SeqCst) != ticket {
            return false;
        }
        *self.slot.write() = Some((ticket, rows));
        true
    }

    pub fn snapshot(&self) -> Option<Vec<Value>> {
        self.slot.read().as_ref().map(|(_, rows)| rows.clone())
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
