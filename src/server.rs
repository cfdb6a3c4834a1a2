//!
//! advocase HTTP front controller
//! ------------------------------
//! This module defines the Axum-based HTTP surface of the portal.
//!
//! Responsibilities:
//! - Session lifecycle endpoints (login/logout/introspection) per role.
//! - The page front controller: splash gate, route-table resolution, guard
//!   redirects, and view rendering.
//! - Guarded JSON endpoints for application creation, account creation and
//!   signed document URLs, delegating to the remote-data facade.
//! - First-run provisioning of the account catalog and startup inventory logs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::AppError;
use crate::facade::{DataFacade, HttpFacade, MemoryFacade, Mutation, QueryCache};
use crate::gate::{BootstrapGate, GateHandle, SPLASH_DELAY};
use crate::identity::{self, AuthProvider, Decision, LocalAuthProvider, LoginRequest, Principal, Role, RoleGuard, SessionStore};
use crate::records::{Application, ApplicationStatus};
use crate::routes::{Resolution, RouteEntry, ROUTES};
use crate::views::{self, ViewKind};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub provider: Arc<LocalAuthProvider>,
    pub facade: Arc<dyn DataFacade>,
    pub gate: GateHandle,
    /// Per-role dashboard snapshots; stale fetches are discarded at commit.
    pub dashboards: Arc<HashMap<Role, QueryCache>>,
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub http_port: u16,
    pub state_root: String,
    /// `None` skips the splash; the default is the observed 5000 ms.
    pub splash: Option<Duration>,
    /// Base URL of the records service; `None` runs on the in-process facade.
    pub backend_url: Option<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions { http_port: 7980, state_root: "state".to_string(), splash: Some(SPLASH_DELAY), backend_url: None }
    }
}

impl ServerOptions {
    /// Options from `ADVOCASE_*` environment variables, falling back to the
    /// defaults above.
    pub fn from_env() -> Self {
        let mut opts = ServerOptions::default();
        if let Some(port) = std::env::var("ADVOCASE_HTTP_PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            opts.http_port = port;
        }
        if let Ok(root) = std::env::var("ADVOCASE_STATE_FOLDER") {
            if !root.trim().is_empty() {
                opts.state_root = root;
            }
        }
        if let Some(ms) = std::env::var("ADVOCASE_SPLASH_MS").ok().and_then(|v| v.parse::<u64>().ok()) {
            opts.splash = if ms == 0 { None } else { Some(Duration::from_millis(ms)) };
        }
        if let Ok(url) = std::env::var("ADVOCASE_BACKEND_URL") {
            if !url.trim().is_empty() {
                opts.backend_url = Some(url);
            }
        }
        opts
    }
}

fn log_startup_folders(state_root: &str) {
    let cwd = std::env::current_dir().ok();
    let exe = std::env::current_exe().ok();
    let user = std::env::var("USER").or_else(|_| std::env::var("USERNAME")).ok();
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).ok();
    let state_env = std::env::var("ADVOCASE_STATE_FOLDER").ok();

    info!(
        target: "startup",
        "advocase starting. Folder configuration: cwd={:?}, exe={:?}, user={:?}, home={:?}, state_root_param={:?}, ADVOCASE_STATE_FOLDER_env={:?}",
        cwd, exe, user, home, state_root, state_env
    );

    let state_path = FsPath::new(state_root);
    info!(
        target: "startup",
        "Path existence: cwd_exists={}, state_root_exists={}",
        cwd.as_ref().map(|p| p.exists()).unwrap_or(false),
        state_path.exists()
    );
}

/// Start the portal bound to the configured port. Provisions first-run
/// accounts, opens the durable session store, picks the facade, arms the
/// bootstrap gate and mounts all routes.
pub async fn run_with_options(opts: ServerOptions) -> anyhow::Result<()> {
    log_startup_folders(&opts.state_root);

    std::fs::create_dir_all(&opts.state_root)
        .with_context(|| format!("Failed to create or access state root: {}", opts.state_root))?;
    identity::ensure_default_accounts(FsPath::new(&opts.state_root))
        .with_context(|| format!("While provisioning default accounts under: {}", opts.state_root))?;

    let provider = Arc::new(LocalAuthProvider::new(&opts.state_root));
    let store = Arc::new(
        SessionStore::open(FsPath::new(&opts.state_root).join("sessions"))
            .with_context(|| format!("While opening the session store under: {}", opts.state_root))?,
    );

    let facade: Arc<dyn DataFacade> = match &opts.backend_url {
        Some(url) => {
            info!(target: "startup", backend = %url, "using HTTP records facade");
            Arc::new(HttpFacade::new(url).map_err(|e| anyhow::anyhow!(e.to_string()))?)
        }
        None => Arc::new(MemoryFacade::with_demo_data()),
    };

    let gate = match opts.splash {
        Some(delay) => {
            info!(target: "startup", splash_ms = delay.as_millis() as u64, "bootstrap gate armed");
            BootstrapGate::start(delay)
        }
        None => BootstrapGate::ready_now(),
    };

    let dashboards: HashMap<Role, QueryCache> =
        Role::AUTHENTICATED.into_iter().map(|r| (r, QueryCache::new())).collect();

    let app_state = AppState {
        store,
        provider,
        facade,
        gate: gate.handle(),
        dashboards: Arc::new(dashboards),
    };

    let app = Router::new()
        .route("/api/login/{role}", post(login))
        .route("/api/logout/{role}", post(logout))
        .route("/api/session/{role}", get(session_info))
        .route("/api/applications", post(create_application))
        .route("/api/accounts", post(create_account))
        .route("/api/document-url", get(document_url))
        .fallback(front_controller)
        .with_state(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", opts.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    // The gate owner lives until the serve loop ends so its timer is not torn
    // down while requests are flowing.
    drop(gate);
    Ok(())
}

/// Convenience entry point using defaults resolved from the environment.
pub async fn run() -> anyhow::Result<()> {
    run_with_options(ServerOptions::from_env()).await
}

fn app_error_response(e: AppError) -> Response {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"status": "error", "code": e.code_str(), "message": e.message()}))).into_response()
}

fn parse_authenticated_role(slug: &str) -> Result<Role, AppError> {
    match Role::parse_slug(slug) {
        Some(Role::Guest) | None => Err(AppError::user("unknown_role", format!("no such role: {slug}"))),
        Some(role) => Ok(role),
    }
}

/// Guard an API endpoint. APIs answer 401 with the owning login path instead
/// of redirecting, so clients can route the user themselves.
fn api_guard(state: &AppState, role: Role) -> Result<Principal, Response> {
    match RoleGuard::new(role).decide(&state.store) {
        Decision::Allow(p) => Ok(p),
        Decision::Redirect(login) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": "unauthorized", "login": login})),
        )
            .into_response()),
    }
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

async fn login(State(state): State<AppState>, Path(role): Path<String>, Json(payload): Json<LoginPayload>) -> Response {
    let role = match parse_authenticated_role(&role) {
        Ok(r) => r,
        Err(e) => return app_error_response(e),
    };
    let req = LoginRequest { role, username: payload.username, password: payload.password };
    match state.provider.login(&req) {
        Ok(resp) => {
            if let Err(e) = state.store.set(resp.principal.clone()) {
                error!("session write failed: {e}");
                return app_error_response(AppError::io("session_io", e.to_string()));
            }
            (StatusCode::OK, Json(json!({"status": "ok", "redirect": role.dashboard_path()}))).into_response()
        }
        Err(e) => app_error_response(e),
    }
}

async fn logout(State(state): State<AppState>, Path(role): Path<String>) -> Response {
    let role = match parse_authenticated_role(&role) {
        Ok(r) => r,
        Err(e) => return app_error_response(e),
    };
    state.store.clear(role);
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}

async fn session_info(State(state): State<AppState>, Path(role): Path<String>) -> Response {
    let role = match parse_authenticated_role(&role) {
        Ok(r) => r,
        Err(e) => return app_error_response(e),
    };
    match api_guard(&state, role) {
        Ok(p) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "role": p.role, "identifier": p.identifier, "issued_at": p.issued_at})),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

#[derive(Debug, Deserialize)]
struct NewApplication {
    applicant: String,
    bank: String,
    amount: i64,
}

async fn create_application(State(state): State<AppState>, Json(payload): Json<NewApplication>) -> Response {
    let principal = match api_guard(&state, Role::BankEmployee) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if payload.applicant.trim().is_empty() || payload.bank.trim().is_empty() {
        return app_error_response(AppError::user("bad_input", "applicant and bank are required".to_string()));
    }
    if payload.amount <= 0 {
        return app_error_response(AppError::user("bad_input", "amount must be positive".to_string()));
    }
    let mut record = json!({
        "applicant": payload.applicant.trim(),
        "bank": payload.bank.trim(),
        "amount": payload.amount,
        "status": ApplicationStatus::Submitted.as_str(),
        "submitted_at": chrono::Utc::now().to_rfc3339(),
        "created_by": principal.identifier,
    });
    match state.facade.mutate("applications", Mutation::Create { record: record.take() }).await {
        Ok(created) => match Application::from_value(&created) {
            Ok(app) => (StatusCode::CREATED, Json(json!({"status": "ok", "application": app}))).into_response(),
            Err(e) => app_error_response(e),
        },
        Err(e) => app_error_response(e.into()),
    }
}

#[derive(Debug, Deserialize)]
struct NewAccount {
    username: String,
    display_name: String,
    password: String,
    role: String,
}

async fn create_account(State(state): State<AppState>, Json(payload): Json<NewAccount>) -> Response {
    if let Err(resp) = api_guard(&state, Role::Admin) {
        return resp;
    }
    let role = match parse_authenticated_role(&payload.role) {
        Ok(r) => r,
        Err(e) => return app_error_response(e),
    };
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return app_error_response(AppError::user("bad_input", "username and password are required".to_string()));
    }
    match state.provider.add_account(payload.username.trim(), payload.display_name.trim(), &payload.password, role) {
        Ok(()) => (StatusCode::CREATED, Json(json!({"status": "ok", "username": payload.username.trim()}))).into_response(),
        Err(e) => {
            error!("account write failed: {e}");
            app_error_response(AppError::io("accounts_io", e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentUrlParams {
    path: String,
    ttl: Option<u64>,
}

async fn document_url(State(state): State<AppState>, Query(params): Query<DocumentUrlParams>) -> Response {
    // Any authenticated role may fetch a time-limited document link.
    let authenticated = Role::AUTHENTICATED.into_iter().any(|r| api_guard(&state, r).is_ok());
    if !authenticated {
        return (StatusCode::UNAUTHORIZED, Json(json!({"status": "unauthorized"}))).into_response();
    }
    if params.path.trim().is_empty() {
        return app_error_response(AppError::user("bad_input", "path is required".to_string()));
    }
    match state.facade.signed_url(params.path.trim(), params.ttl.unwrap_or(600)).await {
        Ok(url) => (StatusCode::OK, Json(json!({"status": "ok", "url": url}))).into_response(),
        Err(e) => app_error_response(e.into()),
    }
}

/// All page paths land here. While the gate is in splash the route table is
/// never consulted; afterwards resolution follows the table: guard redirects
/// become HTTP 303, the catch-all renders as 404.
async fn front_controller(State(state): State<AppState>, uri: Uri) -> Response {
    if !state.gate.is_ready() {
        return Html(views::render_splash().to_html()).into_response();
    }
    match ROUTES.resolve(uri.path(), &state.store) {
        Resolution::Redirect { location, .. } => Redirect::to(location).into_response(),
        Resolution::Render { entry, principal } => {
            let page = dispatch_view(&state, entry, principal.as_ref(), uri.path()).await;
            let status = if entry.view == ViewKind::NotFound { StatusCode::NOT_FOUND } else { StatusCode::OK };
            (status, Html(page.to_html())).into_response()
        }
    }
}

async fn dispatch_view(state: &AppState, entry: &RouteEntry, principal: Option<&Principal>, path: &str) -> views::Page {
    match &entry.view {
        ViewKind::Landing => views::render_landing(),
        ViewKind::Login { title, roles } => views::render_login(title, roles),
        ViewKind::Attendance => views::render_attendance(),
        ViewKind::Dashboard(role) => match state.dashboards.get(role) {
            Some(cache) => views::render_dashboard(*role, state.facade.as_ref(), cache).await,
            None => views::render_dashboard(*role, state.facade.as_ref(), &QueryCache::new()).await,
        },
        ViewKind::Applications { title, filter, mine } => {
            views::render_applications(title, *filter, *mine, principal, state.facade.as_ref()).await
        }
        ViewKind::Board { collection, title } => views::render_board(collection, title, state.facade.as_ref()).await,
        ViewKind::ApplicationForm => views::render_application_form(),
        ViewKind::AccountForm { role, title } => views::render_account_form(*role, title),
        ViewKind::AccountList { role, title } => views::render_account_list(*role, title, &state.provider),
        ViewKind::Console { title, blurb } => views::render_console(title, blurb),
        ViewKind::NotFound => views::render_not_found(path),
    }
}
