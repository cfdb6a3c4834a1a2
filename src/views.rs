//! Page renderables. Every route entry points at one `ViewKind`; the front
//! controller dispatches to the renderers here after the guard has decided.
//! Data-bound renderers await the facade and degrade to a notice plus an
//! empty state when it fails; they never crash a request.

use serde_json::Value;
use tracing::warn;

use crate::error::{AppError, Notice, NoticeLevel};
use crate::facade::{DataFacade, FacadeError, Filter, Order, QueryCache};
use crate::identity::{LocalAuthProvider, Principal, Role};
use crate::records::{Application, ApplicationStatus};

/// What a route renders. Opaque to the router; interpreted only here.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewKind {
    Landing,
    Login { title: &'static str, roles: &'static [Role] },
    Attendance,
    Dashboard(Role),
    /// Validated application listing; `mine` narrows to records created by
    /// the signed-in principal.
    Applications { title: &'static str, filter: Option<(&'static str, &'static str)>, mine: bool },
    /// Opaque record listing straight off the facade.
    Board { collection: &'static str, title: &'static str },
    ApplicationForm,
    AccountForm { role: Role, title: &'static str },
    AccountList { role: Role, title: &'static str },
    Console { title: &'static str, blurb: &'static str },
    NotFound,
}

pub struct Page {
    pub title: String,
    pub notices: Vec<Notice>,
    pub body: String,
}

impl Page {
    pub fn new<T: Into<String>, B: Into<String>>(title: T, body: B) -> Self {
        Page { title: title.into(), notices: Vec::new(), body: body.into() }
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    pub fn to_html(&self) -> String {
        let mut banners = String::new();
        for n in &self.notices {
            let class = match n.level {
                NoticeLevel::Info => "notice notice-info",
                NoticeLevel::Success => "notice notice-success",
                NoticeLevel::Error => "notice notice-error",
            };
            banners.push_str(&format!(
                "<div class=\"{}\">{} <a href=\"#\" onclick=\"this.parentElement.remove();return false\">dismiss</a></div>\n",
                class,
                esc(&n.message)
            ));
        }
        format!(
            "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title} — Advocase</title></head>\n<body>\n{banners}<main>\n{body}\n</main>\n</body></html>\n",
            title = esc(&self.title),
            banners = banners,
            body = self.body
        )
    }
}

pub fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_splash() -> Page {
    Page::new(
        "Loading",
        "<meta http-equiv=\"refresh\" content=\"2\">\n<h1>Advocase</h1><p>Preparing your workspace…</p>",
    )
}

pub fn render_landing() -> Page {
    Page::new(
        "Welcome",
        "<h1>Advocase</h1>\n<p>Case management for advocates and partner banks.</p>\n<ul>\n\
         <li><a href=\"/advocate-login\">Advocate office sign in</a></li>\n\
         <li><a href=\"/employee-login\">Employee sign in</a></li>\n\
         <li><a href=\"/bank-login\">Bank sign in</a></li>\n\
         <li><a href=\"/attendance\">Attendance</a></li>\n</ul>",
    )
}

pub fn render_login(title: &str, roles: &[Role]) -> Page {
    let role_input = if roles.len() == 1 {
        format!("<input type=\"hidden\" name=\"role\" value=\"{}\">", roles[0].slug())
    } else {
        let options: String = roles
            .iter()
            .map(|r| format!("<option value=\"{slug}\">{slug}</option>", slug = r.slug()))
            .collect();
        format!("<label>Sign in as <select name=\"role\">{options}</select></label>")
    };
    let body = format!(
        "<h1>{title}</h1>\n<form id=\"login\">\n{role_input}\n\
         <label>Username <input name=\"username\" autocomplete=\"username\"></label>\n\
         <label>Password <input name=\"password\" type=\"password\" autocomplete=\"current-password\"></label>\n\
         <button type=\"submit\">Sign in</button>\n</form>\n\
         <p id=\"login-error\" hidden>Invalid credentials.</p>\n\
         <script>\n\
         document.getElementById('login').addEventListener('submit', async (ev) => {{\n\
           ev.preventDefault();\n\
           const data = Object.fromEntries(new FormData(ev.target));\n\
           const resp = await fetch('/api/login/' + data.role, {{\n\
             method: 'POST', headers: {{'content-type': 'application/json'}},\n\
             body: JSON.stringify({{username: data.username, password: data.password}})\n\
           }});\n\
           if (resp.ok) {{ const out = await resp.json(); location.assign(out.redirect); }}\n\
           else {{ document.getElementById('login-error').hidden = false; }}\n\
         }});\n\
         </script>",
        title = esc(title),
        role_input = role_input
    );
    Page::new(title.to_string(), body)
}

pub fn render_attendance() -> Page {
    Page::new(
        "Attendance",
        "<h1>Attendance</h1>\n<p>Office attendance is recorded at the front desk terminal. \
         Signed-in employees can review their log under <a href=\"/employee/attendance\">their attendance page</a>.</p>",
    )
}

pub fn render_console(title: &str, blurb: &str) -> Page {
    Page::new(title.to_string(), format!("<h1>{}</h1>\n<p>{}</p>", esc(title), esc(blurb)))
}

pub fn render_not_found(path: &str) -> Page {
    Page::new(
        "Not found",
        format!("<h1>404</h1>\n<p>No page at <code>{}</code>.</p>\n<p><a href=\"/\">Back to the start</a></p>", esc(path)),
    )
}

fn degraded(title: &str, e: FacadeError) -> Page {
    warn!(target: "views", error = %e, "facade call failed, rendering degraded view");
    let notice = AppError::from(e).notice();
    Page::new(title.to_string(), format!("<h1>{}</h1>\n<p>No records to show.</p>", esc(title))).with_notice(notice)
}

fn applications_table(apps: &[Application]) -> String {
    if apps.is_empty() {
        return "<p>No records to show.</p>".to_string();
    }
    let mut rows = String::new();
    for a in apps {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            esc(&a.id),
            esc(&a.applicant),
            esc(&a.bank),
            a.amount,
            a.status,
            a.submitted_at.format("%Y-%m-%d")
        ));
    }
    format!(
        "<table>\n<thead><tr><th>Id</th><th>Applicant</th><th>Bank</th><th>Amount</th><th>Status</th><th>Submitted</th></tr></thead>\n<tbody>\n{rows}</tbody>\n</table>"
    )
}

/// Validate boundary payloads into `Application`s; malformed records are
/// dropped with a warning rather than poisoning the whole listing.
fn validated_applications(rows: &[Value]) -> Vec<Application> {
    let mut apps = Vec::with_capacity(rows.len());
    for row in rows {
        match Application::from_value(row) {
            Ok(a) => apps.push(a),
            Err(e) => warn!(target: "views", error = %e, "discarding malformed application record"),
        }
    }
    apps
}

pub async fn render_dashboard(role: Role, facade: &dyn DataFacade, cache: &QueryCache) -> Page {
    let title = match role {
        Role::Admin => "Admin Dashboard",
        Role::Employee => "Employee Dashboard",
        Role::BankEmployee => "Bank Employee Dashboard",
        Role::BankManager => "Bank Manager Dashboard",
        Role::Guest => "Dashboard",
    };
    let ticket = cache.begin();
    let rows = match facade.query("applications", &[], Some(&Order::desc("submitted_at"))).await {
        Ok(rows) => {
            // A fetch that lost the race to a newer navigation is a no-op;
            // whatever the newer fetch committed stays in place.
            cache.commit(ticket, rows);
            cache.snapshot().unwrap_or_default()
        }
        Err(e) => match cache.snapshot() {
            Some(rows) => {
                warn!(target: "views", error = %e, "facade call failed, serving last snapshot");
                rows
            }
            None => return degraded(title, e),
        },
    };
    let apps = validated_applications(&rows);
    let mut tiles = String::new();
    for status in ApplicationStatus::ALL {
        let count = apps.iter().filter(|a| a.status == status).count();
        tiles.push_str(&format!("<li>{status}: <strong>{count}</strong></li>\n"));
    }
    let recent: Vec<Application> = apps.into_iter().take(10).collect();
    let body = format!(
        "<h1>{}</h1>\n<ul class=\"tiles\">\n{}</ul>\n<h2>Recent applications</h2>\n{}",
        esc(title),
        tiles,
        applications_table(&recent)
    );
    Page::new(title.to_string(), body)
}

pub async fn render_applications(
    title: &str,
    static_filter: Option<(&str, &str)>,
    mine: bool,
    principal: Option<&Principal>,
    facade: &dyn DataFacade,
) -> Page {
    let mut filters = Vec::new();
    if let Some((field, value)) = static_filter {
        filters.push(Filter::eq(field, value));
    }
    if mine {
        if let Some(p) = principal {
            filters.push(Filter::eq("created_by", p.identifier.clone()));
        }
    }
    match facade.query("applications", &filters, Some(&Order::desc("submitted_at"))).await {
        Ok(rows) => {
            let apps = validated_applications(&rows);
            Page::new(title.to_string(), format!("<h1>{}</h1>\n{}", esc(title), applications_table(&apps)))
        }
        Err(e) => degraded(title, e),
    }
}

fn board_table(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "<p>No records to show.</p>".to_string();
    }
    // Column set: keys of the first record, in stable sorted order.
    let mut columns: Vec<String> = rows[0].as_object().map(|o| o.keys().cloned().collect()).unwrap_or_default();
    columns.sort();
    let head: String = columns.iter().map(|c| format!("<th>{}</th>", esc(c))).collect();
    let mut body = String::new();
    for row in rows {
        body.push_str("<tr>");
        for c in &columns {
            let cell = match row.get(c) {
                Some(Value::String(s)) => esc(s),
                Some(other) => esc(&other.to_string()),
                None => String::new(),
            };
            body.push_str(&format!("<td>{cell}</td>"));
        }
        body.push_str("</tr>\n");
    }
    format!("<table>\n<thead><tr>{head}</tr></thead>\n<tbody>\n{body}</tbody>\n</table>")
}

pub async fn render_board(collection: &str, title: &str, facade: &dyn DataFacade) -> Page {
    match facade.query(collection, &[], None).await {
        Ok(rows) => Page::new(title.to_string(), format!("<h1>{}</h1>\n{}", esc(title), board_table(&rows))),
        Err(e) => degraded(title, e),
    }
}

pub fn render_application_form() -> Page {
    Page::new(
        "Create Application",
        "<h1>Create Application</h1>\n<form id=\"create\">\n\
         <label>Applicant <input name=\"applicant\"></label>\n\
         <label>Bank <input name=\"bank\"></label>\n\
         <label>Amount <input name=\"amount\" type=\"number\" min=\"1\"></label>\n\
         <button type=\"submit\">Submit</button>\n</form>\n\
         <p id=\"create-result\" hidden></p>\n\
         <script>\n\
         document.getElementById('create').addEventListener('submit', async (ev) => {\n\
           ev.preventDefault();\n\
           const data = Object.fromEntries(new FormData(ev.target));\n\
           data.amount = Number(data.amount);\n\
           const resp = await fetch('/api/applications', {\n\
             method: 'POST', headers: {'content-type': 'application/json'}, body: JSON.stringify(data)\n\
           });\n\
           const out = document.getElementById('create-result');\n\
           out.hidden = false;\n\
           out.textContent = resp.ok ? 'Application submitted.' : 'Could not submit the application.';\n\
         });\n\
         </script>",
    )
}

pub fn render_account_form(role: Role, title: &str) -> Page {
    let body = format!(
        "<h1>{title}</h1>\n<form id=\"account\">\n\
         <input type=\"hidden\" name=\"role\" value=\"{slug}\">\n\
         <label>Username <input name=\"username\"></label>\n\
         <label>Display name <input name=\"display_name\"></label>\n\
         <label>Password <input name=\"password\" type=\"password\"></label>\n\
         <button type=\"submit\">Create</button>\n</form>\n\
         <p id=\"account-result\" hidden></p>\n\
         <script>\n\
         document.getElementById('account').addEventListener('submit', async (ev) => {{\n\
           ev.preventDefault();\n\
           const data = Object.fromEntries(new FormData(ev.target));\n\
           const resp = await fetch('/api/accounts', {{\n\
             method: 'POST', headers: {{'content-type': 'application/json'}}, body: JSON.stringify(data)\n\
           }});\n\
           const out = document.getElementById('account-result');\n\
           out.hidden = false;\n\
           out.textContent = resp.ok ? 'Account created.' : 'Could not create the account.';\n\
         }});\n\
         </script>",
        title = esc(title),
        slug = role.slug()
    );
    Page::new(title.to_string(), body)
}

pub fn render_account_list(role: Role, title: &str, provider: &LocalAuthProvider) -> Page {
    match provider.list_accounts(role) {
        Ok(accounts) => {
            let rows: String = accounts
                .iter()
                .map(|a| format!("<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n", esc(&a.username), esc(&a.display_name), a.role))
                .collect();
            let table = if accounts.is_empty() {
                "<p>No accounts yet.</p>".to_string()
            } else {
                format!("<table>\n<thead><tr><th>Username</th><th>Display name</th><th>Role</th></tr></thead>\n<tbody>\n{rows}</tbody>\n</table>")
            };
            Page::new(title.to_string(), format!("<h1>{}</h1>\n{}", esc(title), table))
        }
        Err(e) => {
            warn!(target: "views", error = %e, "account catalog unreadable");
            Page::new(title.to_string(), format!("<h1>{}</h1>\n<p>No accounts to show.</p>", esc(title)))
                .with_notice(Notice::error("The account catalog could not be read.".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(esc("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
    }

    #[test]
    fn page_html_carries_notices() {
        let html = Page::new("T", "<h1>T</h1>").with_notice(Notice::error("boom")).to_html();
        assert!(html.contains("notice-error"));
        assert!(html.contains("boom"));
    }
}
