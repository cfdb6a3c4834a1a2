//! Facade-boundary tests: in-process query/mutate semantics, signed-URL
//! clamping, validated record construction, stale-fetch discarding, and the
//! catalog-backed login path.

use anyhow::Result;
use serde_json::json;
use tempfile::tempdir;

use advocase::error::AppError;
use advocase::facade::{DataFacade, Filter, MemoryFacade, Mutation, Order, QueryCache, MAX_SIGNED_URL_TTL_SECS};
use advocase::identity::{ensure_default_accounts, AuthProvider, LocalAuthProvider, LoginRequest, Role};
use advocase::records::Application;

#[tokio::test]
async fn query_filters_and_orders() -> Result<()> {
    let facade = MemoryFacade::new();
    facade.insert("applications", json!({"id": "a", "bank": "Canara Bank", "amount": 10}));
    facade.insert("applications", json!({"id": "b", "bank": "Union Bank", "amount": 30}));
    facade.insert("applications", json!({"id": "c", "bank": "Canara Bank", "amount": 20}));

    let rows = facade
        .query("applications", &[Filter::eq("bank", "Canara Bank")], Some(&Order::desc("amount")))
        .await?;
    let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["c", "a"]);

    // Unknown collections read as empty, not as an error.
    assert!(facade.query("nothing-here", &[], None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_assigns_an_id_and_update_merges() -> Result<()> {
    let facade = MemoryFacade::new();
    let created = facade
        .mutate("applications", Mutation::Create { record: json!({"applicant": "x", "amount": 5}) })
        .await?;
    let id = created["id"].as_str().expect("create assigns an id").to_string();

    let updated = facade
        .mutate("applications", Mutation::Update { id: id.clone(), patch: json!({"amount": 9, "status": "approved"}) })
        .await?;
    assert_eq!(updated["amount"], 9);
    assert_eq!(updated["status"], "approved");
    assert_eq!(updated["applicant"], "x");

    let missing = facade
        .mutate("applications", Mutation::Update { id: "nope".into(), patch: json!({}) })
        .await;
    assert!(missing.is_err());
    Ok(())
}

#[tokio::test]
async fn signed_url_clamps_ttl_and_embeds_the_path() -> Result<()> {
    let facade = MemoryFacade::new();
    let url = facade.signed_url("case files/deed.pdf", 10 * MAX_SIGNED_URL_TTL_SECS).await?;
    assert!(url.contains("case%20files%2Fdeed.pdf"));

    let expires: i64 = url
        .split("expires=")
        .nth(1)
        .and_then(|s| s.split('&').next())
        .and_then(|s| s.parse().ok())
        .expect("expiry in url");
    let horizon = chrono::Utc::now().timestamp() + MAX_SIGNED_URL_TTL_SECS as i64 + 5;
    assert!(expires <= horizon, "ttl must be clamped");
    Ok(())
}

#[test]
fn application_boundary_rejects_malformed_payloads() {
    // Missing required field
    let err = Application::from_value(&json!({"id": "a", "applicant": "x", "bank": "y", "amount": 1, "status": "submitted"}))
        .unwrap_err();
    assert_eq!(err.code_str(), "bad_record");

    // Mistyped amount
    let err = Application::from_value(&json!({
        "id": "a", "applicant": "x", "bank": "y", "amount": "lots",
        "status": "submitted", "submitted_at": "2026-01-05T10:00:00Z"
    }))
    .unwrap_err();
    assert_eq!(err.code_str(), "bad_record");

    // Well-formed payload with extra fields passes
    let app = Application::from_value(&json!({
        "id": "a", "applicant": "x", "bank": "y", "amount": 100,
        "status": "under-review", "submitted_at": "2026-01-05T10:00:00Z",
        "created_by": "someone"
    }))
    .unwrap();
    assert_eq!(app.amount, 100);
}

#[test]
fn stale_fetches_are_discarded() {
    let cache = QueryCache::new();
    let slow = cache.begin();
    let fresh = cache.begin();

    // The newer navigation commits first.
    assert!(cache.commit(fresh, vec![json!({"id": "new"})]));
    // The slow response arrives afterwards and must be a no-op.
    assert!(!cache.commit(slow, vec![json!({"id": "old"})]));

    let rows = cache.snapshot().unwrap();
    assert_eq!(rows[0]["id"], "new");
}

#[test]
fn login_verifies_against_the_catalog() -> Result<()> {
    let tmp = tempdir()?;
    ensure_default_accounts(tmp.path())?;
    let provider = LocalAuthProvider::new(tmp.path());
    provider.add_account("asha", "Asha V.", "s3cr3t!", Role::Admin)?;

    let bad = provider.login(&LoginRequest { role: Role::Admin, username: "asha".into(), password: "wrong".into() });
    assert!(matches!(bad, Err(AppError::Auth { .. })));

    // Right password, wrong role: still invalid credentials.
    let wrong_role = provider.login(&LoginRequest { role: Role::Employee, username: "asha".into(), password: "s3cr3t!".into() });
    assert!(matches!(wrong_role, Err(AppError::Auth { .. })));

    let ok = provider
        .login(&LoginRequest { role: Role::Admin, username: "asha".into(), password: "s3cr3t!".into() })?;
    advocase::tprintln!("issued principal: {:?}", ok.principal);
    assert_eq!(ok.principal.role, Role::Admin);
    assert_eq!(ok.principal.identifier, "asha");
    assert!(ok.principal.authenticated);
    Ok(())
}

#[test]
fn default_accounts_cover_every_authenticated_role() -> Result<()> {
    let tmp = tempdir()?;
    ensure_default_accounts(tmp.path())?;
    let provider = LocalAuthProvider::new(tmp.path());
    for role in Role::AUTHENTICATED {
        let accounts = provider.list_accounts(role)?;
        assert_eq!(accounts.len(), 1, "expected one default account for {role}");
        assert_eq!(accounts[0].username, role.slug());
    }
    Ok(())
}
