mod common;

use agency_console::api::Method;
use agency_console::cache::{QueryCache, ResourceGroup};
use agency_console::error::Error;
use agency_console::ledger::{self, LedgerFilter};
use agency_console::state::{Agency, ResourceKind};
use agency_console::storage::{FileSessionStore, SessionStore};
use agency_console::workflow::lifecycle::execute;
use agency_console::workflow::validation::EMPTY_TOP_UP;
use agency_console::workflow::{
    ActionDialog, CreateAgencyForm, DialogOutcome, LifecycleKind, SubmitOutcome, Target,
    TopUpState, TopUpWorkflow,
};
use chrono::{TimeZone, Utc};
use common::{agency_json, signed_in, signed_in_with, stored_admin, ScriptedTransport};
use serde_json::json;
use tempfile::TempDir;

fn agency(id: u64, name: &str) -> Agency {
    serde_json::from_value(agency_json(id, name, "2025-01-01T00:00:00Z", 40_000)).unwrap()
}

fn system_json(worker_gb: f64, allotted_gb: f64) -> serde_json::Value {
    json!({
        "workerNodeStorageGB": worker_gb,
        "agencyAllottedGB": allotted_gb,
        "agencyAllottedPercent": allotted_gb / worker_gb * 100.0
    })
}

#[test]
fn test_top_up_happy_path_invalidates_and_refetches() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    transport.ok(json!([agency_json(7, "Acme", "2025-01-01T00:00:00Z", 40_000)]));
    let target = cache.agencies(&mut api).unwrap()[0].clone();
    assert_eq!(target.usage(ResourceKind::Storage).percentage, 60);

    let mut workflow = TopUpWorkflow::new(&target);
    workflow.form_mut().unwrap().select_preset(ResourceKind::Storage, 1).unwrap();
    workflow.form_mut().unwrap().amount = 25.0;

    transport.ok(system_json(500.0, 100.0));
    transport.ok(agency_json(7, "Acme", "2025-01-01T00:00:00Z", 41_000));
    let outcome = workflow.submit_checked(&mut api, &mut cache).unwrap();
    let updated = match outcome {
        SubmitOutcome::Submitted(a) => a,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(updated.storage, 41_000);
    assert!(matches!(workflow.state(), TopUpState::Submitted(_)));

    for group in [
        ResourceGroup::Agencies,
        ResourceGroup::DashboardStats,
        ResourceGroup::TopUpHistory,
        ResourceGroup::SystemStorage,
    ] {
        assert!(cache.is_stale(group), "{} not invalidated", group);
    }

    let put = &transport.sent()[2];
    assert_eq!(put.method, Method::Put);
    assert_eq!(put.path, "/user/topup");
    let body = put.body.as_ref().unwrap();
    assert_eq!(body["id"], 7);
    assert_eq!(body["top_up"], true);
    assert_eq!(body["storage"], 1000);
    assert_eq!(body["token_count"], 0);
    assert_eq!(body["currency"], "USD");

    transport.ok(json!([agency_json(7, "Acme", "2025-01-01T00:00:00Z", 41_000)]));
    let refreshed = cache.dashboard_stats(&mut api).unwrap();
    assert_eq!(refreshed.total_agencies, 1);
    assert!(!cache.is_stale(ResourceGroup::Agencies));
    assert_eq!(
        transport.sent_paths(),
        vec![
            "/user/getAgency/1",
            "/user/systemStorage",
            "/user/topup",
            "/user/getAgency/1"
        ]
    );
}

#[test]
fn test_zero_top_up_never_reaches_network() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let mut workflow = TopUpWorkflow::new(&agency(7, "Acme"));
    workflow.form_mut().unwrap().amount = 10.0;
    let err = workflow.submit_checked(&mut api, &mut cache).unwrap_err();

    assert_eq!(err.to_string(), EMPTY_TOP_UP);
    assert_eq!(workflow.last_error(), Some(EMPTY_TOP_UP));
    assert!(transport.sent().is_empty());
}

#[test]
fn test_overdraft_requires_confirmation_before_sending() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let mut workflow = TopUpWorkflow::new(&agency(7, "Acme"));
    workflow.form_mut().unwrap().set(ResourceKind::Storage, 50_000);

    // 120 GB worker, 100 GB allotted: 20 000 MB left.
    transport.ok(system_json(120.0, 100.0));
    let outcome = workflow.submit_checked(&mut api, &mut cache).unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::NeedsConfirmation {
            requested_mb: 50_000,
            available_mb: 20_000
        }
    );
    assert_eq!(transport.sent_paths(), vec!["/user/systemStorage"]);
    assert!(workflow.form_mut().is_err());

    workflow.back_to_editing();
    assert_eq!(workflow.state(), &TopUpState::Editing);
    assert_eq!(workflow.form().storage, 50_000);

    workflow.submit(&mut api, &mut cache, Some(20_000)).unwrap();
    transport.ok(agency_json(7, "Acme", "2025-01-01T00:00:00Z", 90_000));
    let outcome = workflow.proceed(&mut api, &mut cache).unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
    assert_eq!(transport.sent_paths(), vec!["/user/systemStorage", "/user/topup"]);
}

#[test]
fn test_failed_top_up_keeps_form_values() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let mut workflow = TopUpWorkflow::new(&agency(7, "Acme"));
    workflow.form_mut().unwrap().set(ResourceKind::Tokens, 50_000);
    workflow.form_mut().unwrap().amount = 12.5;

    transport.respond(500, json!({"message": "Quota service down"}));
    let err = workflow.submit_checked(&mut api, &mut cache).unwrap_err();

    assert_eq!(err.to_string(), "Quota service down");
    assert_eq!(workflow.state(), &TopUpState::Editing);
    assert_eq!(workflow.form().tokens, 50_000);
    assert_eq!(workflow.form().amount, 12.5);
    assert_eq!(workflow.last_error(), Some("Quota service down"));
    assert!(!workflow.is_pending());
    assert!(!cache.is_stale(ResourceGroup::Agencies));
}

#[test]
fn test_unknown_capacity_still_sends_top_up() {
    let transport = ScriptedTransport::new();
    let (mut api, redirects) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let mut workflow = TopUpWorkflow::new(&agency(7, "Acme"));
    workflow.form_mut().unwrap().set(ResourceKind::Storage, 900_000);

    transport.respond(500, json!({"message": "metrics offline"}));
    transport.ok(agency_json(7, "Acme", "2025-01-01T00:00:00Z", 940_000));
    let outcome = workflow.submit_checked(&mut api, &mut cache).unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));

    let mut workflow = TopUpWorkflow::new(&agency(7, "Acme"));
    workflow.form_mut().unwrap().set(ResourceKind::Storage, 900_000);
    transport.fail_network();
    transport.ok(agency_json(7, "Acme", "2025-01-01T00:00:00Z", 1_840_000));
    let outcome = workflow.submit_checked(&mut api, &mut cache).unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));

    assert_eq!(
        transport.sent_paths(),
        vec![
            "/user/systemStorage",
            "/user/topup",
            "/user/systemStorage",
            "/user/topup"
        ]
    );
    assert_eq!(redirects.get(), 0);
}

#[test]
fn test_unauthorized_capacity_fetch_stops_top_up() {
    let transport = ScriptedTransport::new();
    let (mut api, redirects) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let mut workflow = TopUpWorkflow::new(&agency(7, "Acme"));
    workflow.form_mut().unwrap().set(ResourceKind::Storage, 1000);

    transport.respond(401, json!({"message": "jwt expired"}));
    let err = workflow.submit_checked(&mut api, &mut cache).unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(transport.sent_paths(), vec!["/user/systemStorage"]);
    assert_eq!(workflow.state(), &TopUpState::Editing);
    assert!(!api.session().is_authenticated());
    assert_eq!(redirects.get(), 1);
    assert!(!cache.is_stale(ResourceGroup::Agencies));
}

#[test]
fn test_logical_failure_on_http_200_is_an_error() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let mut workflow = TopUpWorkflow::new(&agency(7, "Acme"));
    workflow.form_mut().unwrap().set(ResourceKind::Images, 35);

    transport.respond(200, json!({"status": false, "message": "Agency is suspended"}));
    let err = workflow.submit_checked(&mut api, &mut cache).unwrap_err();
    assert!(matches!(err, Error::Rejected(ref m) if m == "Agency is suspended"));
    assert_eq!(workflow.state(), &TopUpState::Editing);
}

#[test]
fn test_double_confirm_sends_one_delete() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let mut dialog = ActionDialog::open(
        Target::from(&agency(7, "Acme")),
        LifecycleKind::Delete,
    );
    let permit = dialog.begin().expect("first confirm gets the permit");

    // Second click while the first request is in flight.
    assert_eq!(
        dialog.confirm(&mut api, &mut cache).unwrap(),
        DialogOutcome::Ignored
    );
    assert!(dialog.begin().is_none());
    assert!(!dialog.cancel());
    assert_eq!(dialog.confirm_label(), "Processing...");

    transport.ok(serde_json::Value::Null);
    let result = execute(&mut api, &mut cache, &permit);
    assert_eq!(dialog.finish(result), DialogOutcome::Completed);
    assert!(!dialog.is_open());

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::Delete);
    assert_eq!(sent[0].path, "/user/delete/7");
    assert!(cache.is_stale(ResourceGroup::Agencies));
}

#[test]
fn test_unauthorized_confirm_closes_dialog() {
    let transport = ScriptedTransport::new();
    let (mut api, redirects) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let mut dialog = ActionDialog::open(
        Target::from(&agency(7, "Acme")),
        LifecycleKind::Suspend,
    );
    transport.respond(401, json!({"message": "jwt expired"}));
    let err = dialog.confirm(&mut api, &mut cache).unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert!(!dialog.is_open());
    assert!(!dialog.is_pending());
    assert_eq!(redirects.get(), 1);
    assert!(!cache.is_stale(ResourceGroup::Agencies));
    assert_eq!(transport.sent_paths(), vec!["/user/suspend/7"]);
}

#[test]
fn test_website_suspend_failure_keeps_dialog_open() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    transport.ok(json!({
        "agency_data": {},
        "customers": [{
            "customer": {"id": 3, "name": "Bakery"},
            "sites": [{"id": 11, "websiteName": "Bakery Home", "host": "bakery.example.com", "is_active": true, "home_page_id": 9}]
        }]
    }));
    let site = cache
        .websites(&mut api, 7)
        .unwrap()
        .find_site(11)
        .cloned()
        .unwrap();

    let kind = LifecycleKind::toggle_for(site.is_active);
    assert_eq!(kind, LifecycleKind::Suspend);
    let mut dialog = ActionDialog::open(Target::from(&site), kind);

    transport.respond(500, json!({}));
    let outcome = dialog.confirm(&mut api, &mut cache).unwrap();
    assert_eq!(
        outcome,
        DialogOutcome::Failed("Something went wrong. Please try again.".to_string())
    );
    assert!(dialog.is_open());
    assert!(!cache.is_stale(ResourceGroup::Websites));

    transport.ok(serde_json::Value::Null);
    assert_eq!(
        dialog.confirm(&mut api, &mut cache).unwrap(),
        DialogOutcome::Completed
    );
    assert!(cache.is_stale(ResourceGroup::Websites));
    assert_eq!(
        transport.sent_paths(),
        vec!["/user/getCustomer/7", "/site/suspend/11", "/site/suspend/11"]
    );
}

#[test]
fn test_unauthorized_clears_file_session_and_redirects_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let mut store = FileSessionStore::new(path.clone());
    store.save(&stored_admin()).unwrap();
    assert!(path.exists());

    let transport = ScriptedTransport::new();
    let (mut api, redirects) = signed_in_with(&transport, Box::new(store));
    let mut cache = QueryCache::new();
    assert!(api.session().is_authenticated());

    transport.respond(401, json!({"message": "jwt expired"}));
    transport.respond(401, json!({"message": "jwt expired"}));

    let err = cache.agencies(&mut api).unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert!(!api.session().is_authenticated());
    assert!(!path.exists());
    assert_eq!(redirects.get(), 1);

    // A second rejected request has nothing left to clear.
    let err = cache.system_storage(&mut api).unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(redirects.get(), 1);

    // Calls that need the operator id fail locally now.
    let err = api.list_agencies().unwrap_err();
    assert!(matches!(err, Error::NotLoggedIn));
    assert_eq!(transport.sent().len(), 2);
}

#[test]
fn test_bad_login_does_not_expire_session() {
    let transport = ScriptedTransport::new();
    let (mut api, redirects) = signed_in(&transport);

    transport.respond(401, json!({"message": "Invalid email or password"}));
    let err = api.login("ops@platform.test", "wrong").unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(api.session().is_authenticated());
    assert_eq!(redirects.get(), 0);
}

#[test]
fn test_create_agency_registers_under_operator() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    let form = CreateAgencyForm {
        name: "Bright Media".to_string(),
        email: "hello@bright.test".to_string(),
        phone: "555-0101".to_string(),
        storage: 5_000,
        tokens: 100_000,
        websites: 5,
        images: 100,
        amount: 99.0,
        ..CreateAgencyForm::default()
    };

    transport.ok(agency_json(12, "Bright Media", "2025-03-01T00:00:00Z", 5_000));
    let created = form.submit(&mut api, &mut cache).unwrap();
    assert_eq!(created.id, 12);

    let sent = transport.sent();
    assert_eq!(sent[0].method, Method::Post);
    assert_eq!(sent[0].path, "/user/register");
    let body = sent[0].body.as_ref().unwrap();
    assert_eq!(body["user_role"], "Agency");
    assert_eq!(body["parent_user_id"], 1);
    assert_eq!(body["token_count"], 100_000);
    assert!(cache.is_stale(ResourceGroup::Agencies));
}

#[test]
fn test_ledger_labels_unknown_agency_by_id() {
    let transport = ScriptedTransport::new();
    let (mut api, _) = signed_in(&transport);
    let mut cache = QueryCache::new();

    transport.ok(json!([
        {"id": 1, "user_mst_id": 7, "created_at": "2025-06-28T10:00:00Z", "storage": 1500, "amount": 20.0, "currency": "USD"},
        {"id": 2, "user_mst_id": "42", "created_at": "2025-06-01T10:00:00Z", "token_count": 20000, "amount": 1000.0, "currency": "INR", "status": "pending"}
    ]));
    transport.ok(json!([agency_json(7, "Acme", "2025-01-01T00:00:00Z", 40_000)]));

    let records = cache.history(&mut api).unwrap().to_vec();
    let agencies = cache.agencies(&mut api).unwrap().to_vec();
    let now = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
    let view = ledger::build(&records, &agencies, &LedgerFilter::default(), now);

    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].agency_name, "Acme");
    assert_eq!(view.rows[0].record.resource_labels(), vec!["+1.5GB"]);
    assert_eq!(view.rows[1].agency_name, "ID: 42");
    assert_eq!(view.rows[1].record.resource_labels(), vec!["+20K tokens"]);
    assert!((view.summary.total_value_usd - 32.0).abs() < 1e-9);
    assert_eq!(view.summary.active_agencies, 1);
    assert_eq!(
        transport.sent_paths(),
        vec!["/user/getAgencyHistory/1", "/user/getAgency/1"]
    );
}
