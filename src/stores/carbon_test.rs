use reqwest::Method;
use serde_json::json;

use super::*;
use crate::notify::ToastLevel;
use crate::test_helpers::{StubTransport, client_with};

fn store(stub: &std::sync::Arc<StubTransport>) -> (CarbonStore, Notifier) {
    let notifier = Notifier::new();
    let store = CarbonStore::new(CarbonService::new(client_with(stub.clone())), notifier.clone());
    (store, notifier)
}

fn input(entry_type: &str, quantity: f64) -> CarbonEntryInput {
    CarbonEntryInput {
        entry_type: entry_type.into(),
        quantity,
        unit: "kWh".into(),
        date: "2026-04-01".into(),
        description: Some("office".into()),
    }
}

#[tokio::test]
async fn non_positive_quantity_is_rejected_before_sending() {
    let stub = StubTransport::new();
    let (carbon, notifier) = store(&stub);
    let mut toasts = notifier.subscribe();

    for quantity in [0.0, -3.0, f64::NAN] {
        let result = carbon.add_entry(&input("electricity", quantity)).await;
        assert!(!result.success);
    }
    assert!(stub.requests().is_empty());
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Error);
}

#[tokio::test]
async fn added_entry_is_prepended_with_local_estimate_in_message() {
    let stub = StubTransport::new();
    stub.respond(Method::GET, "/carbon/entries", 200, json!([{ "_id": "old", "type": "waste", "quantity": 10 }]));
    stub.respond(Method::POST, "/carbon/entries", 201, json!({ "_id": "new", "type": "electricity", "quantity": 100 }));
    let (carbon, _) = store(&stub);

    assert!(carbon.load_entries().await.success);
    let result = carbon.add_entry(&input("electricity", 100.0)).await;
    assert_eq!(result.message.as_deref(), Some("Entry added (23.30 kg CO2e)."));

    let ids: Vec<String> = carbon
        .snapshot()
        .await
        .entries
        .data
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["new".to_owned(), "old".to_owned()]);
}

#[tokio::test]
async fn delete_removes_entry_locally() {
    let stub = StubTransport::new();
    stub.respond(Method::GET, "/carbon/entries", 200, json!([{ "_id": "e1" }, { "_id": "e2" }]));
    stub.respond(Method::DELETE, "/carbon/entries/e1", 200, json!({ "message": "deleted" }));
    let (carbon, _) = store(&stub);

    carbon.load_entries().await;
    assert!(carbon.delete_entry("e1").await.success);
    let state = carbon.snapshot().await;
    assert_eq!(state.entries.data.len(), 1);
    assert_eq!(state.entries.data[0].id, "e2");
}

#[tokio::test]
async fn dashboard_failure_is_recorded() {
    let stub = StubTransport::new();
    stub.respond(Method::GET, "/carbon/dashboard", 503, serde_json::Value::Null);
    let (carbon, _) = store(&stub);

    let result = carbon.load_dashboard().await;
    assert!(!result.success);
    let state = carbon.snapshot().await;
    assert!(state.dashboard.data.is_none());
    assert_eq!(
        state.dashboard.error.as_deref(),
        Some("The service is temporarily unavailable. Please try again later.")
    );
}

#[tokio::test]
async fn local_summary_uses_loaded_entries() {
    let stub = StubTransport::new();
    stub.respond(
        Method::GET,
        "/carbon/entries",
        200,
        json!([
            { "_id": "a", "type": "electricity", "quantity": 1000, "emissions": 0 },
            { "_id": "b", "type": "diesel", "quantity": 10, "emissions": 30.0 }
        ]),
    );
    let (carbon, _) = store(&stub);
    carbon.load_entries().await;

    let summary = carbon.local_summary().await;
    assert!((summary.total_kg - 263.0).abs() < 1e-9);
    assert!((summary.by_scope[&2] - 233.0).abs() < 1e-9);
    assert!((summary.by_scope[&1] - 30.0).abs() < 1e-9);
}

#[test]
fn preview_multiplies_by_builtin_factor() {
    let estimate = CarbonStore::preview("natural_gas", 50.0);
    assert!((estimate.emissions_kg - 101.0).abs() < 1e-9);
    assert_eq!(estimate.scope, Some(1));
    assert!(CarbonStore::preview("unicorn", 5.0).factor.is_none());
}
