//! Order lifecycle integration tests for order-service.
//! Covers the payment-before-delivery guard, terminal-state lock and
//! role-gated cancellation end to end.

mod common;

use common::TestApp;
use serde_json::{json, Value};

async fn transition(
    app: &TestApp,
    invoice_id: &str,
    role: &str,
    status: &str,
    reason: Option<&str>,
) -> reqwest::Response {
    let mut body = json!({ "status": status });
    if let Some(reason) = reason {
        body["reason"] = json!(reason);
    }
    app.post_as(&format!("/invoices/{}/transition", invoice_id), role, &body)
        .await
}

async fn error_of(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse error body");
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn orders_walk_the_normal_flow() {
    let app = TestApp::spawn().await;
    let invoice = app.create_shirt_invoice("Flow", "8091110001").await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = transition(&app, id, "employee", "in_process", None).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "in_process");

    let response = transition(&app, id, "employee", "ready", None).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ready");

    app.cleanup().await;
}

#[tokio::test]
async fn direct_jumps_are_permitted() {
    let app = TestApp::spawn().await;
    let invoice = app.create_shirt_invoice("Jumper", "8091110002").await;
    let id = invoice["invoice_id"].as_str().unwrap();

    // received -> ready without passing through in_process
    let response = transition(&app, id, "employee", "ready", None).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ready");

    app.cleanup().await;
}

#[tokio::test]
async fn unpaid_orders_cannot_be_delivered() {
    let app = TestApp::spawn().await;
    let invoice = app.create_shirt_invoice("Unpaid", "8091110003").await;
    let id = invoice["invoice_id"].as_str().unwrap();

    transition(&app, id, "employee", "ready", None).await;

    let response = transition(&app, id, "employee", "delivered", None).await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(error_of(response).await, "Cannot deliver an unpaid order");

    app.cleanup().await;
}

#[tokio::test]
async fn paid_orders_deliver_and_stamp_the_timestamp() {
    let app = TestApp::spawn().await;
    let invoice = app.create_shirt_invoice("Paid", "8091110004").await;
    let id = invoice["invoice_id"].as_str().unwrap();

    transition(&app, id, "employee", "ready", None).await;

    let response = app
        .post_as(
            &format!("/invoices/{}/payment", id),
            "employee",
            &json!({ "method": "cash" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let response = transition(&app, id, "employee", "delivered", None).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "delivered");
    assert!(!body["delivered_utc"].is_null());

    app.cleanup().await;
}

#[tokio::test]
async fn delivered_orders_are_locked() {
    let app = TestApp::spawn().await;
    let invoice = app.create_shirt_invoice("Locked", "8091110005").await;
    let id = invoice["invoice_id"].as_str().unwrap();

    app.post_as(
        &format!("/invoices/{}/payment", id),
        "employee",
        &json!({ "method": "card" }),
    )
    .await;
    transition(&app, id, "employee", "delivered", None).await;

    let response = transition(&app, id, "manager", "received", None).await;
    assert_eq!(response.status().as_u16(), 400);
    assert!(error_of(response).await.contains("cannot change further"));

    app.cleanup().await;
}

#[tokio::test]
async fn cancelled_orders_are_locked() {
    let app = TestApp::spawn().await;
    let invoice = app.create_shirt_invoice("Gone", "8091110006").await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = transition(&app, id, "manager", "cancelled", Some("customer moved away")).await;
    assert_eq!(response.status().as_u16(), 200);

    let response = transition(&app, id, "employee", "in_process", None).await;
    assert_eq!(response.status().as_u16(), 400);
    assert!(error_of(response).await.contains("cannot change further"));

    app.cleanup().await;
}

#[tokio::test]
async fn only_managers_may_cancel() {
    let app = TestApp::spawn().await;
    let invoice = app.create_shirt_invoice("NoShow", "8091110007").await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = transition(&app, id, "employee", "cancelled", Some("no-show")).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = transition(&app, id, "supervisor", "cancelled", Some("no-show")).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = transition(&app, id, "manager", "cancelled", Some("no-show")).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancelled_reason"], "no-show");
    assert_eq!(body["cancelled_by"], common::TEST_MANAGER_ID);
    assert!(!body["cancelled_utc"].is_null());

    app.cleanup().await;
}

#[tokio::test]
async fn cancellation_requires_a_reason_even_for_managers() {
    let app = TestApp::spawn().await;
    let invoice = app.create_shirt_invoice("Reasonless", "8091110008").await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = transition(&app, id, "manager", "cancelled", None).await;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(error_of(response).await, "A cancellation reason is required");

    let response = transition(&app, id, "manager", "cancelled", Some("   ")).await;
    assert_eq!(response.status().as_u16(), 400);

    // The order is untouched
    let response = app.get_as(&format!("/invoices/{}", id), "employee").await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "received");
    assert!(body["cancelled_utc"].is_null());

    app.cleanup().await;
}

#[tokio::test]
async fn transition_on_unknown_invoice_returns_404() {
    let app = TestApp::spawn().await;

    let response = transition(
        &app,
        "99999999-9999-9999-9999-999999999999",
        "employee",
        "ready",
        None,
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}
