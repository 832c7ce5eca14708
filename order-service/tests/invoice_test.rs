//! Invoice creation and retrieval tests for order-service.

mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_invoice_returns_received_order_with_reference_totals() {
    let app = TestApp::spawn().await;

    let invoice = app.create_shirt_invoice("Ana Reyes", "8095551234").await;

    assert_eq!(invoice["invoice_number"], "FAC-001");
    assert_eq!(invoice["status"], "received");
    assert_eq!(invoice["payment_method"], "pending");
    assert_eq!(invoice["paid"], false);
    // 2 × 85.00 at 18% tax
    assert_eq!(invoice["subtotal"], "170.00");
    assert_eq!(invoice["tax"], "30.60");
    assert_eq!(invoice["total"], "200.60");
    assert_eq!(invoice["customer_name"], "Ana Reyes");
    assert_eq!(invoice["lines"].as_array().unwrap().len(), 1);
    assert_eq!(invoice["lines"][0]["description"], "Shirt");
    assert_eq!(invoice["lines"][0]["unit_price"], "85.00");

    app.cleanup().await;
}

#[tokio::test]
async fn invoice_numbers_increase_sequentially() {
    let app = TestApp::spawn().await;

    let first = app.create_shirt_invoice("First", "8090000001").await;
    let second = app.create_shirt_invoice("Second", "8090000002").await;
    let third = app.create_shirt_invoice("Third", "8090000003").await;

    assert_eq!(first["invoice_number"], "FAC-001");
    assert_eq!(second["invoice_number"], "FAC-002");
    assert_eq!(third["invoice_number"], "FAC-003");

    app.cleanup().await;
}

#[tokio::test]
async fn get_invoice_returns_created_invoice_with_lines() {
    let app = TestApp::spawn().await;

    let created = app.create_shirt_invoice("Reader", "8090001111").await;
    let invoice_id = created["invoice_id"].as_str().unwrap();

    let response = app
        .get_as(&format!("/invoices/{}", invoice_id), "employee")
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let fetched: serde_json::Value = response.json().await.unwrap();

    assert_eq!(fetched["invoice_number"], created["invoice_number"]);
    assert_eq!(fetched["lines"].as_array().unwrap().len(), 1);

    app.cleanup().await;
}

#[tokio::test]
async fn get_unknown_invoice_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .get_as(
            "/invoices/99999999-9999-9999-9999-999999999999",
            "employee",
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn list_invoices_filters_by_status() {
    let app = TestApp::spawn().await;

    app.create_shirt_invoice("Listed", "8090002222").await;

    let response = app.get_as("/invoices?status=received", "employee").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["invoices"].as_array().unwrap().len(), 1);

    let response = app.get_as("/invoices?status=delivered", "employee").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["invoices"].as_array().unwrap().is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn quote_prices_a_draft_without_saving() {
    let app = TestApp::spawn().await;

    let shirt_id = app.service_item_id("Shirt").await;
    let body = json!({
        "lines": [
            { "service_item_id": shirt_id, "variant": "wash_iron", "quantity": 2 }
        ]
    });

    let response = app.post_as("/invoices/quote", "employee", &body).await;
    assert_eq!(response.status().as_u16(), 200);
    let quote: serde_json::Value = response.json().await.unwrap();
    assert_eq!(quote["totals"]["subtotal"], "170.00");
    assert_eq!(quote["totals"]["tax"], "30.60");
    assert_eq!(quote["totals"]["total"], "200.60");

    // Nothing was saved
    let response = app.get_as("/invoices", "employee").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["invoices"].as_array().unwrap().is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn create_invoice_rejects_empty_line_sets() {
    let app = TestApp::spawn().await;

    let body = json!({
        "customer_name": "No Lines",
        "customer_phone": "8090003333",
        "delivery_date": "2026-08-14",
        "lines": []
    });

    let response = app.post_as("/invoices", "employee", &body).await;
    assert_eq!(response.status().as_u16(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn create_invoice_rejects_zero_quantity() {
    let app = TestApp::spawn().await;

    let shirt_id = app.service_item_id("Shirt").await;
    let body = json!({
        "customer_name": "Zero Qty",
        "customer_phone": "8090004444",
        "delivery_date": "2026-08-14",
        "lines": [
            { "service_item_id": shirt_id, "variant": "wash", "quantity": 0 }
        ]
    });

    let response = app.post_as("/invoices", "employee", &body).await;
    assert_eq!(response.status().as_u16(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn create_invoice_rejects_unknown_service_items() {
    let app = TestApp::spawn().await;

    let body = json!({
        "customer_name": "Unknown Item",
        "customer_phone": "8090005555",
        "delivery_date": "2026-08-14",
        "lines": [
            {
                "service_item_id": "99999999-9999-9999-9999-999999999999",
                "variant": "wash",
                "quantity": 1
            }
        ]
    });

    let response = app.post_as("/invoices", "employee", &body).await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn inactive_catalog_entries_cannot_be_invoiced() {
    let app = TestApp::spawn().await;

    // The seed ships 'Leather Jacket' as a disabled entry; it is not listed
    // as selectable, so find it straight in the database.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(app.db_url())
        .await
        .unwrap();
    let (retired_id,): (uuid::Uuid,) =
        sqlx::query_as("SELECT service_item_id FROM service_items WHERE active = FALSE LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    pool.close().await;

    let body = json!({
        "customer_name": "Retired Item",
        "customer_phone": "8090006666",
        "delivery_date": "2026-08-14",
        "lines": [
            { "service_item_id": retired_id, "variant": "wash", "quantity": 1 }
        ]
    });

    let response = app.post_as("/invoices", "employee", &body).await;
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}
