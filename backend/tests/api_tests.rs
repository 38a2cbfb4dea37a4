//! HTTP API tests against the in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use shopdash_backend::config::NegativeStockPolicy;
use shopdash_backend::error::AppResult;
use shopdash_backend::external::TextCompletion;
use shopdash_backend::middleware::auth::{encode_token, Claims};
use shopdash_backend::store::Stores;
use shopdash_backend::{create_app, AppState, Config};

const SECRET: &str = "test-secret";

struct CannedCompletion;

#[async_trait]
impl TextCompletion for CannedCompletion {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> AppResult<String> {
        Ok(format!(
            "{} | {}",
            user_message,
            system_prompt.lines().find(|l| l.starts_with("Inventory items")).unwrap_or("")
        ))
    }
}

fn state() -> AppState {
    let mut config = Config::defaults().unwrap();
    config.jwt.secret = SECRET.to_string();
    AppState::new(Stores::memory(), config).unwrap()
}

fn token(business_id: Uuid) -> String {
    let claims = Claims::new(Uuid::new_v4(), business_id, chrono::Duration::hours(1));
    encode_token(&claims, SECRET).unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn json_of(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_app(state());
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_of(&body);
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["store_status"], "connected");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_app(state());
    let (status, body) = send(&app, Method::GET, "/api/v1/inventory/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_of(&body)["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/inventory/items",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stock_ledger_over_http() {
    let app = create_app(state());
    let token = token(Uuid::new_v4());
    let token = Some(token.as_str());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/items",
        token,
        Some(json!({
            "name": "Coffee beans",
            "unit": "kg",
            "initial_quantity": "100",
            "cost_per_unit": "12.5",
            "low_stock_alert": "20"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json_of(&body);
    let item_id = created["item"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["transaction"]["notes"], "Initial stock");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/inventory/items/{}/adjust", item_id),
        token,
        Some(json!({ "quantity_change": "-30", "notes": "sale" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let movement = json_of(&body);
    assert_eq!(movement["transaction"]["transaction_type"], "remove");
    assert_eq!(movement["item"]["current_quantity"], "70");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/inventory/items/{}/adjust", item_id),
        token,
        Some(json!({ "quantity_change": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json_of(&body);
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(error["error"]["field"], "quantity_change");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/inventory/items/{}", item_id),
        token,
        Some(json!({ "current_quantity": "999" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["error"]["field"], "current_quantity");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/inventory/items/{}/reconcile", item_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["consistent"], true);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/inventory/items/{}/transactions/export", item_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.lines().count(), 3);
    assert!(body.lines().last().unwrap().ends_with(",remove,-30,70,sale"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/bulk-adjust",
        token,
        Some(json!({
            "item_ids": [item_id, Uuid::new_v4()],
            "quantity_change": "5"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report = json_of(&body);
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["results"][0]["status"], "adjusted");
    assert_eq!(report["results"][1]["status"], "failed");
    assert_eq!(report["results"][1]["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/inventory/items/{}", item_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/api/v1/inventory/transactions", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body).as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_oversold_adjustment_conflicts_under_reject_policy() {
    let mut state = state();
    let mut config = (*state.config).clone();
    config.ledger.negative_stock = NegativeStockPolicy::Reject;
    state.config = Arc::new(config);
    let app = create_app(state);
    let token = token(Uuid::new_v4());

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/items",
        Some(&token),
        Some(json!({ "name": "Oat milk", "initial_quantity": "4" })),
    )
    .await;
    let item_id = json_of(&body)["item"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/inventory/items/{}/adjust", item_id),
        Some(&token),
        Some(json!({ "quantity_change": "-5" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json_of(&body)["error"]["code"], "INSUFFICIENT_STOCK");
}

#[tokio::test]
async fn test_null_clears_low_stock_alert() {
    let app = create_app(state());
    let token = token(Uuid::new_v4());

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/items",
        Some(&token),
        Some(json!({ "name": "Sugar", "initial_quantity": "2", "low_stock_alert": "5" })),
    )
    .await;
    let item_id = json_of(&body)["item"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/inventory/items/{}", item_id),
        Some(&token),
        Some(json!({ "low_stock_alert": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json_of(&body)["low_stock_alert"].is_null());

    let (_, body) = send(&app, Method::GET, "/api/v1/inventory/low-stock", Some(&token), None).await;
    assert_eq!(json_of(&body).as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_items_are_scoped_by_token_business() {
    let app = create_app(state());
    let owner = token(Uuid::new_v4());
    let stranger = token(Uuid::new_v4());

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/items",
        Some(&owner),
        Some(json!({ "name": "Tea", "initial_quantity": "3" })),
    )
    .await;
    let item_id = json_of(&body)["item"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/inventory/items/{}", item_id),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_pricing_over_http() {
    let app = create_app(state());
    let token = token(Uuid::new_v4());
    let recipe = json!({
        "name": "Latte kit",
        "ingredients": [
            { "name": "Espresso", "unit_cost": "10", "quantity": "2" },
            { "name": "Milk", "unit_cost": "5", "quantity": "1", "unit": "l" }
        ],
        "labor_minutes": "30",
        "hourly_rate": "20",
        "target_margin_percent": "40"
    });

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/pricing/preview",
        Some(&token),
        Some(recipe.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let preview = json_of(&body);
    assert_eq!(preview["selling_price"], "58.33");
    assert_eq!(preview["formatted_selling_price"], "$58.33");
    assert_eq!(preview["valid_lines"], 2);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/products",
        Some(&token),
        Some(recipe),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let product = json_of(&body);
    assert_eq!(product["total_cost"], "35.00");
    assert_eq!(product["profit_margin_percent"], "40.00");

    let (status, body) = send(&app, Method::GET, "/api/v1/context/snapshot", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let snapshot = json_of(&body);
    assert_eq!(snapshot["total_products"], 1);
    assert_eq!(snapshot["avg_margin_percent"], "40.00");
}

#[tokio::test]
async fn test_assistant_unavailable_without_endpoint() {
    let app = create_app(state());
    let token = token(Uuid::new_v4());
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assistant/chat",
        Some(&token),
        Some(json!({ "message": "How is my stock?" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_of(&body)["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_assistant_receives_snapshot() {
    let app = create_app(state().with_assistant(Arc::new(CannedCompletion)));
    let token = token(Uuid::new_v4());
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assistant/chat",
        Some(&token),
        Some(json!({ "message": "How is my stock?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reply = json_of(&body);
    assert_eq!(reply["reply"], "How is my stock? | Inventory items: 0");
    assert_eq!(reply["snapshot"]["total_inventory_items"], 0);
}
