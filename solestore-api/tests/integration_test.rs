/// Integration tests for the Solestore API
///
/// These tests exercise the full router end-to-end:
/// - Register -> verify-email -> login flow
/// - Authentication and admin gating
/// - Both bearer token kinds (session and external)
/// - Address book invariant over HTTP
/// - Product catalog and inventory decrements
/// - Order lifecycle and the status state machine
/// - Password reset flow

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, external_token, get, json_request, post_json, TestContext};
use serde_json::json;

fn cart_body() -> serde_json::Value {
    json!({
        "name": "Alice",
        "address": "1 Main St",
        "phone": "0123456789",
        "amount": 2,
        "order_total": 119.98,
        "cart_items": [{
            "product_id": uuid::Uuid::new_v4(),
            "name": "Runner",
            "size": "40",
            "price": 59.99,
            "quantity": 2,
        }],
    })
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();
    let response = ctx.send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_register_verify_login_flow() {
    let ctx = TestContext::new();

    let response = ctx
        .send(post_json(
            "/api/v1/register",
            None,
            json!({ "username": "alice", "email": "a@x.com", "password": "pw123456" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Login before verification is rejected
    let response = ctx
        .send(post_json(
            "/api/v1/login",
            None,
            json!({ "email": "a@x.com", "password": "pw123456" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Verify via the emailed link token
    let token = ctx
        .last_email_token("a@x.com", "verify-email?token=")
        .await
        .unwrap();
    let response = ctx
        .send(get(&format!("/api/v1/verify-email?token={token}"), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Now login succeeds and returns a session token
    let response = ctx
        .send(post_json(
            "/api/v1/login",
            None,
            json!({ "email": "a@x.com", "password": "pw123456" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_register_verified_email_conflicts() {
    let ctx = TestContext::new();
    ctx.register_verify_login("alice", "a@x.com", "pw123456")
        .await;

    let response = ctx
        .send(post_json(
            "/api/v1/register",
            None,
            json!({ "username": "mallory", "email": "a@x.com", "password": "pw123456" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();

    let response = ctx
        .send(post_json(
            "/api/v1/register",
            None,
            json!({ "username": "alice", "email": "not-an-email", "password": "pw" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let ctx = TestContext::new();

    let response = ctx.send(get("/api/v1/orders", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx.send(get("/api/v1/orders", Some("garbage"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_plain_users() {
    let ctx = TestContext::new();
    let token = ctx
        .register_verify_login("alice", "a@x.com", "pw123456")
        .await;

    let response = ctx.send(get("/api/v1/orders/all", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx.send(get("/api/v1/users", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = ctx.admin_token();
    let response = ctx.send(get("/api/v1/orders/all", Some(&admin))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_external_token_places_orders() {
    let ctx = TestContext::new();
    let token = external_token(json!({
        "sub": "ext-4711",
        "jti": "abc",
        "name": "Alice",
        "email": "a@ext.example",
    }));

    let response = ctx
        .send(post_json("/api/v1/orders", Some(&token), cart_body()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["created_by"], "ext-4711123");
    assert_eq!(order["status"], "Pending");

    // The external principal sees only its own orders
    let response = ctx.send(get("/api/v1/orders", Some(&token))).await;
    let body = body_json(response).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_external_principal_has_no_address_book() {
    let ctx = TestContext::new();
    let token = external_token(json!({ "sub": "ext-4711", "jti": "abc" }));

    let response = ctx.send(get("/api/v1/addresses", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_order_read_is_owner_or_admin() {
    let ctx = TestContext::new();
    let owner = ctx
        .register_verify_login("alice", "a@x.com", "pw123456")
        .await;
    let other = ctx
        .register_verify_login("bob", "b@x.com", "pw123456")
        .await;

    let response = ctx
        .send(post_json("/api/v1/orders", Some(&owner), cart_body()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/orders/{order_id}");
    assert_eq!(ctx.send(get(&uri, Some(&owner))).await.status(), StatusCode::OK);
    assert_eq!(
        ctx.send(get(&uri, Some(&other))).await.status(),
        StatusCode::FORBIDDEN
    );
    let admin = ctx.admin_token();
    assert_eq!(ctx.send(get(&uri, Some(&admin))).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_address_default_invariant_over_http() {
    let ctx = TestContext::new();
    let token = ctx
        .register_verify_login("alice", "a@x.com", "pw123456")
        .await;

    let entry = |address: &str| {
        json!({ "full_name": "Alice", "phone": "0123456789", "address": address })
    };

    let response = ctx
        .send(post_json("/api/v1/addresses", Some(&token), entry("1 Main St")))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = body_json(response).await;
    assert_eq!(first["is_default"], true);

    // The newest entry always becomes the default
    let response = ctx
        .send(post_json("/api/v1/addresses", Some(&token), entry("2 Side St")))
        .await;
    let second = body_json(response).await;
    assert_eq!(second["is_default"], true);

    let response = ctx.send(get("/api/v1/addresses", Some(&token))).await;
    let body = body_json(response).await;
    let addresses = body["addresses"].as_array().unwrap();
    assert_eq!(addresses.len(), 2);
    let defaults = addresses.iter().filter(|a| a["is_default"] == true).count();
    assert_eq!(defaults, 1);
    assert_eq!(addresses[0]["is_default"], false);

    // Flip the default back to the first entry
    let first_id = first["id"].as_str().unwrap();
    let response = ctx
        .send(json_request(
            "PUT",
            &format!("/api/v1/addresses/{first_id}/default"),
            Some(&token),
            json!({}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Removing the default promotes the remaining entry
    let response = ctx
        .send(delete(
            &format!("/api/v1/addresses/{first_id}"),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx.send(get("/api/v1/addresses", Some(&token))).await;
    let body = body_json(response).await;
    let addresses = body["addresses"].as_array().unwrap();
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0]["is_default"], true);
}

#[tokio::test]
async fn test_product_catalog_and_decrement() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token();

    // Product writes are admin-only
    let product_body = json!({
        "name": "Runner",
        "image": "https://img.example/runner.png",
        "price": 59.99,
        "sizes": [
            { "size": "40", "quantity": 5 },
            { "size": "41", "quantity": 1 },
        ],
        "brand": "Adidas",
    });
    let user = ctx
        .register_verify_login("alice", "a@x.com", "pw123456")
        .await;
    let response = ctx
        .send(post_json("/api/v1/products", Some(&user), product_body.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .send(post_json("/api/v1/products", Some(&admin), product_body))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Reads are public
    let response = ctx.send(get("/api/v1/products", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["products"].as_array().unwrap().len(), 1);

    // Decrement within stock succeeds
    let uri = format!("/api/v1/products/{product_id}/sizes/decrement");
    let response = ctx
        .send(post_json(
            &uri,
            Some(&user),
            json!({ "decrements": [{ "size": "40", "quantity": 3 }] }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A shortfall on any size fails the whole call and persists nothing
    let response = ctx
        .send(post_json(
            &uri,
            Some(&user),
            json!({ "decrements": [
                { "size": "40", "quantity": 1 },
                { "size": "41", "quantity": 2 },
            ]}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .send(get(&format!("/api/v1/products/{product_id}"), None))
        .await;
    let product = body_json(response).await;
    assert_eq!(product["sizes"][0]["quantity"], 2);
    assert_eq!(product["sizes"][1]["quantity"], 1);
}

#[tokio::test]
async fn test_order_status_state_machine_over_http() {
    let ctx = TestContext::new();
    let user = ctx
        .register_verify_login("alice", "a@x.com", "pw123456")
        .await;
    let admin = ctx.admin_token();

    let response = ctx
        .send(post_json("/api/v1/orders", Some(&user), cart_body()))
        .await;
    let order_id = body_json(response).await["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/orders/{order_id}/status");

    // Status changes are admin-only
    let response = ctx
        .send(json_request("PATCH", &uri, Some(&user), json!({ "status": "Shipping" })))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Pending -> Delivered skips Shipping
    let response = ctx
        .send(json_request("PATCH", &uri, Some(&admin), json!({ "status": "Delivered" })))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Pending -> Shipping with fulfillment fields
    let response = ctx
        .send(json_request(
            "PATCH",
            &uri,
            Some(&admin),
            json!({ "status": "Shipping", "tracking_code": "TRACK-1", "is_paid": true }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let order = body_json(response).await;
    assert_eq!(order["status"], "Shipping");
    assert_eq!(order["tracking_code"], "TRACK-1");
    assert_eq!(order["is_paid"], true);

    // Shipping -> Delivered, then the order is terminal
    let response = ctx
        .send(json_request("PATCH", &uri, Some(&admin), json!({ "status": "Delivered" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = ctx
        .send(json_request("PATCH", &uri, Some(&admin), json!({ "status": "Cancelled" })))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_password_reset_flow_over_http() {
    let ctx = TestContext::new();
    ctx.register_verify_login("alice", "a@x.com", "pw123456")
        .await;

    let response = ctx
        .send(post_json(
            "/api/v1/forgot-password",
            None,
            json!({ "email": "a@x.com" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = ctx
        .last_email_token("a@x.com", "/reset-password/")
        .await
        .unwrap();

    // Without the bearer reset token the request is rejected
    let response = ctx
        .send(json_request(
            "PUT",
            "/api/v1/reset-password",
            None,
            json!({ "email": "a@x.com", "password": "new-pw-9999" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .send(json_request(
            "PUT",
            "/api/v1/reset-password",
            Some(&token),
            json!({ "email": "a@x.com", "password": "new-pw-9999" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Old password dead, new password live
    let response = ctx
        .send(post_json(
            "/api/v1/login",
            None,
            json!({ "email": "a@x.com", "password": "pw123456" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = ctx
        .send(post_json(
            "/api/v1/login",
            None,
            json!({ "email": "a@x.com", "password": "new-pw-9999" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
