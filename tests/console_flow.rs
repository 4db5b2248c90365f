//! End-to-end tests for the console.
//!
//! Hermetic: each test spins up a stub identity provider and a stub
//! gateway on ephemeral ports, launches the real application router
//! against them, and drives it with a cookie-holding `reqwest` client the
//! way a browser would. The stub gateway records every request it
//! receives, so refetch-after-write and exact wire bodies are assertable.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use secrecy::SecretString;
use serde_json::{Value, json};

use tradepost::config::{ConsoleConfig, IdpConfig};
use tradepost::state::AppState;

// ============================================================================
// Stub identity provider
// ============================================================================

/// Fixed identity the stub provider issues tokens for.
#[derive(Clone)]
struct StubIdentity {
    username: String,
    roles: Vec<String>,
    /// Lifetime stamped on every issued token set.
    expires_in: i64,
    handle: IdpHandle,
}

/// Shared handle to the stub provider's state.
#[derive(Clone, Default)]
struct IdpHandle {
    /// `grant_type` of every token endpoint request, in order.
    grants: Arc<Mutex<Vec<String>>>,
    /// When set, the refresh grant is refused with `invalid_grant`.
    refuse_refresh: Arc<Mutex<bool>>,
}

impl IdpHandle {
    fn grants(&self) -> Vec<String> {
        self.grants.lock().unwrap().clone()
    }

    fn refuse_refresh(&self) {
        *self.refuse_refresh.lock().unwrap() = true;
    }
}

/// Build an unsigned JWT carrying the stub identity's claims.
fn mint_token(identity: &StubIdentity) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({
            "preferred_username": identity.username,
            "realm_access": { "roles": identity.roles },
        })
        .to_string()
        .as_bytes(),
    );
    let signature = URL_SAFE_NO_PAD.encode(b"unverified");
    format!("{header}.{payload}.{signature}")
}

async fn idp_authorize(Query(params): Query<HashMap<String, String>>) -> Redirect {
    // Skip the login form entirely: bounce straight back with a code.
    let redirect_uri = params.get("redirect_uri").cloned().unwrap_or_default();
    let state = params.get("state").cloned().unwrap_or_default();
    Redirect::to(&format!("{redirect_uri}?code=stub-code&state={state}"))
}

async fn idp_token(
    State(identity): State<StubIdentity>,
    axum::Form(params): axum::Form<HashMap<String, String>>,
) -> Response {
    let grant = params.get("grant_type").cloned().unwrap_or_default();
    identity.handle.grants.lock().unwrap().push(grant.clone());

    if grant == "refresh_token" && *identity.handle.refuse_refresh.lock().unwrap() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }

    Json(json!({
        "access_token": mint_token(&identity),
        "token_type": "Bearer",
        "expires_in": identity.expires_in,
        "refresh_token": "stub-refresh",
        "id_token": mint_token(&identity),
    }))
    .into_response()
}

async fn idp_logout(Query(params): Query<HashMap<String, String>>) -> Redirect {
    let target = params
        .get("post_logout_redirect_uri")
        .cloned()
        .unwrap_or_else(|| "/".to_string());
    Redirect::to(&target)
}

/// Spawn the stub provider; returns its issuer URL.
async fn spawn_idp(identity: StubIdentity) -> String {
    let router = Router::new()
        .route("/realms/trading/protocol/openid-connect/auth", get(idp_authorize))
        .route("/realms/trading/protocol/openid-connect/token", post(idp_token))
        .route("/realms/trading/protocol/openid-connect/logout", get(idp_logout))
        .with_state(identity);

    let base = spawn(router).await;
    format!("{base}/realms/trading")
}

// ============================================================================
// Stub gateway
// ============================================================================

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    body: Option<Value>,
}

/// Shared handle to the stub gateway's state.
#[derive(Clone, Default)]
struct GatewayHandle {
    products: Arc<Mutex<Vec<Value>>>,
    orders: Arc<Mutex<Vec<Value>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// One-shot status override consumed by the next request.
    force_status: Arc<Mutex<Option<u16>>>,
}

impl GatewayHandle {
    fn set_products(&self, products: Vec<Value>) {
        *self.products.lock().unwrap() = products;
    }

    fn set_orders(&self, orders: Vec<Value>) {
        *self.orders.lock().unwrap() = orders;
    }

    fn force_next_status(&self, status: u16) {
        *self.force_status.lock().unwrap() = Some(status);
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn requests_matching(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

async fn gateway_handler(State(handle): State<GatewayHandle>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let bytes = axum::body::to_bytes(body, 1024 * 1024).await.unwrap();
    let body: Option<Value> = serde_json::from_slice(&bytes).ok();

    handle.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        body: body.clone(),
    });

    if let Some(code) = handle.force_status.lock().unwrap().take() {
        let status = StatusCode::from_u16(code).unwrap();
        return (status, Json(json!({ "message": "forced failure" }))).into_response();
    }

    if path == "/products" && method == Method::GET {
        return Json(handle.products.lock().unwrap().clone()).into_response();
    }
    if path == "/products" && method == Method::POST {
        let mut created = body.unwrap_or_else(|| json!({}));
        created["id"] = json!(99);
        return Json(created).into_response();
    }
    if (path == "/orders" || path == "/orders/all") && method == Method::GET {
        return Json(handle.orders.lock().unwrap().clone()).into_response();
    }
    if path == "/orders" && method == Method::POST {
        return Json(json!({
            "id": 500,
            "date": "2024-03-01",
            "status": "PENDING",
            "amount": 0.0,
            "productItems": [],
        }))
        .into_response();
    }
    if let Some(raw_id) = path.strip_prefix("/products/") {
        let id: i64 = raw_id.parse().unwrap_or_default();
        if method == Method::GET {
            return handle
                .products
                .lock()
                .unwrap()
                .iter()
                .find(|p| p["id"] == json!(id))
                .map_or_else(
                    || {
                        (
                            StatusCode::NOT_FOUND,
                            Json(json!({ "message": "Product not found" })),
                        )
                            .into_response()
                    },
                    |product| Json(product.clone()).into_response(),
                );
        }
        if method == Method::PUT {
            let mut updated = body.unwrap_or_else(|| json!({}));
            updated["id"] = json!(id);
            return Json(updated).into_response();
        }
        if method == Method::DELETE {
            return StatusCode::OK.into_response();
        }
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn spawn_gateway(handle: GatewayHandle) -> String {
    let router = Router::new().fallback(gateway_handler).with_state(handle);
    spawn(router).await
}

// ============================================================================
// Harness
// ============================================================================

/// Bind an ephemeral port, serve the router, return the base URL.
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

struct TestApp {
    client: Client,
    base: String,
    gateway: GatewayHandle,
    idp: IdpHandle,
}

impl TestApp {
    /// Launch stub IdP + stub gateway + the real console.
    async fn launch(username: &str, roles: &[&str]) -> Self {
        Self::launch_with_token_lifetime(username, roles, 300).await
    }

    /// Like [`launch`], with a chosen `expires_in` on issued tokens.
    async fn launch_with_token_lifetime(username: &str, roles: &[&str], expires_in: i64) -> Self {
        let gateway = GatewayHandle::default();
        let gateway_url = spawn_gateway(gateway.clone()).await;
        let idp = IdpHandle::default();
        let issuer_url = spawn_idp(StubIdentity {
            username: username.to_string(),
            roles: roles.iter().map(ToString::to_string).collect(),
            expires_in,
            handle: idp.clone(),
        })
        .await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}");

        let config = ConsoleConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: base.clone(),
            gateway_url,
            idp: IdpConfig {
                issuer_url,
                client_id: "tradepost-console".to_string(),
                client_secret: SecretString::from("kJ8#mN2$pQ5^rT9&vX3*yB6!cE0@fH4"),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        let app = tradepost::app(AppState::new(config));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder().cookie_store(true).build().unwrap();

        Self {
            client,
            base,
            gateway,
            idp,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Run the full login dance; the redirect chain ends on the console.
    async fn sign_in(&self) -> String {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.url().path(), "/");
        response.text().await.unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }
}

fn product(id: i64, name: &str, price: f64, quantity: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "quantity": quantity,
    })
}

// ============================================================================
// Authentication and role derivation
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_visitor_is_sent_to_login() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;

    let response = app.get("/").await;
    assert_eq!(response.url().path(), "/auth/login");
    // Nothing was fetched from the gateway.
    assert!(app.gateway.requests().is_empty());
}

#[tokio::test]
async fn test_client_login_fetches_products_and_own_orders() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.gateway.set_products(vec![product(1, "Widget", 9.99, 10)]);
    app.gateway.set_orders(vec![json!({
        "id": 42,
        "date": "2024-01-15",
        "status": "PENDING",
        "amount": 19.98,
        "productItems": [{ "productId": 1, "quantity": 2, "price": 9.99 }],
    })]);

    let body = app.sign_in().await;

    assert_eq!(app.gateway.requests_matching("GET", "/products").len(), 1);
    assert_eq!(app.gateway.requests_matching("GET", "/orders").len(), 1);
    assert!(app.gateway.requests_matching("GET", "/orders/all").is_empty());

    assert!(body.contains("alice"));
    assert!(body.contains("Widget"));
    assert!(body.contains("Your orders"));
    assert!(body.contains("PENDING"));
    // No admin controls for a regular client.
    assert!(!body.contains("New product"));
    assert!(!body.contains("/delete"));
}

#[tokio::test]
async fn test_admin_login_fetches_all_orders_and_shows_controls() {
    let app = TestApp::launch("root", &["CLIENT", "ADMIN"]).await;
    app.gateway.set_products(vec![product(1, "Widget", 9.99, 10)]);
    app.gateway.set_orders(vec![json!({
        "id": 7,
        "userId": "alice",
        "date": "2024-02-01",
        "status": "SHIPPED",
        "amount": 9.99,
        "productItems": [],
    })]);

    let body = app.sign_in().await;

    assert_eq!(app.gateway.requests_matching("GET", "/orders/all").len(), 1);
    assert!(app.gateway.requests_matching("GET", "/orders").is_empty());

    assert!(body.contains("All orders"));
    assert!(body.contains("alice"));
    assert!(body.contains("New product"));
    assert!(body.contains("/products/1/delete"));
}

#[tokio::test]
async fn test_role_without_sentinel_is_client() {
    // "admin" is not the sentinel; role names are case sensitive.
    let app = TestApp::launch("mallory", &["admin", "offline_access"]).await;
    app.gateway.set_products(vec![product(1, "Widget", 9.99, 10)]);

    let body = app.sign_in().await;

    assert_eq!(app.gateway.requests_matching("GET", "/orders").len(), 1);
    assert!(!body.contains("New product"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.sign_in().await;

    let response = app
        .client
        .post(app.url("/auth/logout"))
        .send()
        .await
        .unwrap();
    // The provider's end-session redirect lands back on the landing page.
    assert_eq!(response.url().path(), "/auth/login");

    let response = app.get("/").await;
    assert_eq!(response.url().path(), "/auth/login");
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_render() {
    // A 1s lifetime falls inside the 60s expiry buffer, so the token set
    // is stale the moment it is stored.
    let app = TestApp::launch_with_token_lifetime("alice", &["CLIENT"], 1).await;
    app.gateway.set_products(vec![product(1, "Widget", 9.99, 10)]);

    let body = app.sign_in().await;
    assert!(body.contains("Widget"));

    // The code exchange was followed by a refresh grant before the
    // console fetched anything.
    assert_eq!(
        app.idp.grants(),
        vec!["authorization_code".to_string(), "refresh_token".to_string()]
    );
    assert_eq!(app.gateway.requests_matching("GET", "/products").len(), 1);
}

#[tokio::test]
async fn test_refused_refresh_ends_session_and_forces_re_login() {
    let app = TestApp::launch_with_token_lifetime("alice", &["CLIENT"], 1).await;
    app.sign_in().await;

    app.idp.refuse_refresh();
    let requests_before = app.gateway.requests().len();

    let response = app.get("/").await;
    assert_eq!(response.url().path(), "/auth/login");

    // The refresh grant was attempted and refused; the stale session
    // never reached the gateway.
    assert_eq!(app.idp.grants().last().map(String::as_str), Some("refresh_token"));
    assert_eq!(app.gateway.requests().len(), requests_before);

    // The session is gone for good, not just for that request.
    let response = app.get("/").await;
    assert_eq!(response.url().path(), "/auth/login");
}

// ============================================================================
// Product cards and stock presentation
// ============================================================================

#[tokio::test]
async fn test_low_stock_styling_at_threshold() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.gateway.set_products(vec![
        product(1, "Scarce", 5.0, 3),
        product(2, "Boundary", 5.0, 5),
        product(3, "Plentiful", 5.0, 6),
    ]);

    let body = app.sign_in().await;

    assert!(body.contains("Stock: 3 ⚠️"));
    assert!(body.contains("Stock: 5 ⚠️"));
    assert!(body.contains("Stock: 6"));
    assert!(!body.contains("Stock: 6 ⚠️"));
    assert_eq!(body.matches("low-stock").count(), 2);
}

#[tokio::test]
async fn test_out_of_stock_disables_order_action() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.gateway.set_products(vec![
        product(1, "Available", 5.0, 4),
        product(2, "Gone", 5.0, 0),
    ]);

    let body = app.sign_in().await;

    assert!(body.contains("/products/1/order"));
    assert!(!body.contains("/products/2/order"));
    assert!(body.contains("disabled"));
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_order_flow_posts_exact_body_then_refetches_both() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.gateway.set_products(vec![product(1, "Widget", 9.99, 3)]);

    let body = app.sign_in().await;
    assert!(body.contains("Stock: 3 ⚠️"));
    assert!(body.contains("/products/1/order"));

    // The quantity dialog shows the product.
    let dialog = app.get("/products/1/order").await.text().await.unwrap();
    assert!(dialog.contains("Order Widget"));
    assert!(dialog.contains("$9.99"));

    let fetches_before = app.gateway.requests().len();
    let response = app
        .client
        .post(app.url("/products/1/order"))
        .form(&[("quantity", "2"), ("price", "9.99")])
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();
    assert!(body.contains("Order placed successfully!"));

    let placed = app.gateway.requests_matching("POST", "/orders");
    assert_eq!(placed.len(), 1);
    assert_eq!(
        placed[0].body,
        Some(json!({
            "productItems": [{ "productId": 1, "quantity": 2, "price": 9.99 }]
        }))
    );

    // Refetch-after-write: the write is followed by both list reads.
    let after: Vec<_> = app
        .gateway
        .requests()
        .into_iter()
        .skip(fetches_before)
        .collect();
    assert_eq!(after[0].method, "POST");
    assert_eq!(after[0].path, "/orders");
    assert!(after.iter().any(|r| r.method == "GET" && r.path == "/products"));
    assert!(after.iter().any(|r| r.method == "GET" && r.path == "/orders"));
}

#[tokio::test]
async fn test_invalid_order_quantities_send_nothing() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.gateway.set_products(vec![product(1, "Widget", 9.99, 3)]);
    app.sign_in().await;

    for quantity in ["0", "-3", "two", "1.5", ""] {
        let response = app
            .client
            .post(app.url("/products/1/order"))
            .form(&[("quantity", quantity), ("price", "9.99")])
            .send()
            .await
            .unwrap();
        // Silent abort: back on the console, no banner.
        assert_eq!(response.url().path(), "/");
        let body = response.text().await.unwrap();
        assert!(!body.contains("banner"));
    }

    assert!(app.gateway.requests_matching("POST", "/orders").is_empty());
}

// ============================================================================
// Product CRUD
// ============================================================================

#[tokio::test]
async fn test_create_product_posts_body_and_refetches() {
    let app = TestApp::launch("root", &["ADMIN"]).await;
    app.sign_in().await;

    let fetches_before = app.gateway.requests().len();
    let response = app
        .client
        .post(app.url("/products"))
        .form(&[
            ("name", "Gadget"),
            ("description", "A fine gadget"),
            ("price", "4.50"),
            ("quantity", "10"),
        ])
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();
    assert!(body.contains("Product created."));
    // The form closed and the draft is gone.
    assert!(!body.contains("value=\"Gadget\""));

    let created = app.gateway.requests_matching("POST", "/products");
    assert_eq!(created.len(), 1);
    assert_eq!(
        created[0].body,
        Some(json!({
            "name": "Gadget",
            "description": "A fine gadget",
            "price": 4.5,
            "quantity": 10
        }))
    );

    let after: Vec<_> = app
        .gateway
        .requests()
        .into_iter()
        .skip(fetches_before)
        .collect();
    assert_eq!(after[0].method, "POST");
    assert!(after.iter().any(|r| r.method == "GET" && r.path == "/products"));
}

#[tokio::test]
async fn test_failed_create_reopens_form_with_draft() {
    let app = TestApp::launch("root", &["ADMIN"]).await;
    app.sign_in().await;

    app.gateway.force_next_status(500);
    let response = app
        .client
        .post(app.url("/products"))
        .form(&[("name", "Gadget"), ("price", "4.50"), ("quantity", "10")])
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();

    assert!(body.contains("Failed to create product. forced failure"));
    // Submission preserved for redraft.
    assert!(body.contains("value=\"Gadget\""));
    assert!(body.contains("action=\"/products\""));
}

#[tokio::test]
async fn test_update_product_targets_edited_id() {
    let app = TestApp::launch("root", &["ADMIN"]).await;
    app.gateway.set_products(vec![product(5, "Widget", 9.99, 3)]);
    app.sign_in().await;

    let response = app
        .client
        .post(app.url("/products/5"))
        .form(&[
            ("name", "Widget v2"),
            ("description", ""),
            ("price", "12.00"),
            ("quantity", "8"),
        ])
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();
    assert!(body.contains("Product updated."));

    let updated = app.gateway.requests_matching("PUT", "/products/5");
    assert_eq!(updated.len(), 1);
    assert_eq!(
        updated[0].body,
        Some(json!({
            "name": "Widget v2",
            "description": null,
            "price": 12.0,
            "quantity": 8
        }))
    );
}

#[tokio::test]
async fn test_failed_update_keeps_edit_target_and_draft() {
    let app = TestApp::launch("root", &["ADMIN"]).await;
    app.gateway.set_products(vec![product(5, "Widget", 9.99, 3)]);
    app.sign_in().await;

    app.gateway.force_next_status(500);
    let response = app
        .client
        .post(app.url("/products/5"))
        .form(&[
            ("name", "Widget v2"),
            ("description", ""),
            ("price", "12.00"),
            ("quantity", "8"),
        ])
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();

    assert!(body.contains("Failed to update product. forced failure"));
    // The submission is preserved and still targets the edited product.
    assert!(body.contains("Edit product"));
    assert!(body.contains("value=\"Widget v2\""));
    assert!(body.contains("action=\"/products/5\""));
}

#[tokio::test]
async fn test_edit_populates_draft_and_suppresses_create_form() {
    let app = TestApp::launch("root", &["ADMIN"]).await;
    app.gateway.set_products(vec![product(5, "Widget", 9.99, 3)]);
    app.sign_in().await;

    let body = app.get("/?edit=5").await.text().await.unwrap();

    assert!(body.contains("Edit product"));
    assert!(body.contains("value=\"Widget\""));
    assert!(body.contains("value=\"9.99\""));
    assert!(body.contains("value=\"3\""));
    assert!(body.contains("action=\"/products/5\""));
    // Create entry point disappears while the edit form is open.
    assert!(!body.contains("New product</a>"));
    assert!(!body.contains("action=\"/products\""));
}

#[tokio::test]
async fn test_garbled_edit_query_renders_without_form() {
    let app = TestApp::launch("root", &["ADMIN"]).await;
    app.gateway.set_products(vec![product(5, "Widget", 9.99, 3)]);
    app.sign_in().await;

    let response = app.get("/?edit=abc").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.url().path(), "/");
    let body = response.text().await.unwrap();
    assert!(body.contains("Widget"));
    assert!(!body.contains("Edit product"));
}

#[tokio::test]
async fn test_product_form_is_admin_only() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.gateway.set_products(vec![product(5, "Widget", 9.99, 3)]);
    app.sign_in().await;

    for path in ["/?new=1", "/?edit=5"] {
        let body = app.get(path).await.text().await.unwrap();
        assert!(!body.contains("product-form"));
        assert!(!body.contains("Edit product"));
        assert!(!body.contains("action=\"/products\""));
    }
}

#[tokio::test]
async fn test_delete_requires_confirmation_step() {
    let app = TestApp::launch("root", &["ADMIN"]).await;
    app.gateway.set_products(vec![product(5, "Widget", 9.99, 3)]);
    app.sign_in().await;

    // The confirmation page itself sends no DELETE.
    let dialog = app.get("/products/5/delete").await.text().await.unwrap();
    assert!(dialog.contains("This cannot be undone."));
    assert!(app.gateway.requests_matching("DELETE", "/products/5").is_empty());

    let response = app
        .client
        .post(app.url("/products/5/delete"))
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();
    assert!(body.contains("Product deleted."));
    assert_eq!(app.gateway.requests_matching("DELETE", "/products/5").len(), 1);
}

// ============================================================================
// Failure translation
// ============================================================================

#[tokio::test]
async fn test_forbidden_names_the_action_and_keeps_session() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.sign_in().await;

    app.gateway.force_next_status(403);
    let response = app
        .client
        .post(app.url("/products"))
        .form(&[("name", "Gadget"), ("price", "1"), ("quantity", "1")])
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();
    assert!(body.contains("Forbidden. You do not have permission to create product."));

    // Session stays alive: the console still renders.
    let response = app.get("/").await;
    assert_eq!(response.url().path(), "/");
}

#[tokio::test]
async fn test_unauthorized_ends_session_and_reports_once() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.sign_in().await;

    app.gateway.force_next_status(401);
    let response = app.get("/").await;
    assert_eq!(response.url().path(), "/auth/login");
    let body = response.text().await.unwrap();
    assert_eq!(body.matches("Unauthorized. Please log in again.").count(), 1);

    // The session ended: the console is gone until the next sign-in, and
    // the banner was one-shot.
    let response = app.get("/").await;
    assert_eq!(response.url().path(), "/auth/login");
    let body = response.text().await.unwrap();
    assert!(!body.contains("Unauthorized"));
}

#[tokio::test]
async fn test_gateway_error_message_reaches_banner() {
    let app = TestApp::launch("alice", &["CLIENT"]).await;
    app.gateway.set_products(vec![product(1, "Widget", 9.99, 3)]);
    app.sign_in().await;

    app.gateway.force_next_status(500);
    let response = app
        .client
        .post(app.url("/products/1/order"))
        .form(&[("quantity", "2"), ("price", "9.99")])
        .send()
        .await
        .unwrap();
    let body = response.text().await.unwrap();
    assert!(body.contains("Failed to place order. forced failure"));
}
