//! Test fixtures: configuration, token bundles and a fake commerce API.
//!
//! [`FakeWix`] is a small axum server on an ephemeral port that answers the
//! REST endpoints the storefront calls. It keeps one cart and records what it
//! was sent so tests can assert on outgoing requests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::IpAddr;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::{AUTHORIZATION, SET_COOKIE}},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cookie::Cookie;
use serde_json::{Value, json};

use headless_demo_core::{TokenBundle, TokenRole};

use crate::config::{
    CatalogConfig, CatalogSource, DEFAULT_API_BASE_URL, DEFAULT_CLIENT_ID, StorefrontConfig,
    WixConfig,
};
use crate::middleware::SESSION_COOKIE_NAME;
use crate::state::AppState;

// =============================================================================
// Configuration and State
// =============================================================================

/// Configuration pointing at the production API, for tests that make no calls.
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        catalog: CatalogConfig {
            source: CatalogSource::Collection {
                collection_id: "examples".to_string(),
            },
            installed_apps_url: None,
        },
        wix: WixConfig {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// State wired to a fake API, with the installed-apps partition enabled.
pub fn test_state(fake: &FakeWix) -> AppState {
    let mut config = test_config();
    config.wix.api_base_url.clone_from(&fake.base_url);
    config.catalog.installed_apps_url = Some(format!("{}/installed-apps", fake.base_url));
    AppState::new(config)
}

/// The full storefront router wired to a fake API.
pub fn test_app(fake: &FakeWix) -> Router {
    crate::app(test_state(fake))
}

// =============================================================================
// Tokens and Responses
// =============================================================================

/// A valid visitor bundle with the given access token.
pub fn visitor_bundle(access_token: &str) -> TokenBundle {
    TokenBundle::issued(
        access_token,
        format!("refresh-for-{access_token}"),
        3600,
        TokenRole::Visitor,
        chrono::Utc::now().timestamp(),
    )
}

/// A visitor bundle whose access token expired an hour ago.
pub fn expired_bundle(access_token: &str) -> TokenBundle {
    TokenBundle::issued(
        access_token,
        format!("refresh-for-{access_token}"),
        3600,
        TokenRole::Visitor,
        chrono::Utc::now().timestamp() - 7200,
    )
}

/// Collect a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Token bundles written to the `session` cookie by a response.
pub fn session_cookies(response: &Response) -> Vec<TokenBundle> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| Cookie::parse_encoded(v.to_str().unwrap().to_string()).ok())
        .filter(|c| c.name() == SESSION_COOKIE_NAME && !c.value().is_empty())
        .map(|c| TokenBundle::from_json(c.value()).unwrap())
        .collect()
}

// =============================================================================
// Fake Commerce API
// =============================================================================

/// Recorded state of the fake API.
#[derive(Default)]
pub struct FakeState {
    /// Anonymous visitor grants issued.
    pub token_calls: AtomicUsize,
    /// Refresh grants issued.
    pub refresh_calls: AtomicUsize,
    pub fail_tokens: AtomicBool,
    pub fail_data: AtomicBool,
    pub fail_cart: AtomicBool,
    pub fail_installed_apps: AtomicBool,
    issued: AtomicUsize,
    line_items: Mutex<Vec<Value>>,
    authorizations: Mutex<Vec<String>>,
    last_added_options: Mutex<Option<Value>>,
    last_post_flow_url: Mutex<Option<String>>,
    last_auth_state: Mutex<Option<String>>,
    last_code_verifier: Mutex<Option<String>>,
}

impl FakeState {
    pub fn line_item_count(&self) -> usize {
        self.line_items.lock().unwrap().len()
    }

    /// `Authorization` header values, in arrival order.
    pub fn authorizations(&self) -> Vec<String> {
        self.authorizations.lock().unwrap().clone()
    }

    /// Options map of the most recent add-to-cart line item.
    pub fn last_added_options(&self) -> Option<Value> {
        self.last_added_options.lock().unwrap().clone()
    }

    pub fn last_post_flow_url(&self) -> Option<String> {
        self.last_post_flow_url.lock().unwrap().clone()
    }

    pub fn last_auth_state(&self) -> Option<String> {
        self.last_auth_state.lock().unwrap().clone()
    }

    pub fn last_code_verifier(&self) -> Option<String> {
        self.last_code_verifier.lock().unwrap().clone()
    }

    fn record_authorization(&self, headers: &HeaderMap) {
        if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            self.authorizations.lock().unwrap().push(value.to_string());
        }
    }

    fn cart_json(&self) -> Value {
        let items = self.line_items.lock().unwrap().clone();
        let total = items.len() * 10;
        json!({
            "cart": {
                "id": "cart-1",
                "lineItems": items,
                "subtotal": {"amount": format!("{total}.00"), "formattedAmount": format!("${total}.00")},
                "currency": "USD"
            }
        })
    }
}

/// Handle to a running fake API server.
pub struct FakeWix {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl Deref for FakeWix {
    type Target = FakeState;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl FakeWix {
    /// Serve the fake API on `127.0.0.1` with an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());

        let router = Router::new()
            .route("/oauth2/token", post(token))
            .route("/wix-data/v2/items/query", post(query_data_items))
            .route("/stores-reader/v1/products/query", post(query_products))
            .route("/stores-reader/v1/products/{id}", get(get_product))
            .route("/ecom/v1/carts/current", get(get_cart).delete(delete_cart))
            .route("/ecom/v1/carts/current/add-to-cart", post(add_to_cart))
            .route(
                "/ecom/v1/carts/current/create-checkout",
                post(create_checkout),
            )
            .route("/redirects-api/v1/redirect-session", post(redirect_session))
            .route("/members/v1/members/my", get(my_member))
            .route("/installed-apps", get(installed_apps))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }
}

type FakeApi = State<Arc<FakeState>>;

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"message": message}))).into_response()
}

fn product_json() -> Value {
    json!({
        "id": "prod-1",
        "name": "Shirt",
        "slug": "shirt",
        "productOptions": [
            {"name": "Size", "choices": [{"description": "S"}, {"description": "M"}]}
        ],
        "priceData": {"currency": "USD", "formatted": {"price": "$10.00"}}
    })
}

async fn token(State(state): FakeApi, Json(body): Json<Value>) -> Response {
    if state.fail_tokens.load(Ordering::SeqCst) {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "token service unavailable");
    }

    let n = state.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let (access, refresh) = match body["grantType"].as_str() {
        Some("anonymous") => {
            state.token_calls.fetch_add(1, Ordering::SeqCst);
            (format!("visitor-access-{n}"), format!("visitor-refresh-{n}"))
        }
        Some("refresh_token") => {
            state.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let refresh = body["refresh_token"].as_str().unwrap_or_default().to_string();
            (format!("refreshed-access-{n}"), refresh)
        }
        Some("authorization_code") if body["code"] == "good-code" => {
            *state.last_code_verifier.lock().unwrap() =
                body["codeVerifier"].as_str().map(str::to_owned);
            (format!("member-access-{n}"), format!("member-refresh-{n}"))
        }
        _ => return api_error(StatusCode::BAD_REQUEST, "invalid grant"),
    };

    Json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 14400,
        "token_type": "Bearer"
    }))
    .into_response()
}

async fn query_data_items(State(state): FakeApi, headers: HeaderMap) -> Response {
    state.record_authorization(&headers);
    if state.fail_data.load(Ordering::SeqCst) {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "data service unavailable");
    }

    let items: Vec<Value> = (1..=3)
        .map(|order_id| {
            json!({
                "id": format!("item-{order_id}"),
                "dataCollectionId": "examples",
                "data": {
                    "orderId": order_id,
                    "title": format!("Example {order_id}"),
                    "description": format!("Description {order_id}"),
                    "slug": format!("/example-{order_id}")
                }
            })
        })
        .collect();

    Json(json!({"dataItems": items})).into_response()
}

async fn query_products(State(state): FakeApi, headers: HeaderMap) -> Response {
    state.record_authorization(&headers);
    Json(json!({"products": [product_json()]})).into_response()
}

async fn get_product(State(state): FakeApi, headers: HeaderMap, Path(id): Path<String>) -> Response {
    state.record_authorization(&headers);
    if id == "prod-1" {
        Json(json!({"product": product_json()})).into_response()
    } else {
        api_error(StatusCode::NOT_FOUND, "product not found")
    }
}

async fn get_cart(State(state): FakeApi, headers: HeaderMap) -> Response {
    state.record_authorization(&headers);
    if state.fail_cart.load(Ordering::SeqCst) {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "cart service unavailable");
    }
    if state.line_item_count() == 0 {
        return api_error(StatusCode::NOT_FOUND, "cart not found");
    }
    Json(state.cart_json()).into_response()
}

async fn add_to_cart(State(state): FakeApi, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.record_authorization(&headers);

    let Some(lines) = body["lineItems"].as_array() else {
        return api_error(StatusCode::BAD_REQUEST, "lineItems required");
    };

    for line in lines {
        *state.last_added_options.lock().unwrap() =
            Some(line["catalogReference"]["options"]["options"].clone());

        let count = state.line_item_count() + 1;
        state.line_items.lock().unwrap().push(json!({
            "id": format!("line-{count}"),
            "quantity": line["quantity"],
            "catalogReference": line["catalogReference"],
            "productName": {"original": "Shirt"},
            "price": {"amount": "10.00", "formattedAmount": "$10.00"}
        }));
    }

    Json(state.cart_json()).into_response()
}

async fn delete_cart(State(state): FakeApi, headers: HeaderMap) -> Response {
    state.record_authorization(&headers);
    state.line_items.lock().unwrap().clear();
    StatusCode::OK.into_response()
}

async fn create_checkout(State(state): FakeApi, headers: HeaderMap) -> Response {
    state.record_authorization(&headers);
    if state.line_item_count() == 0 {
        return api_error(StatusCode::BAD_REQUEST, "cart is empty");
    }
    Json(json!({"checkoutId": "chk-1"})).into_response()
}

async fn redirect_session(
    State(state): FakeApi,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_authorization(&headers);

    let full_url = if let Some(checkout_id) = body["ecomCheckout"]["checkoutId"].as_str() {
        *state.last_post_flow_url.lock().unwrap() =
            body["callbacks"]["postFlowUrl"].as_str().map(str::to_owned);
        format!("https://checkout.example.com/{checkout_id}")
    } else if let Some(login_state) = body["auth"]["authRequest"]["state"].as_str() {
        *state.last_auth_state.lock().unwrap() = Some(login_state.to_string());
        format!("https://login.example.com/authorize?state={login_state}")
    } else {
        return api_error(StatusCode::BAD_REQUEST, "no redirect target");
    };

    Json(json!({"redirectSession": {"id": "rs-1", "fullUrl": full_url}})).into_response()
}

async fn my_member(State(state): FakeApi, headers: HeaderMap) -> Response {
    state.record_authorization(&headers);
    Json(json!({
        "member": {
            "id": "member-1",
            "loginEmail": "ada@example.com",
            "profile": {"nickname": "Ada"}
        }
    }))
    .into_response()
}

async fn installed_apps(State(state): FakeApi) -> Response {
    if state.fail_installed_apps.load(Ordering::SeqCst) {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "installed apps unavailable");
    }
    Json(json!([2])).into_response()
}
