//! Store page: products, current cart, checkout and login.
//!
//! Every handler builds its own [`WixSession`] from the request's cookie and
//! writes the handle's (possibly rotated) token bundle back to the `session`
//! cookie before responding.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use headless_demo_core::{CartStatus, ChannelType, ProductId};

use crate::error::{AppError, Result, add_breadcrumb, set_sentry_member};
use crate::middleware::VisitorSession;
use crate::middleware::session::{OAUTH_DATA_COOKIE_NAME, app_cookie, session_cookie};
use crate::state::AppState;
use crate::wix::types::{Cart, Member, Product};
use crate::wix::{OAuthData, WixError, WixSession};

/// Path of the store page.
pub const STORE_PATH: &str = "/store";

/// Path the hosted login returns to.
pub const LOGIN_CALLBACK_PATH: &str = "/login-callback";

// =============================================================================
// View Types
// =============================================================================

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.display_price().map(str::to_owned),
        }
    }
}

/// Cart line data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
}

/// Cart summary data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub status: CartStatus,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .line_items
                .iter()
                .map(|line| CartItemView {
                    name: line.name().to_string(),
                    quantity: line.quantity,
                    price: line
                        .price
                        .as_ref()
                        .map(|p| p.display())
                        .unwrap_or_default(),
                })
                .collect(),
            subtotal: cart.subtotal_display(),
            status: cart.status(),
        }
    }
}

impl CartView {
    /// Whether the checkout and login actions should be offered.
    #[must_use]
    pub fn has_items(&self) -> bool {
        self.status.can_checkout()
    }
}

/// Store page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/store.html")]
pub struct StoreTemplate {
    pub products: Vec<ProductView>,
    pub cart: CartView,
    pub member_name: Option<String>,
    pub notice: Option<&'static str>,
}

/// Query string of the store page.
#[derive(Debug, Default, Deserialize)]
pub struct StoreQuery {
    pub error: Option<String>,
}

impl StoreQuery {
    fn notice(&self) -> Option<&'static str> {
        match self.error.as_deref()? {
            "login" => Some("Login failed, please try again."),
            "empty-cart" => Some("Your cart is empty."),
            _ => Some("Something went wrong, please try again."),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Attach the handle's current token bundle as a `Set-Cookie`.
async fn with_session_cookie(
    state: &AppState,
    wix: &WixSession,
    response: impl IntoResponse,
) -> Result<Response> {
    let Some(tokens) = wix.tokens().await else {
        return Ok(response.into_response());
    };

    let cookie = session_cookie(&tokens, state.config().secure_cookies())?;
    Ok((AppendHeaders([(SET_COOKIE, cookie.encoded().to_string())]), response).into_response())
}

/// Fetch the current cart; a missing cart is the empty default.
async fn current_cart(wix: &WixSession) -> std::result::Result<Cart, WixError> {
    match wix.get_current_cart().await {
        Err(WixError::NotFound(_)) => Ok(Cart::default()),
        other => other,
    }
}

/// Fetch the member when the handle holds member tokens.
async fn current_member(wix: &WixSession) -> std::result::Result<Option<Member>, WixError> {
    if wix.logged_in().await {
        wix.get_my_member().await.map(Some)
    } else {
        Ok(None)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the store page.
///
/// Products, cart and member are fetched concurrently. A failed cart fetch
/// keeps the empty default cart; the token bundle is written back to the
/// cookie afterwards either way.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: VisitorSession,
    Query(query): Query<StoreQuery>,
) -> Result<Response> {
    let wix = state.wix().session(session.into_tokens());

    let (products, cart, member) = tokio::join!(
        wix.query_products(),
        current_cart(&wix),
        current_member(&wix)
    );

    let products = products.map_or_else(
        |e| {
            tracing::error!(error = %e, "Failed to load products");
            Vec::new()
        },
        |products| products.iter().map(ProductView::from).collect(),
    );

    let cart = cart.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch current cart");
        Cart::default()
    });

    let member = member.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch member");
        None
    });
    if let Some(member) = &member {
        set_sentry_member(&member.id, member.login_email.as_deref());
    }

    let template = StoreTemplate {
        products,
        cart: CartView::from(&cart),
        member_name: member.as_ref().map(Member::display_name),
        notice: query.notice(),
    };

    with_session_cookie(&state, &wix, template).await
}

/// Add one unit of a product to the current cart.
#[instrument(skip(state, session))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: VisitorSession,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let wix = state.wix().session(session.into_tokens());

    let product = wix.get_product(&ProductId::new(form.product_id)).await?;
    let cart = wix.add_to_current_cart(&product).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str())]),
    );
    tracing::info!(
        product_id = %product.id,
        line_items = cart.line_items.len(),
        "Added product to cart"
    );

    with_session_cookie(&state, &wix, Redirect::to(STORE_PATH)).await
}

/// Delete the current cart.
#[instrument(skip(state, session))]
pub async fn clear_cart(
    State(state): State<AppState>,
    session: VisitorSession,
) -> Result<Response> {
    let wix = state.wix().session(session.into_tokens());

    match wix.delete_current_cart().await {
        Ok(()) | Err(WixError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }
    add_breadcrumb("cart", "Cleared cart", None);

    with_session_cookie(&state, &wix, Redirect::to(STORE_PATH)).await
}

/// Create a checkout and send the browser to the hosted checkout page.
#[instrument(skip(state, session))]
pub async fn checkout(
    State(state): State<AppState>,
    session: VisitorSession,
) -> Result<Response> {
    let wix = state.wix().session(session.into_tokens());

    let cart = current_cart(&wix).await?;
    if !cart.status().can_checkout() {
        return with_session_cookie(
            &state,
            &wix,
            Redirect::to(&format!("{STORE_PATH}?error=empty-cart")),
        )
        .await;
    }

    let checkout_id = wix
        .create_checkout_from_current_cart(ChannelType::Web)
        .await?;
    let redirect = wix
        .checkout_redirect(checkout_id, &state.config().url_for(STORE_PATH))
        .await?;

    add_breadcrumb("checkout", "Redirected to checkout", None);
    with_session_cookie(&state, &wix, Redirect::to(&redirect.full_url)).await
}

/// Start a member login and send the browser to the hosted login page.
///
/// The PKCE data is kept in the `oauthRedirectData` cookie for the callback.
#[instrument(skip(state, session))]
pub async fn login(State(state): State<AppState>, session: VisitorSession) -> Result<Response> {
    let config = state.config();
    let wix = state.wix().session(session.into_tokens());

    let data = OAuthData::generate(
        &config.url_for(LOGIN_CALLBACK_PATH),
        &config.url_for(STORE_PATH),
    );
    let redirect = wix.auth_url(&data).await?;

    let oauth_json = serde_json::to_string(&data)
        .map_err(|e| AppError::Internal(format!("failed to serialize login state: {e}")))?;
    let oauth_cookie = app_cookie(OAUTH_DATA_COOKIE_NAME, oauth_json, config.secure_cookies());

    let response = (
        AppendHeaders([(SET_COOKIE, oauth_cookie.encoded().to_string())]),
        Redirect::to(&redirect.full_url),
    );
    with_session_cookie(&state, &wix, response).await
}
