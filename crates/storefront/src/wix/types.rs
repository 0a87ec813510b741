//! Request and response types for the commerce REST APIs.
//!
//! Field names follow the service's camelCase JSON. Unknown fields are
//! ignored, and most fields are optional because the service omits empty
//! values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use headless_demo_core::{
    AppId, CartId, CartStatus, ChannelType, CheckoutId, DataItemId, LineItemId, MemberId,
    MultiCurrencyPrice, ProductId,
};

// =============================================================================
// OAuth
// =============================================================================

/// Raw response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Body posted to the token endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub grant_type: &'a str,
    #[serde(rename = "refresh_token", skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<&'a str>,
}

impl<'a> TokenRequest<'a> {
    /// Anonymous visitor grant.
    #[must_use]
    pub const fn anonymous(client_id: &'a str) -> Self {
        Self {
            client_id,
            grant_type: "anonymous",
            refresh_token: None,
            code: None,
            code_verifier: None,
            redirect_uri: None,
        }
    }
}

// =============================================================================
// Data Items
// =============================================================================

/// A single item from a data collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataItem {
    pub id: DataItemId,
    #[serde(default)]
    pub data_collection_id: Option<String>,
    /// User-defined fields of the item.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Sort direction for data queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sorting {
    pub field_name: String,
    pub order: SortOrder,
}

#[derive(Debug, Serialize)]
pub struct Paging {
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct DataQuery {
    pub sort: Vec<Sorting>,
    pub paging: Paging,
}

/// Body of a data items query.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDataItemsRequest {
    pub data_collection_id: String,
    pub query: DataQuery,
}

impl QueryDataItemsRequest {
    /// Query a collection sorted ascending by one field.
    #[must_use]
    pub fn ascending(collection_id: &str, field: &str) -> Self {
        Self {
            data_collection_id: collection_id.to_string(),
            query: DataQuery {
                sort: vec![Sorting {
                    field_name: field.to_string(),
                    order: SortOrder::Asc,
                }],
                paging: Paging { limit: 100 },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDataItemsResponse {
    #[serde(default)]
    pub data_items: Vec<DataItem>,
}

// =============================================================================
// Products
// =============================================================================

/// A store product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub product_options: Vec<ProductOption>,
    #[serde(default)]
    pub price_data: Option<PriceData>,
}

impl Product {
    /// Formatted price, if the product has one.
    #[must_use]
    pub fn display_price(&self) -> Option<&str> {
        self.price_data
            .as_ref()
            .and_then(|p| p.formatted.as_ref())
            .map(|f| f.price.as_str())
    }
}

/// A product option group, e.g. "Size".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub name: String,
    #[serde(default)]
    pub option_type: Option<String>,
    #[serde(default)]
    pub choices: Vec<OptionChoice>,
}

/// One choice within an option group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChoice {
    pub description: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub visible: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceData {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub formatted: Option<FormattedPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedPrice {
    pub price: String,
}

#[derive(Debug, Serialize)]
pub struct QueryProductsRequest {
    pub query: ProductQuery,
}

#[derive(Debug, Serialize)]
pub struct ProductQuery {
    pub paging: Paging,
}

impl Default for QueryProductsRequest {
    fn default() -> Self {
        Self {
            query: ProductQuery {
                paging: Paging { limit: 100 },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryProductsResponse {
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct GetProductResponse {
    pub product: Product,
}

// =============================================================================
// Cart
// =============================================================================

/// Catalog options of a line item, keyed by option group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CatalogOptions {
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Reference from a line item to the catalog that owns the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReference {
    pub app_id: AppId,
    pub catalog_item_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<CatalogOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductName {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub translated: Option<String>,
}

/// A line item in the current cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub id: Option<LineItemId>,
    pub quantity: u32,
    pub catalog_reference: CatalogReference,
    #[serde(default)]
    pub product_name: Option<ProductName>,
    #[serde(default)]
    pub price: Option<MultiCurrencyPrice>,
}

impl LineItem {
    /// Display name, preferring the translated name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.product_name.as_ref().map_or("", |n| {
            n.translated
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(&n.original)
        })
    }
}

/// The visitor's current cart.
///
/// `Cart::default()` is the "no cart yet" value rendered before the first
/// successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub id: Option<CartId>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub subtotal: Option<MultiCurrencyPrice>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl Cart {
    /// Current position in the shopping flow.
    #[must_use]
    pub fn status(&self) -> CartStatus {
        CartStatus::from_line_count(self.line_items.len())
    }

    /// Formatted subtotal, or an empty string when unknown.
    #[must_use]
    pub fn subtotal_display(&self) -> String {
        self.subtotal
            .as_ref()
            .map(MultiCurrencyPrice::display)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct CartResponse {
    #[serde(default)]
    pub cart: Cart,
}

/// Line item as sent to add-to-cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub catalog_reference: CatalogReference,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub line_items: Vec<LineItemInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub channel_type: ChannelType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub checkout_id: CheckoutId,
}

// =============================================================================
// Redirects
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcomCheckout {
    pub checkout_id: CheckoutId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectCallbacks {
    pub post_flow_url: String,
}

/// Hosted-login request for the PKCE authorization code flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub response_mode: String,
    pub response_type: String,
    pub scope: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRedirect {
    pub auth_request: AuthRequest,
}

/// Body of a redirect session request; exactly one target is set.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateRedirectSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecom_checkout: Option<EcomCheckout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthRedirect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<RedirectCallbacks>,
}

/// A hosted page the browser is sent to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSession {
    #[serde(default)]
    pub id: Option<String>,
    pub full_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRedirectSessionResponse {
    pub redirect_session: RedirectSession,
}

// =============================================================================
// Members
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MemberProfile {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// The logged-in site member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    #[serde(default)]
    pub login_email: Option<String>,
    #[serde(default)]
    pub profile: Option<MemberProfile>,
}

impl Member {
    /// Nickname, falling back to login email, then to the member ID.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.profile
            .as_ref()
            .and_then(|p| p.nickname.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| self.login_email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct GetMemberResponse {
    pub member: Member,
}
