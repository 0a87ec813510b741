//! Per-request client handle bound to one visitor's token bundle.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use headless_demo_core::{AppId, ChannelType, CheckoutId, ProductId, TokenBundle};

use super::auth::OAuthData;
use super::cache::{CacheKey, CacheValue};
use super::client::{WixClient, read_json};
use super::types::{
    AddToCartRequest, AuthRedirect, AuthRequest, Cart, CartResponse, CatalogOptions,
    CatalogReference, CreateCheckoutRequest, CreateCheckoutResponse, CreateRedirectSessionRequest,
    CreateRedirectSessionResponse, DataItem, EcomCheckout, GetMemberResponse, GetProductResponse,
    LineItemInput, Member, Product, QueryDataItemsRequest, QueryDataItemsResponse,
    QueryProductsRequest, QueryProductsResponse, RedirectCallbacks, RedirectSession,
};
use super::WixError;

/// Authenticated handle for one request.
///
/// The handle owns its token bundle. When the access token has expired it is
/// refreshed before the next call, and the rotated bundle is available from
/// [`WixSession::tokens`] so callers can write it back to the cookie.
pub struct WixSession {
    client: WixClient,
    tokens: Mutex<Option<TokenBundle>>,
}

impl WixSession {
    pub(super) fn new(client: WixClient, tokens: Option<TokenBundle>) -> Self {
        Self {
            client,
            tokens: Mutex::new(tokens),
        }
    }

    /// Current token bundle, including any rotation done by this handle.
    pub async fn tokens(&self) -> Option<TokenBundle> {
        self.tokens.lock().await.clone()
    }

    /// Whether the handle holds member (not visitor) tokens.
    pub async fn logged_in(&self) -> bool {
        self.tokens
            .lock()
            .await
            .as_ref()
            .is_some_and(TokenBundle::is_member)
    }

    /// Return a usable access token, minting or refreshing first if needed.
    ///
    /// The lock is held across the token call so concurrent operations on the
    /// same handle never refresh twice.
    async fn access_token(&self) -> Result<String, WixError> {
        let mut guard = self.tokens.lock().await;
        let now = chrono::Utc::now().timestamp();

        let replacement = match guard.as_ref() {
            None => {
                debug!("handle has no tokens, minting visitor tokens");
                Some(self.client.generate_visitor_tokens().await?)
            }
            Some(bundle) if bundle.access_expired_at(now) => {
                debug!("access token expired, refreshing");
                Some(self.client.refresh_tokens(&bundle.refresh_token).await?)
            }
            Some(_) => None,
        };

        if let Some(bundle) = replacement {
            *guard = Some(bundle);
        }

        guard
            .as_ref()
            .map(|bundle| bundle.access_token.value.clone())
            .ok_or_else(|| WixError::OAuth("no tokens available".to_string()))
    }

    async fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, WixError> {
        let access_token = self.access_token().await?;
        Ok(self
            .client
            .http()
            .request(method, self.client.endpoint(path))
            .header(AUTHORIZATION, access_token))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, WixError> {
        let response = self.request(Method::GET, path).await?.send().await?;
        read_json(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, WixError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, path)
            .await?
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, WixError> {
        let response = self.request(Method::DELETE, path).await?.send().await?;
        read_json(response).await
    }

    // =========================================================================
    // Data Items
    // =========================================================================

    /// Query a data collection, sorted ascending by `field`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn query_data_items_ascending(
        &self,
        collection_id: &str,
        field: &str,
    ) -> Result<Vec<DataItem>, WixError> {
        let body = QueryDataItemsRequest::ascending(collection_id, field);
        let response: QueryDataItemsResponse =
            self.post("/wix-data/v2/items/query", &body).await?;
        Ok(response.data_items)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List store products (cached for 5 minutes).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn query_products(&self) -> Result<Arc<Vec<Product>>, WixError> {
        if let Some(CacheValue::Products(products)) =
            self.client.cache().get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let response: QueryProductsResponse = self
            .post(
                "/stores-reader/v1/products/query",
                &QueryProductsRequest::default(),
            )
            .await?;

        let products = Arc::new(response.products);
        self.client
            .cache()
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Get a single product (cached for 5 minutes).
    ///
    /// # Errors
    ///
    /// Returns `WixError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, WixError> {
        if !is_path_segment(id.as_str()) {
            return Err(WixError::NotFound(format!("product {id}")));
        }

        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.client.cache().get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let response: GetProductResponse = self
            .get(&format!("/stores-reader/v1/products/{id}"))
            .await?;

        self.client
            .cache()
            .insert(key, CacheValue::Product(Box::new(response.product.clone())))
            .await;

        Ok(response.product)
    }

    // =========================================================================
    // Current Cart
    // =========================================================================

    /// Fetch the visitor's current cart.
    ///
    /// # Errors
    ///
    /// Returns `WixError::NotFound` when the visitor has no cart yet.
    #[instrument(skip(self))]
    pub async fn get_current_cart(&self) -> Result<Cart, WixError> {
        let response: CartResponse = self.get("/ecom/v1/carts/current").await?;
        Ok(response.cart)
    }

    /// Add one unit of `product` to the current cart, creating it if needed.
    ///
    /// Every option group is set to its first listed choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_current_cart(&self, product: &Product) -> Result<Cart, WixError> {
        let body = AddToCartRequest {
            line_items: vec![line_item_for(product)],
        };
        let response: CartResponse = self
            .post("/ecom/v1/carts/current/add-to-cart", &body)
            .await?;
        Ok(response.cart)
    }

    /// Delete the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete_current_cart(&self) -> Result<(), WixError> {
        let _: serde_json::Value = self.delete("/ecom/v1/carts/current").await?;
        Ok(())
    }

    /// Create a checkout from the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or the API request fails.
    #[instrument(skip(self))]
    pub async fn create_checkout_from_current_cart(
        &self,
        channel_type: ChannelType,
    ) -> Result<CheckoutId, WixError> {
        let response: CreateCheckoutResponse = self
            .post(
                "/ecom/v1/carts/current/create-checkout",
                &CreateCheckoutRequest { channel_type },
            )
            .await?;
        Ok(response.checkout_id)
    }

    // =========================================================================
    // Redirects
    // =========================================================================

    /// Create a hosted checkout page for `checkout_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(checkout_id = %checkout_id))]
    pub async fn checkout_redirect(
        &self,
        checkout_id: CheckoutId,
        post_flow_url: &str,
    ) -> Result<RedirectSession, WixError> {
        let body = CreateRedirectSessionRequest {
            ecom_checkout: Some(EcomCheckout { checkout_id }),
            callbacks: Some(RedirectCallbacks {
                post_flow_url: post_flow_url.to_string(),
            }),
            ..Default::default()
        };
        self.create_redirect_session(&body).await
    }

    /// Create a hosted-login page for a PKCE login attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn auth_url(&self, data: &OAuthData) -> Result<RedirectSession, WixError> {
        let body = CreateRedirectSessionRequest {
            auth: Some(AuthRedirect {
                auth_request: AuthRequest {
                    client_id: self.client.client_id().to_string(),
                    redirect_uri: data.redirect_uri.clone(),
                    code_challenge: data.code_challenge.clone(),
                    code_challenge_method: "S256".to_string(),
                    response_mode: "query".to_string(),
                    response_type: "code".to_string(),
                    scope: "offline_access".to_string(),
                    state: data.state.clone(),
                },
            }),
            ..Default::default()
        };
        self.create_redirect_session(&body).await
    }

    async fn create_redirect_session(
        &self,
        body: &CreateRedirectSessionRequest,
    ) -> Result<RedirectSession, WixError> {
        let response: CreateRedirectSessionResponse = self
            .post("/redirects-api/v1/redirect-session", body)
            .await?;
        Ok(response.redirect_session)
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Fetch the logged-in member.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle holds visitor tokens or the request fails.
    #[instrument(skip(self))]
    pub async fn get_my_member(&self) -> Result<Member, WixError> {
        let response: GetMemberResponse = self.get("/members/v1/members/my").await?;
        Ok(response.member)
    }
}

/// Build the add-to-cart line item for a product.
///
/// Picks the first choice of every option group; groups without choices are
/// skipped.
#[must_use]
pub fn line_item_for(product: &Product) -> LineItemInput {
    let options: BTreeMap<String, String> = product
        .product_options
        .iter()
        .filter_map(|option| {
            option
                .choices
                .first()
                .map(|choice| (option.name.clone(), choice.description.clone()))
        })
        .collect();

    LineItemInput {
        catalog_reference: CatalogReference {
            app_id: AppId::stores(),
            catalog_item_id: product.id.clone(),
            options: Some(CatalogOptions { options }),
        },
        quantity: 1,
    }
}

/// Whether `id` can stand alone as one URL path segment.
///
/// Product ids arrive from form posts and are placed in the request path.
fn is_path_segment(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
