//! Landing page listing the example catalog.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::middleware::VisitorSession;
use crate::services::catalog::{Catalog, load_catalog};
use crate::state::AppState;

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/catalog.html")]
pub struct CatalogTemplate {
    pub catalog: Catalog,
}

/// Display the example catalog.
///
/// A failed load renders an empty list; the error is logged, not shown.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: VisitorSession) -> CatalogTemplate {
    let wix = state.wix().session(session.into_tokens());
    let config = state.config();

    let catalog = match load_catalog(
        &config.catalog,
        &config.static_dir,
        &wix,
        state.wix().http(),
    )
    .await
    {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load example catalog");
            Catalog::default()
        }
    };

    CatalogTemplate { catalog }
}
