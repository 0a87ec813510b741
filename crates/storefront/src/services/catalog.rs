//! Example catalog shown on the landing page.
//!
//! Entries come either from a data collection (sorted by `orderId`) or from the
//! bundled `examples.json` asset. When an installed-apps endpoint is
//! configured, both reads run together and the entries are split into
//! installed and uninstalled sections. Any failure fails the whole load.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::{CatalogConfig, CatalogSource};
use crate::wix::types::DataItem;
use crate::wix::{WixError, WixSession};

/// Field the examples collection is sorted by.
pub const ORDER_FIELD: &str = "orderId";

/// Errors loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("data query failed: {0}")]
    Wix(#[from] WixError),

    #[error("installed apps request failed: {0}")]
    InstalledApps(#[from] reqwest::Error),

    #[error("failed to read examples asset: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid example entry: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One example link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleEntry {
    /// 1-based position in the listing.
    pub order_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Link target.
    pub slug: String,
}

impl TryFrom<DataItem> for ExampleEntry {
    type Error = serde_json::Error;

    fn try_from(item: DataItem) -> Result<Self, Self::Error> {
        serde_json::from_value(item.data)
    }
}

/// A titled group of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSection {
    pub heading: Option<&'static str>,
    pub entries: Vec<ExampleEntry>,
}

/// Catalog ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub sections: Vec<CatalogSection>,
}

impl Catalog {
    /// All entries in one untitled section.
    #[must_use]
    pub fn flat(entries: Vec<ExampleEntry>) -> Self {
        Self {
            sections: vec![CatalogSection {
                heading: None,
                entries,
            }],
        }
    }

    /// Entries split by installation state, installed first.
    #[must_use]
    pub fn partitioned(entries: Vec<ExampleEntry>, installed_apps: &[i64]) -> Self {
        let (installed, uninstalled) = partition(entries, installed_apps);
        Self {
            sections: vec![
                CatalogSection {
                    heading: Some("Installed"),
                    entries: installed,
                },
                CatalogSection {
                    heading: Some("Not installed"),
                    entries: uninstalled,
                },
            ],
        }
    }

    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.entries.is_empty())
    }
}

/// Split entries into `(installed, uninstalled)`.
///
/// `installed_apps` holds zero-based indexes, so an entry is installed when
/// `order_id - 1` appears in it. Order is preserved within each half.
#[must_use]
pub fn partition(
    entries: Vec<ExampleEntry>,
    installed_apps: &[i64],
) -> (Vec<ExampleEntry>, Vec<ExampleEntry>) {
    entries
        .into_iter()
        .partition(|entry| {
            entry
                .order_id
                .checked_sub(1)
                .is_some_and(|index| installed_apps.contains(&index))
        })
}

/// Load the catalog for the landing page.
///
/// # Errors
///
/// Returns an error if the entries or the installed-apps list cannot be read.
/// No partial result is returned.
#[instrument(skip_all)]
pub async fn load_catalog(
    config: &CatalogConfig,
    static_dir: &Path,
    wix: &WixSession,
    http: &reqwest::Client,
) -> Result<Catalog, CatalogError> {
    let entries = load_entries(&config.source, static_dir, wix);

    match &config.installed_apps_url {
        Some(url) => {
            let (entries, installed) =
                tokio::try_join!(entries, fetch_installed_apps(http, url))?;
            Ok(Catalog::partitioned(entries, &installed))
        }
        None => Ok(Catalog::flat(entries.await?)),
    }
}

async fn load_entries(
    source: &CatalogSource,
    static_dir: &Path,
    wix: &WixSession,
) -> Result<Vec<ExampleEntry>, CatalogError> {
    match source {
        CatalogSource::Collection { collection_id } => {
            let items = wix
                .query_data_items_ascending(collection_id, ORDER_FIELD)
                .await?;
            Ok(items
                .into_iter()
                .map(ExampleEntry::try_from)
                .collect::<Result<_, _>>()?)
        }
        CatalogSource::StaticAsset => {
            let bytes = tokio::fs::read(static_dir.join("examples.json")).await?;
            let mut entries: Vec<ExampleEntry> = serde_json::from_slice(&bytes)?;
            entries.sort_by_key(|e| e.order_id);
            Ok(entries)
        }
    }
}

async fn fetch_installed_apps(http: &reqwest::Client, url: &str) -> Result<Vec<i64>, CatalogError> {
    Ok(http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<i64>>()
        .await?)
}
