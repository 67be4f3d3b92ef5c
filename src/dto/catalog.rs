use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{catalog_cache::CatalogSnapshot, models::Product};

#[derive(Debug, Serialize, ToSchema)]
pub struct FeaturedCatalog {
    /// `None` until the first successful load.
    pub loaded_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub items: Vec<Product>,
}

impl FeaturedCatalog {
    pub fn from_snapshot(snapshot: &CatalogSnapshot, stale: bool) -> Self {
        Self {
            loaded_at: snapshot.loaded_at,
            stale,
            items: snapshot.products.as_ref().clone(),
        }
    }
}
