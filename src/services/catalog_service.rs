use crate::{
    dto::catalog::FeaturedCatalog,
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Served from memory; a stale snapshot triggers a background reload and is
/// still returned as-is.
pub async fn featured(state: &AppState) -> AppResult<ApiResponse<FeaturedCatalog>> {
    let snapshot = state.catalog.snapshot();
    let stale = state.catalog.is_stale(&snapshot);
    let data = FeaturedCatalog::from_snapshot(&snapshot, stale);
    Ok(ApiResponse::success("Featured products", data, Some(Meta::empty())))
}
