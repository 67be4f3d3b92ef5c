use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::catalog::FeaturedCatalog, error::AppResult, response::ApiResponse,
    services::catalog_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/featured", get(featured))
}

#[utoipa::path(
    get,
    path = "/api/catalog/featured",
    responses(
        (status = 200, description = "Cached snapshot of the newest active products", body = ApiResponse<FeaturedCatalog>)
    ),
    tag = "Catalog"
)]
pub async fn featured(State(state): State<AppState>) -> AppResult<Json<ApiResponse<FeaturedCatalog>>> {
    let resp = catalog_service::featured(&state).await?;
    Ok(Json(resp))
}
