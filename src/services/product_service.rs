use sea_orm::sea_query::LockType;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::products::{ProductDetail, ProductList},
    entity::{
        product_images::{Column as ImageCol, Entity as ProductImages},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Product, ProductImage},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    let images = product
        .find_related(ProductImages)
        .order_by_desc(ImageCol::IsPrimary)
        .order_by_asc(ImageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductImage::from)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: Product::from(product),
            images,
        },
        Some(Meta::empty()),
    ))
}

/// Row-locked read for use inside a transaction. Concurrent writers of the
/// same product wait until this transaction ends, so a stock check made on
/// the returned row still holds when the decrement is written.
pub async fn find_for_update<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<ProductModel>> {
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(product)
}

/// Primary image if one is flagged, else the oldest.
pub async fn cover_image_url<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> AppResult<Option<String>> {
    let image = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product_id))
        .order_by_desc(ImageCol::IsPrimary)
        .order_by_asc(ImageCol::CreatedAt)
        .one(conn)
        .await?;
    Ok(image.map(|img| img.image_url))
}
