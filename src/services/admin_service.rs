use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{AuditLogList, InventoryAdjustRequest, InventoryAdjustment, LowStockQuery},
        catalog::FeaturedCatalog,
        products::ProductList,
    },
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        inventory_logs::ActiveModel as InventoryLogActive,
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::{AuditLog, InventoryLog, Product},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service,
    state::AppState,
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_staff(user)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
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
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

/// Manual stock correction. The product row and its inventory log are
/// written in one transaction.
pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<InventoryAdjustment>> {
    ensure_staff(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = product_service::find_for_update(&txn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    let new_stock = product
        .stock
        .checked_add(payload.delta)
        .filter(|stock| *stock >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    let note = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("adjustment");
    let log = InventoryLogActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(updated.id),
        change_quantity: Set(payload.delta),
        reason: Set(format!("MANUAL: {note}")),
        changed_by: Set(Some(user.user_id)),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(product_id = %updated.id, delta = payload.delta, stock = new_stock, "inventory adjusted");
    state.audit.record(
        Some(user.user_id),
        "INVENTORY_ADJUST",
        format!("Product ID: {}, Delta: {}, Stock: {}", updated.id, payload.delta, new_stock),
    );

    Ok(ApiResponse::success(
        "Inventory updated",
        InventoryAdjustment {
            product: Product::from(updated),
            log: InventoryLog::from(log),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_audit_logs(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<AuditLogList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = AuditLogs::find().order_by_desc(AuditCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AuditLog::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Audit logs", AuditLogList { items }, Some(meta)))
}

/// Forces a catalog cache reload and waits for it.
pub async fn refresh_catalog(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<FeaturedCatalog>> {
    ensure_staff(user)?;
    let snapshot = state.catalog.refresh_now().await?;

    state.audit.record(
        Some(user.user_id),
        "REFRESH_CATALOG",
        format!("Products: {}", snapshot.products.len()),
    );

    let data = FeaturedCatalog::from_snapshot(&snapshot, false);
    Ok(ApiResponse::success("Catalog refreshed", data, Some(Meta::empty())))
}
