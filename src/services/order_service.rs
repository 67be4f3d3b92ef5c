use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, Order as SortDir};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CancelOrderRequest, CreateOrderRequest, OrderDetail, OrderList, UpdateOrderStatusRequest,
    },
    entity::{
        addresses::Model as AddressModel,
        cart_items::Model as CartItemModel,
        inventory_logs::ActiveModel as InventoryLogActive,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        order_status::OrderStatus,
        order_status_history::{
            ActiveModel as HistoryActive, Column as HistoryCol, Entity as OrderStatusHistory,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{ActiveModel as ProductActive, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Order, OrderItem, StatusChange},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, OrderSortBy, SortOrder},
    services::{address_service, cart_service, product_service},
    state::AppState,
};

pub const DEFAULT_PAYMENT_METHOD: &str = "COD";

/// Delivery details copied onto the order header.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShippingSnapshot {
    pub shipping_address: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
}

impl ShippingSnapshot {
    pub fn from_saved(address: &AddressModel) -> Self {
        Self {
            shipping_address: Some(format!("{}, {}", address.address, address.city)),
            receiver_name: Some(address.receiver_name.clone()),
            receiver_phone: Some(address.phone.clone()),
        }
    }

    /// Inline fields count only when receiver name, phone and address are
    /// all given; otherwise the order carries no address.
    pub fn from_inline(req: &CreateOrderRequest) -> Self {
        let present = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match (
            present(&req.receiver_name),
            present(&req.phone),
            present(&req.address),
        ) {
            (Some(name), Some(phone), Some(address)) => {
                let shipping_address = match present(&req.city) {
                    Some(city) => format!("{address}, {city}"),
                    None => address,
                };
                Self {
                    shipping_address: Some(shipping_address),
                    receiver_name: Some(name),
                    receiver_phone: Some(phone),
                }
            }
            _ => Self::default(),
        }
    }
}

/// Checks one cart line against the locked product row and returns the
/// line total.
pub fn check_line(
    product_id: Uuid,
    product: Option<&ProductModel>,
    quantity: i32,
) -> AppResult<i64> {
    let product = match product {
        Some(p) if p.is_active => p,
        _ => {
            return Err(AppError::BadRequest(format!(
                "Product {product_id} is not available"
            )));
        }
    };
    if quantity <= 0 {
        return Err(AppError::BadRequest(format!(
            "Invalid quantity for product {}",
            product.name
        )));
    }
    if product.stock < quantity {
        return Err(AppError::BadRequest(format!(
            "Insufficient stock for product {}",
            product.name
        )));
    }
    product
        .price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| {
            AppError::BadRequest(format!("Order total is too large for product {}", product.name))
        })
}

/// `W120xH80xD60cm` when all three dimensions are known.
pub fn size_label(width: Option<f64>, height: Option<f64>, depth: Option<f64>) -> Option<String> {
    match (width, height, depth) {
        (Some(w), Some(h), Some(d)) => Some(format!("W{w}xH{h}xD{d}cm")),
        _ => None,
    }
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let txn = state.orm.begin().await?;

    // The cart lock holds off add/remove until this order commits, and the
    // cart is read on `txn` so its lines are exactly what gets ordered.
    let cart = cart_service::load_cart_for_update(&txn, user.user_id)
        .await?
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let shipping = match payload.address_id {
        Some(address_id) => {
            let address = address_service::find_owned(&txn, address_id, user.user_id).await?;
            ShippingSnapshot::from_saved(&address)
        }
        None => ShippingSnapshot::from_inline(&payload),
    };

    let cart_id = cart.cart.id;
    let mut lines: Vec<CartItemModel> = cart.lines.into_iter().map(|(item, _)| item).collect();
    // Lock rows in a fixed order so concurrent checkouts cannot deadlock.
    lines.sort_by_key(|item| item.product_id);

    let mut total_amount: i64 = 0;
    let mut locked: Vec<(CartItemModel, ProductModel)> = Vec::with_capacity(lines.len());
    for item in lines {
        let product = product_service::find_for_update(&txn, item.product_id).await?;
        let line_total = check_line(item.product_id, product.as_ref(), item.quantity)?;
        total_amount = total_amount
            .checked_add(line_total)
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;
        if let Some(product) = product {
            locked.push((item, product));
        }
    }
    let ordered: Vec<Uuid> = locked.iter().map(|(item, _)| item.id).collect();

    let order_id = Uuid::new_v4();
    let payment_method = payload
        .payment_method
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        shipping_address: Set(shipping.shipping_address),
        receiver_name: Set(shipping.receiver_name),
        receiver_phone: Set(shipping.receiver_phone),
        payment_method: Set(payment_method),
        notes: Set(payload.notes.filter(|n| !n.trim().is_empty())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (item, product) in locked {
        let image_url = product_service::cover_image_url(&txn, product.id).await?;

        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            quantity: Set(item.quantity),
            price: Set(product.price),
            product_name: Set(product.name.clone()),
            product_brand: Set(product.brand.clone()),
            product_color: Set(product.color.clone()),
            product_size: Set(size_label(product.width, product.height, product.depth)),
            product_material: Set(product.material.clone()),
            product_image_url: Set(image_url),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let product_id = product.id;
        let remaining = product.stock - item.quantity;
        let mut active: ProductActive = product.into();
        active.stock = Set(remaining);
        active.update(&txn).await?;

        InventoryLogActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            change_quantity: Set(-item.quantity),
            reason: Set(format!("ORDER: {}", order.id)),
            changed_by: Set(Some(user.user_id)),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    cart_service::delete_cart_lines(&txn, cart_id, ordered).await?;
    append_history(&txn, order.id, None, OrderStatus::Pending).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %user.user_id, total_amount, "order created");
    state.audit.record(
        Some(user.user_id),
        "CREATE_ORDER",
        format!("Order ID: {}, Total: {}", order.id, total_amount),
    );

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("Order created", detail, Some(Meta::empty())))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_orders_where(state, condition, query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let mut condition = Condition::all();
    if let Some(user_id) = query.user_id {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    list_orders_where(state, condition, query).await
}

async fn list_orders_where(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status_filter()? {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_col = match query.sort_by.unwrap_or(OrderSortBy::CreatedAt) {
        OrderSortBy::CreatedAt => OrderCol::CreatedAt,
        OrderSortBy::TotalAmount => OrderCol::TotalAmount,
        OrderSortBy::Status => OrderCol::Status,
    };
    let direction = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => SortDir::Asc,
        SortOrder::Desc => SortDir::Desc,
    };

    let finder = Orders::find().filter(condition).order_by(sort_col, direction);
    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items: orders }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;

    if !user.is_staff() && order.user_id != user.user_id {
        return Err(AppError::Forbidden("You can only view your own orders".into()));
    }

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Staff override. Any target is accepted except a no-op or leaving a
/// terminal status.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_staff(user)?;
    let new_status: OrderStatus = payload.status.parse().map_err(AppError::BadRequest)?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id).await?;
    let old_status = order.status;

    if old_status.is_terminal() {
        return Err(AppError::BadRequest(format!(
            "Order {id} is {old_status} and can no longer change status"
        )));
    }
    if old_status == new_status {
        return Err(AppError::BadRequest(format!(
            "Order {id} is already {new_status}"
        )));
    }

    let order = set_status(&txn, order, new_status).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, from = %old_status, to = %new_status, "order status updated");
    state.audit.record(
        Some(user.user_id),
        "UPDATE_ORDER_STATUS",
        format!("Order ID: {id}, {old_status} -> {new_status}"),
    );

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("Order updated", detail, Some(Meta::empty())))
}

/// Owner self-service cancel. Stock is not returned to inventory.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CancelOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id).await?;

    if order.user_id != user.user_id {
        return Err(AppError::Forbidden("You can only cancel your own orders".into()));
    }

    let old_status = order.status;
    if !old_status.is_cancellable() {
        return Err(AppError::BadRequest(format!(
            "Cannot cancel order with status \"{old_status}\". Only orders in PENDING, CONFIRMED or PROCESSING status can be cancelled."
        )));
    }

    let order = set_status(&txn, order, OrderStatus::Cancelled).await?;
    txn.commit().await?;

    let reason = payload
        .reason
        .filter(|r| !r.trim().is_empty())
        .map(|r| format!(" | Reason: {r}"))
        .unwrap_or_default();
    tracing::info!(order_id = %id, from = %old_status, "order cancelled by owner");
    state.audit.record(
        Some(user.user_id),
        "CANCEL_ORDER",
        format!("Order ID: {id}, {old_status} -> CANCELLED{reason}"),
    );

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("Order cancelled", detail, Some(Meta::empty())))
}

async fn lock_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))
}

async fn set_status<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
    status: OrderStatus,
) -> AppResult<OrderModel> {
    let old_status = order.status;
    let mut active: OrderActive = order.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(conn).await?;
    append_history(conn, order.id, Some(old_status), status).await?;
    Ok(order)
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    old_status: Option<OrderStatus>,
    new_status: OrderStatus,
) -> AppResult<()> {
    HistoryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        old_status: Set(old_status),
        new_status: Set(new_status),
        changed_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn load_detail<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderDetail> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::ProductName)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    let status_history = OrderStatusHistory::find()
        .filter(HistoryCol::OrderId.eq(order.id))
        .order_by_asc(HistoryCol::ChangedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(StatusChange::from)
        .collect();

    let next_statuses = order.status.lifecycle_successors().to_vec();
    Ok(OrderDetail {
        order: Order::from(order),
        items,
        status_history,
        next_statuses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i32, price: i64, active: bool) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: "Sofa Mộc".into(),
            description: None,
            price,
            stock,
            is_active: active,
            brand: Some("Hòa Phát".into()),
            color: None,
            width: Some(120.0),
            height: Some(80.0),
            depth: Some(60.5),
            material: None,
            space: None,
            menh: None,
            huong: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn line_total_is_price_times_quantity() {
        let p = product(5, 100_000, true);
        assert_eq!(check_line(p.id, Some(&p), 2).unwrap(), 200_000);
    }

    #[test]
    fn overflowing_line_total_is_rejected() {
        let p = product(5, i64::MAX / 2, true);
        match check_line(p.id, Some(&p), 3) {
            Err(AppError::BadRequest(msg)) => assert!(msg.starts_with("Order total is too large")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn exact_stock_is_enough() {
        let p = product(2, 10, true);
        assert_eq!(check_line(p.id, Some(&p), 2).unwrap(), 20);
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let p = product(0, 10, true);
        let err = check_line(p.id, Some(&p), 1).unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "Insufficient stock for product Sofa Mộc"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inactive_or_missing_product_is_unavailable() {
        let p = product(10, 10, false);
        assert!(matches!(
            check_line(p.id, Some(&p), 1),
            Err(AppError::BadRequest(msg)) if msg.contains("is not available")
        ));
        let missing = Uuid::new_v4();
        assert!(matches!(
            check_line(missing, None, 1),
            Err(AppError::BadRequest(msg)) if msg.contains(&missing.to_string())
        ));
    }

    #[test]
    fn size_label_needs_all_dimensions() {
        assert_eq!(
            size_label(Some(120.0), Some(80.0), Some(60.5)).as_deref(),
            Some("W120xH80xD60.5cm")
        );
        assert_eq!(size_label(Some(120.0), None, Some(60.0)), None);
    }

    #[test]
    fn inline_address_requires_name_phone_and_address() {
        let req = CreateOrderRequest {
            receiver_name: Some("Nguyễn Văn A".into()),
            phone: Some("0912345678".into()),
            address: Some("123 Đường ABC".into()),
            city: Some("Hà Nội".into()),
            ..Default::default()
        };
        let snap = ShippingSnapshot::from_inline(&req);
        assert_eq!(snap.shipping_address.as_deref(), Some("123 Đường ABC, Hà Nội"));
        assert_eq!(snap.receiver_phone.as_deref(), Some("0912345678"));

        let no_city = CreateOrderRequest {
            city: None,
            ..req
        };
        assert_eq!(
            ShippingSnapshot::from_inline(&no_city).shipping_address.as_deref(),
            Some("123 Đường ABC")
        );

        let missing_phone = CreateOrderRequest {
            receiver_name: Some("B".into()),
            phone: Some("  ".into()),
            address: Some("x".into()),
            ..Default::default()
        };
        assert_eq!(ShippingSnapshot::from_inline(&missing_phone), ShippingSnapshot::default());
    }

    #[test]
    fn saved_address_snapshot_joins_address_and_city() {
        let address = AddressModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            receiver_name: "Trần B".into(),
            phone: "0987".into(),
            address: "45 Lê Lợi".into(),
            city: "Đà Nẵng".into(),
            is_default: true,
        };
        let snap = ShippingSnapshot::from_saved(&address);
        assert_eq!(snap.shipping_address.as_deref(), Some("45 Lê Lợi, Đà Nẵng"));
        assert_eq!(snap.receiver_name.as_deref(), Some("Trần B"));
    }
}
