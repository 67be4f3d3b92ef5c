use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartLine, CartView},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// A cart together with its line items and the products they point at.
#[derive(Debug)]
pub struct CartContents {
    pub cart: CartModel,
    pub lines: Vec<(CartItemModel, Option<ProductModel>)>,
}

impl CartContents {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Carts are created lazily, one per user.
pub async fn get_or_create_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<CartModel> {
    if let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(cart);
    }

    // Two first requests may race here; the unique user_id keeps one row.
    Carts::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: NotSet,
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;

    Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart for user {user_id} vanished")))
}

/// Reads the user's cart without creating one.
pub async fn load_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Option<CartContents>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?;
    match cart {
        Some(cart) => Ok(Some(load_lines(conn, cart).await?)),
        None => Ok(None),
    }
}

/// Takes `FOR UPDATE` on the user's cart row. Every writer of cart lines
/// holds this lock, so checkout sees the lines it is about to remove.
pub async fn lock_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(cart)
}

/// Like [`load_cart`], but the cart row stays locked until `conn` commits.
pub async fn load_cart_for_update<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<CartContents>> {
    match lock_cart(conn, user_id).await? {
        Some(cart) => Ok(Some(load_lines(conn, cart).await?)),
        None => Ok(None),
    }
}

async fn load_lines<C: ConnectionTrait>(conn: &C, cart: CartModel) -> AppResult<CartContents> {
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?;
    Ok(CartContents { cart, lines })
}

pub async fn delete_cart_items<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Removes only the given lines; anything else in the cart stays.
pub async fn delete_cart_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    item_ids: Vec<Uuid>,
) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart_id))
        .filter(CartItemCol::Id.is_in(item_ids))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Creates the cart if needed, then reopens it under the row lock.
async fn locked_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<CartModel> {
    get_or_create_cart(conn, user_id).await?;
    lock_cart(conn, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart for user {user_id} vanished")))
}

pub async fn get_my_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", payload.product_id)))?;
    if !product.is_active {
        return Err(AppError::BadRequest(format!(
            "Product {} is not available",
            product.name
        )));
    }

    // Concurrent adds of the same product queue on the cart lock, so the
    // second one sees the first one's line.
    let txn = state.orm.begin().await?;
    let cart = locked_cart(&txn, user.user_id).await?;
    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&txn)
        .await?;

    let wanted = existing.as_ref().map_or(0, |item| item.quantity) + payload.quantity;
    if product.stock < wanted {
        return Err(AppError::BadRequest(format!(
            "Insufficient stock for product {}",
            product.name
        )));
    }

    match existing {
        Some(item) => {
            let mut active: CartItemActive = item.into();
            active.quantity = Set(wanted);
            active.update(&txn).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(wanted),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }
    txn.commit().await?;

    state.audit.record(
        Some(user.user_id),
        "ADD_TO_CART",
        format!("Product ID: {}, Quantity: {}", product.id, payload.quantity),
    );

    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("Item added to cart", view, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let txn = state.orm.begin().await?;
    let cart = locked_cart(&txn, user.user_id).await?;
    let removed = delete_cart_lines(&txn, cart.id, vec![item_id]).await?;
    if removed == 0 {
        return Err(AppError::NotFound(format!("Cart item {item_id}")));
    }
    txn.commit().await?;

    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("Removed from cart", view, Some(Meta::empty())))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let txn = state.orm.begin().await?;
    let cart = locked_cart(&txn, user.user_id).await?;
    let removed = delete_cart_items(&txn, cart.id).await?;
    txn.commit().await?;
    tracing::debug!(cart_id = %cart.id, removed, "cart cleared");

    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("Cart cleared", view, Some(Meta::empty())))
}

async fn cart_view<C: ConnectionTrait>(conn: &C, cart: CartModel) -> AppResult<CartView> {
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?;

    let items: Vec<CartLine> = lines
        .into_iter()
        .filter_map(|(item, product)| {
            product.map(|p| CartLine {
                id: item.id,
                product: Product::from(p),
                quantity: item.quantity,
            })
        })
        .collect();
    let subtotal = items
        .iter()
        .map(|line| line.product.price * i64::from(line.quantity))
        .sum();

    Ok(CartView {
        id: cart.id,
        items,
        subtotal,
    })
}
