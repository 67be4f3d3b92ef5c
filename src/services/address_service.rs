use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
    entity::addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses, Model as AddressModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Someone else's address is reported exactly like a missing one.
pub async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<AddressModel> {
    Addresses::find_by_id(id)
        .filter(AddressCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Address {id}")))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    for (field, value) in [
        ("receiver_name", &payload.receiver_name),
        ("phone", &payload.phone),
        ("address", &payload.address),
        ("city", &payload.city),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} must not be empty")));
        }
    }

    let is_default = payload.is_default.unwrap_or(false);
    let txn = state.orm.begin().await?;
    if is_default {
        clear_default(&txn, user.user_id).await?;
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        receiver_name: Set(payload.receiver_name),
        phone: Set(payload.phone),
        address: Set(payload.address),
        city: Set(payload.city),
        is_default: Set(is_default),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Address created",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    for (field, value) in [
        ("receiver_name", &payload.receiver_name),
        ("phone", &payload.phone),
        ("address", &payload.address),
        ("city", &payload.city),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(AppError::BadRequest(format!("{field} must not be empty")));
        }
    }

    let txn = state.orm.begin().await?;
    let existing = find_owned(&txn, id, user.user_id).await?;
    if payload.is_default == Some(true) {
        clear_default(&txn, user.user_id).await?;
    }

    let is_default = payload.is_default.unwrap_or(existing.is_default);
    let mut active: AddressActive = existing.into();
    active.is_default = Set(is_default);
    if let Some(receiver_name) = payload.receiver_name {
        active.receiver_name = Set(receiver_name);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    let address = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Address updated",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn get_default_address(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Address>> {
    let address = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .filter(AddressCol::IsDefault.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Default address".into()))?;
    Ok(ApiResponse::success("OK", Address::from(address), Some(Meta::empty())))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_asc(AddressCol::ReceiverName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    Ok(ApiResponse::success("OK", AddressList { items }, Some(Meta::empty())))
}

pub async fn get_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let address = find_owned(&state.orm, id, user.user_id).await?;
    Ok(ApiResponse::success("OK", Address::from(address), Some(Meta::empty())))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Addresses::delete_many()
        .filter(AddressCol::Id.eq(id))
        .filter(AddressCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("Address {id}")));
    }

    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// At most one default per user.
async fn clear_default<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(AddressCol::IsDefault, Expr::value(false))
        .filter(AddressCol::UserId.eq(user_id))
        .filter(AddressCol::IsDefault.eq(true))
        .exec(conn)
        .await?;
    Ok(())
}
