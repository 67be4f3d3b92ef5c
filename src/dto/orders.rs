use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::order_status::OrderStatus,
    models::{Order, OrderItem, StatusChange},
};

/// Checkout input. A saved `address_id` wins over the inline fields; the
/// inline address is used only when receiver name, phone and address are
/// all present.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub address_id: Option<Uuid>,
    pub receiver_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub status_history: Vec<StatusChange>,
    pub next_statuses: Vec<OrderStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
