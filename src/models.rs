use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    addresses, audit_logs, inventory_logs, order_items, order_status::OrderStatus,
    order_status_history, orders, product_images, products,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub is_active: bool,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub material: Option<String>,
    pub space: Option<String>,
    pub menh: Option<String>,
    pub huong: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Product {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            is_active: model.is_active,
            brand: model.brand,
            color: model.color,
            width: model.width,
            height: model.height,
            depth: model.depth,
            material: model.material,
            space: model.space,
            menh: model.menh,
            huong: model.huong,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub image_url: String,
    pub is_primary: bool,
}

impl From<product_images::Model> for ProductImage {
    fn from(model: product_images::Model) -> Self {
        ProductImage {
            id: model.id,
            image_url: model.image_url,
            is_primary: model.is_primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub receiver_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub is_default: bool,
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Address {
            id: model.id,
            user_id: model.user_id,
            receiver_name: model.receiver_name,
            phone: model.phone,
            address: model.address,
            city: model.city,
            is_default: model.is_default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Order {
            id: model.id,
            user_id: model.user_id,
            total_amount: model.total_amount,
            status: model.status,
            shipping_address: model.shipping_address,
            receiver_name: model.receiver_name,
            receiver_phone: model.receiver_phone,
            payment_method: model.payment_method,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub price: i64,
    pub product_name: String,
    pub product_brand: Option<String>,
    pub product_color: Option<String>,
    pub product_size: Option<String>,
    pub product_material: Option<String>,
    pub product_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        OrderItem {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price,
            product_name: model.product_name,
            product_brand: model.product_brand,
            product_color: model.product_color,
            product_size: model.product_size,
            product_material: model.product_material,
            product_image_url: model.product_image_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusChange {
    pub id: Uuid,
    pub order_id: Uuid,
    pub old_status: Option<OrderStatus>,
    pub new_status: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

impl From<order_status_history::Model> for StatusChange {
    fn from(model: order_status_history::Model) -> Self {
        StatusChange {
            id: model.id,
            order_id: model.order_id,
            old_status: model.old_status,
            new_status: model.new_status,
            changed_at: model.changed_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryLog {
    pub id: Uuid,
    pub product_id: Uuid,
    pub change_quantity: i32,
    pub reason: String,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<inventory_logs::Model> for InventoryLog {
    fn from(model: inventory_logs::Model) -> Self {
        InventoryLog {
            id: model.id,
            product_id: model.product_id,
            change_quantity: model.change_quantity,
            reason: model.reason,
            changed_by: model.changed_by,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub target: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_logs::Model> for AuditLog {
    fn from(model: audit_logs::Model) -> Self {
        AuditLog {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            target: model.target,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
