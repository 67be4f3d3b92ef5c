use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{AuditLog, InventoryLog, Product},
    routes::params::Pagination,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LowStockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub threshold: Option<i32>,
}

impl LowStockQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryAdjustment {
    pub product: Product,
    pub log: InventoryLog,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogList {
    pub items: Vec<AuditLog>,
}
