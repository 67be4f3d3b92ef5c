use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::order_status::OrderStatus,
    error::{AppError, AppResult},
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortBy {
    CreatedAt,
    TotalAmount,
    Status,
}

// Query strings are decoded by serde_urlencoded, which cannot parse numbers
// through `#[serde(flatten)]`, so paging fields are repeated here.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Any case, e.g. `shipped` or `SHIPPED`.
    pub status: Option<String>,
    /// Honoured only on the staff listing.
    pub user_id: Option<Uuid>,
    pub sort_by: Option<OrderSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn status_filter(&self) -> AppResult<Option<OrderStatus>> {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<OrderStatus>)
            .transpose()
            .map_err(AppError::BadRequest)
    }
}
