use sea_orm::DatabaseConnection;

use crate::{audit::AuditSink, catalog_cache::ProductCache};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub audit: AuditSink,
    pub catalog: ProductCache,
}
