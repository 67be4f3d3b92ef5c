use std::{sync::Arc, time::Duration};

use axum::extract::State;
use feng_shui_shop::{
    audit::AuditSink,
    catalog_cache::{DbCatalogSource, ProductCache},
    routes::health::health_check,
    state::AppState,
};
use sea_orm::DatabaseConnection;

#[tokio::test]
async fn health_check_reports_unreachable_database() {
    let orm = DatabaseConnection::Disconnected;
    let (audit, _rx) = AuditSink::channel(1);
    let catalog = ProductCache::new(
        Arc::new(DbCatalogSource::new(orm.clone())),
        Duration::from_secs(60),
        10,
    );

    let response = health_check(State(AppState { orm, audit, catalog })).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.database, "unavailable");
}
