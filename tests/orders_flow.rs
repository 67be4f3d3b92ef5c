use std::{sync::Arc, time::Duration};

use feng_shui_shop::{
    audit::{AuditEntry, AuditSink},
    catalog_cache::{DbCatalogSource, ProductCache},
    db::{create_orm_conn, run_migrations},
    dto::{
        addresses::{CreateAddressRequest, UpdateAddressRequest},
        admin::InventoryAdjustRequest,
        cart::AddToCartRequest,
        orders::{CancelOrderRequest, CreateOrderRequest, UpdateOrderStatusRequest},
    },
    entity::{
        addresses::ActiveModel as AddressActive,
        cart_items::{Column as CartItemCol, Entity as CartItems},
        inventory_logs::{Column as InvLogCol, Entity as InventoryLogs},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        order_status::OrderStatus,
        order_status_history::{Column as HistoryCol, Entity as OrderStatusHistory},
        orders::{Column as OrderCol, Entity as Orders},
        product_images::ActiveModel as ImageActive,
        products::{ActiveModel as ProductActive, Entity as Products},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::{AuthUser, ROLE_MANAGER, ROLE_USER},
    services::{address_service, admin_service, cart_service, order_service, product_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

// Each test creates its own users and products, so the tests can share one
// database and run in parallel.
async fn setup() -> anyhow::Result<Option<(AppState, Receiver<AuditEntry>)>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run order flow tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let (audit, audit_rx) = AuditSink::channel(64);
    let catalog = ProductCache::new(
        Arc::new(DbCatalogSource::new(orm.clone())),
        Duration::from_secs(60),
        10,
    );
    Ok(Some((AppState { orm, audit, catalog }, audit_rx)))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        full_name: Set(Some("Test User".into())),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: role.into(),
    })
}

async fn create_product(state: &AppState, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Bàn thờ {}", Uuid::new_v4())),
        description: Set(None),
        price: Set(price),
        stock: Set(stock),
        is_active: Set(true),
        brand: Set(Some("Mộc An".into())),
        color: Set(Some("Đỏ".into())),
        width: Set(Some(120.0)),
        height: Set(Some(80.0)),
        depth: Set(Some(60.0)),
        material: Set(Some("Gỗ gụ".into())),
        space: Set(None),
        menh: Set(Some("Hỏa".into())),
        huong: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    ImageActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        image_url: Set("https://cdn.example.com/ban-tho.jpg".into()),
        is_primary: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<()> {
    cart_service::add_item(state, user, AddToCartRequest { product_id, quantity }).await?;
    Ok(())
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

async fn set_active(state: &AppState, product_id: Uuid, is_active: bool) -> anyhow::Result<()> {
    let mut product: ProductActive = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?
        .into();
    product.is_active = Set(is_active);
    product.update(&state.orm).await?;
    Ok(())
}

/// Orders, order lines and status history rows left behind for a user.
async fn order_rows_of(state: &AppState, user: &AuthUser) -> anyhow::Result<(u64, u64, u64)> {
    let order_ids: Vec<Uuid> = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|o| o.id)
        .collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids.clone()))
        .count(&state.orm)
        .await?;
    let history = OrderStatusHistory::find()
        .filter(HistoryCol::OrderId.is_in(order_ids.clone()))
        .count(&state.orm)
        .await?;
    Ok((order_ids.len() as u64, items, history))
}

fn inline_address() -> CreateOrderRequest {
    CreateOrderRequest {
        receiver_name: Some("Nguyễn Văn A".into()),
        phone: Some("0912345678".into()),
        address: Some("123 Đường ABC".into()),
        city: Some("Hà Nội".into()),
        ..Default::default()
    }
}

fn drain(rx: &mut Receiver<AuditEntry>) -> Vec<AuditEntry> {
    let mut entries = Vec::new();
    while let Ok(entry) = rx.try_recv() {
        entries.push(entry);
    }
    entries
}

async fn place_order(state: &AppState, user: &AuthUser) -> anyhow::Result<Uuid> {
    let product_id = create_product(state, 50_000, 10).await?;
    add_to_cart(state, user, product_id, 1).await?;
    let resp = order_service::create_order(state, user, inline_address()).await?;
    let detail = resp.data.ok_or_else(|| anyhow::anyhow!("missing order"))?;
    Ok(detail.order.id)
}

#[tokio::test]
async fn checkout_snapshots_lines_and_moves_stock() -> anyhow::Result<()> {
    let Some((state, mut audit_rx)) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product_id = create_product(&state, 100_000, 5).await?;
    add_to_cart(&state, &user, product_id, 2).await?;
    drain(&mut audit_rx);

    let resp = order_service::create_order(&state, &user, inline_address()).await?;
    let detail = resp.data.expect("order detail");

    assert_eq!(detail.order.total_amount, 200_000);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_method, "COD");
    assert_eq!(
        detail.order.shipping_address.as_deref(),
        Some("123 Đường ABC, Hà Nội")
    );

    assert_eq!(detail.items.len(), 1);
    let line = &detail.items[0];
    assert_eq!(line.quantity, 2);
    assert_eq!(line.price, 100_000);
    assert_eq!(line.product_size.as_deref(), Some("W120xH80xD60cm"));
    assert_eq!(
        line.product_image_url.as_deref(),
        Some("https://cdn.example.com/ban-tho.jpg")
    );

    assert_eq!(detail.status_history.len(), 1);
    assert_eq!(detail.status_history[0].old_status, None);
    assert_eq!(detail.status_history[0].new_status, OrderStatus::Pending);

    assert_eq!(stock_of(&state, product_id).await?, 3);
    let logs = InventoryLogs::find()
        .filter(InvLogCol::ProductId.eq(product_id))
        .all(&state.orm)
        .await?;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].change_quantity, -2);
    assert_eq!(logs[0].reason, format!("ORDER: {}", detail.order.id));

    let cart = cart_service::load_cart(&state.orm, user.user_id)
        .await?
        .expect("cart exists");
    assert!(cart.is_empty());

    let entries = drain(&mut audit_rx);
    assert!(entries.iter().any(|e| e.action == "CREATE_ORDER"
        && e.target == format!("Order ID: {}, Total: 200000", detail.order.id)));
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_rolls_back_everything() -> anyhow::Result<()> {
    let Some((state, _audit_rx)) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let plenty = create_product(&state, 10_000, 5).await?;
    let scarce = create_product(&state, 20_000, 1).await?;
    add_to_cart(&state, &user, plenty, 2).await?;
    add_to_cart(&state, &user, scarce, 1).await?;

    // Someone else buys the last unit after the line went into the cart.
    let mut product: ProductActive = Products::find_by_id(scarce)
        .one(&state.orm)
        .await?
        .expect("product")
        .into();
    product.stock = Set(0);
    product.update(&state.orm).await?;

    let err = order_service::create_order(&state, &user, inline_address())
        .await
        .expect_err("checkout must fail");
    match err {
        AppError::BadRequest(msg) => assert!(msg.starts_with("Insufficient stock for product")),
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(stock_of(&state, plenty).await?, 5);
    let cart = cart_service::load_cart(&state.orm, user.user_id)
        .await?
        .expect("cart exists");
    assert_eq!(cart.lines.len(), 2);
    let logs = InventoryLogs::find()
        .filter(InvLogCol::ProductId.eq(plenty))
        .count(&state.orm)
        .await?;
    assert_eq!(logs, 0);
    assert_eq!(order_rows_of(&state, &user).await?, (0, 0, 0));
    let lines_for_plenty = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(plenty))
        .count(&state.orm)
        .await?;
    assert_eq!(lines_for_plenty, 0);
    Ok(())
}

#[tokio::test]
async fn inactive_product_rolls_back_everything() -> anyhow::Result<()> {
    let Some((state, mut audit_rx)) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let kept = create_product(&state, 15_000, 4).await?;
    let retired = create_product(&state, 25_000, 4).await?;
    add_to_cart(&state, &user, kept, 1).await?;
    add_to_cart(&state, &user, retired, 2).await?;
    set_active(&state, retired, false).await?;
    drain(&mut audit_rx);

    let err = order_service::create_order(&state, &user, inline_address())
        .await
        .expect_err("retired product");
    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, format!("Product {retired} is not available")),
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(stock_of(&state, kept).await?, 4);
    assert_eq!(stock_of(&state, retired).await?, 4);
    assert_eq!(order_rows_of(&state, &user).await?, (0, 0, 0));
    let logs = InventoryLogs::find()
        .filter(InvLogCol::ProductId.is_in([kept, retired]))
        .count(&state.orm)
        .await?;
    assert_eq!(logs, 0);
    let cart = cart_service::load_cart(&state.orm, user.user_id)
        .await?
        .expect("cart exists");
    assert_eq!(cart.lines.len(), 2);
    assert!(drain(&mut audit_rx).is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_checkouts_never_oversell() -> anyhow::Result<()> {
    let Some((state, _audit_rx)) = setup().await? else {
        return Ok(());
    };
    let first = create_user(&state, ROLE_USER).await?;
    let second = create_user(&state, ROLE_USER).await?;
    let last_unit = create_product(&state, 90_000, 1).await?;
    add_to_cart(&state, &first, last_unit, 1).await?;
    add_to_cart(&state, &second, last_unit, 1).await?;

    let (a, b) = tokio::join!(
        order_service::create_order(&state, &first, inline_address()),
        order_service::create_order(&state, &second, inline_address()),
    );
    let placed = [a.is_ok(), b.is_ok()].into_iter().filter(|ok| *ok).count();
    assert_eq!(placed, 1);
    match a.err().or(b.err()) {
        Some(AppError::BadRequest(msg)) => assert!(msg.starts_with("Insufficient stock for product")),
        other => panic!("unexpected outcome {other:?}"),
    }

    assert_eq!(stock_of(&state, last_unit).await?, 0);
    let logs = InventoryLogs::find()
        .filter(InvLogCol::ProductId.eq(last_unit))
        .count(&state.orm)
        .await?;
    assert_eq!(logs, 1);
    Ok(())
}

#[tokio::test]
async fn lines_added_during_checkout_stay_in_cart() -> anyhow::Result<()> {
    let Some((state, _audit_rx)) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let ordered = create_product(&state, 30_000, 5).await?;
    let late = create_product(&state, 40_000, 5).await?;
    add_to_cart(&state, &user, ordered, 1).await?;

    // Holding the product row stalls checkout after it has read the cart.
    let holder = state.orm.begin().await?;
    product_service::find_for_update(&holder, ordered).await?;

    let checkout = tokio::spawn({
        let (state, user) = (state.clone(), user.clone());
        async move { order_service::create_order(&state, &user, inline_address()).await }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;

    let adding = tokio::spawn({
        let (state, user) = (state.clone(), user.clone());
        async move {
            cart_service::add_item(
                &state,
                &user,
                AddToCartRequest {
                    product_id: late,
                    quantity: 2,
                },
            )
            .await
        }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    holder.commit().await?;

    let detail = checkout.await??.data.expect("order detail");
    adding.await??;

    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].product_id, Some(ordered));
    assert_eq!(detail.order.total_amount, 30_000);

    let cart = cart_service::load_cart(&state.orm, user.user_id)
        .await?
        .expect("cart exists");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].0.product_id, late);
    assert_eq!(cart.lines[0].0.quantity, 2);
    assert_eq!(stock_of(&state, late).await?, 5);
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_merge_into_one_line() -> anyhow::Result<()> {
    let Some((state, _audit_rx)) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let product_id = create_product(&state, 12_000, 10).await?;

    let (a, b) = tokio::join!(
        cart_service::add_item(&state, &user, AddToCartRequest { product_id, quantity: 1 }),
        cart_service::add_item(&state, &user, AddToCartRequest { product_id, quantity: 2 }),
    );
    a?;
    b?;

    let lines = CartItems::find()
        .filter(CartItemCol::ProductId.eq(product_id))
        .all(&state.orm)
        .await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);
    Ok(())
}

#[tokio::test]
async fn empty_cart_and_foreign_address_are_rejected() -> anyhow::Result<()> {
    let Some((state, _audit_rx)) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let other = create_user(&state, ROLE_USER).await?;

    let err = order_service::create_order(&state, &user, CreateOrderRequest::default())
        .await
        .expect_err("empty cart");
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Cart is empty"));

    let foreign = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(other.user_id),
        receiver_name: Set("Trần B".into()),
        phone: Set("0987".into()),
        address: Set("45 Lê Lợi".into()),
        city: Set("Đà Nẵng".into()),
        is_default: Set(true),
    }
    .insert(&state.orm)
    .await?;

    let product_id = create_product(&state, 10_000, 3).await?;
    add_to_cart(&state, &user, product_id, 1).await?;
    let err = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            address_id: Some(foreign.id),
            ..Default::default()
        },
    )
    .await
    .expect_err("foreign address");
    assert!(matches!(err, AppError::NotFound(_)));

    let remaining = CartItems::find()
        .filter(CartItemCol::ProductId.eq(product_id))
        .count(&state.orm)
        .await?;
    assert_eq!(remaining, 1);
    assert_eq!(stock_of(&state, product_id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn staff_override_and_terminal_states() -> anyhow::Result<()> {
    let Some((state, mut audit_rx)) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let manager = create_user(&state, ROLE_MANAGER).await?;
    let order_id = place_order(&state, &user).await?;

    let err = order_service::update_status(
        &state,
        &user,
        order_id,
        UpdateOrderStatusRequest {
            status: "SHIPPED".into(),
        },
    )
    .await
    .expect_err("customers cannot override");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = order_service::update_status(
        &state,
        &manager,
        order_id,
        UpdateOrderStatusRequest {
            status: "LOST".into(),
        },
    )
    .await
    .expect_err("unknown status");
    assert!(matches!(err, AppError::BadRequest(_)));

    drain(&mut audit_rx);
    let resp = order_service::update_status(
        &state,
        &manager,
        order_id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?;
    let detail = resp.data.expect("detail");
    assert_eq!(detail.order.status, OrderStatus::Shipped);
    assert_eq!(detail.status_history.len(), 2);
    assert_eq!(detail.status_history[1].old_status, Some(OrderStatus::Pending));
    assert_eq!(detail.status_history[1].new_status, OrderStatus::Shipped);

    let entries = drain(&mut audit_rx);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "UPDATE_ORDER_STATUS");
    assert_eq!(entries[0].user_id, Some(manager.user_id));
    assert_eq!(
        entries[0].target,
        format!("Order ID: {order_id}, PENDING -> SHIPPED")
    );

    let err = order_service::cancel_order(&state, &user, order_id, CancelOrderRequest::default())
        .await
        .expect_err("shipped orders cannot be cancelled");
    match err {
        AppError::BadRequest(msg) => assert!(msg.contains("\"SHIPPED\"")),
        other => panic!("unexpected error {other:?}"),
    }

    order_service::update_status(
        &state,
        &manager,
        order_id,
        UpdateOrderStatusRequest {
            status: "DELIVERED".into(),
        },
    )
    .await?;
    let err = order_service::update_status(
        &state,
        &manager,
        order_id,
        UpdateOrderStatusRequest {
            status: "PROCESSING".into(),
        },
    )
    .await
    .expect_err("delivered is terminal");
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn owner_cancellation() -> anyhow::Result<()> {
    let Some((state, mut audit_rx)) = setup().await? else {
        return Ok(());
    };
    let owner = create_user(&state, ROLE_USER).await?;
    let stranger = create_user(&state, ROLE_USER).await?;
    let order_id = place_order(&state, &owner).await?;

    let err = order_service::cancel_order(&state, &stranger, order_id, CancelOrderRequest::default())
        .await
        .expect_err("not the owner");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = order_service::get_order(&state, &stranger, order_id)
        .await
        .expect_err("not the owner");
    assert!(matches!(err, AppError::Forbidden(_)));

    drain(&mut audit_rx);
    let resp = order_service::cancel_order(
        &state,
        &owner,
        order_id,
        CancelOrderRequest {
            reason: Some("Đổi ý".into()),
        },
    )
    .await?;
    let detail = resp.data.expect("detail");
    assert_eq!(detail.order.status, OrderStatus::Cancelled);
    assert!(detail.next_statuses.is_empty());

    let entries = drain(&mut audit_rx);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "CANCEL_ORDER");
    assert!(entries[0].target.ends_with("| Reason: Đổi ý"));

    let err = order_service::cancel_order(&state, &owner, order_id, CancelOrderRequest::default())
        .await
        .expect_err("already cancelled");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = order_service::cancel_order(&state, &owner, Uuid::new_v4(), CancelOrderRequest::default())
        .await
        .expect_err("missing order");
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn manual_inventory_adjustment() -> anyhow::Result<()> {
    let Some((state, _audit_rx)) = setup().await? else {
        return Ok(());
    };
    let manager = create_user(&state, ROLE_MANAGER).await?;
    let product_id = create_product(&state, 10_000, 2).await?;

    let err = admin_service::adjust_inventory(
        &state,
        &manager,
        product_id,
        InventoryAdjustRequest {
            delta: -3,
            reason: None,
        },
    )
    .await
    .expect_err("stock would go negative");
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock_of(&state, product_id).await?, 2);

    let resp = admin_service::adjust_inventory(
        &state,
        &manager,
        product_id,
        InventoryAdjustRequest {
            delta: 8,
            reason: Some("Nhập kho".into()),
        },
    )
    .await?;
    let adjustment = resp.data.expect("adjustment");
    assert_eq!(adjustment.product.stock, 10);
    assert_eq!(adjustment.log.change_quantity, 8);
    assert_eq!(adjustment.log.reason, "MANUAL: Nhập kho");
    Ok(())
}

#[tokio::test]
async fn stock_history_blocks_product_deletion() -> anyhow::Result<()> {
    let Some((state, _audit_rx)) = setup().await? else {
        return Ok(());
    };
    let manager = create_user(&state, ROLE_MANAGER).await?;
    let product_id = create_product(&state, 10_000, 2).await?;
    admin_service::adjust_inventory(
        &state,
        &manager,
        product_id,
        InventoryAdjustRequest {
            delta: 1,
            reason: None,
        },
    )
    .await?;

    assert!(Products::delete_by_id(product_id).exec(&state.orm).await.is_err());
    let logs = InventoryLogs::find()
        .filter(InvLogCol::ProductId.eq(product_id))
        .count(&state.orm)
        .await?;
    assert_eq!(logs, 1);
    assert_eq!(stock_of(&state, product_id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn address_update_moves_the_default() -> anyhow::Result<()> {
    let Some((state, _audit_rx)) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state, ROLE_USER).await?;
    let stranger = create_user(&state, ROLE_USER).await?;

    let err = address_service::get_default_address(&state, &user)
        .await
        .expect_err("no addresses yet");
    assert!(matches!(err, AppError::NotFound(_)));

    let home = address_service::create_address(
        &state,
        &user,
        CreateAddressRequest {
            receiver_name: "Nguyễn Văn A".into(),
            phone: "0912345678".into(),
            address: "12 Hàng Bạc".into(),
            city: "Hà Nội".into(),
            is_default: Some(true),
        },
    )
    .await?
    .data
    .expect("address");
    let office = address_service::create_address(
        &state,
        &user,
        CreateAddressRequest {
            receiver_name: "Nguyễn Văn A".into(),
            phone: "0912345678".into(),
            address: "5 Lý Thái Tổ".into(),
            city: "Hà Nội".into(),
            is_default: None,
        },
    )
    .await?
    .data
    .expect("address");

    let current = address_service::get_default_address(&state, &user).await?.data.expect("default");
    assert_eq!(current.id, home.id);

    let updated = address_service::update_address(
        &state,
        &user,
        office.id,
        UpdateAddressRequest {
            city: Some("Đà Nẵng".into()),
            is_default: Some(true),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("address");
    assert!(updated.is_default);
    assert_eq!(updated.city, "Đà Nẵng");
    assert_eq!(updated.address, "5 Lý Thái Tổ");

    let current = address_service::get_default_address(&state, &user).await?.data.expect("default");
    assert_eq!(current.id, office.id);
    let home = address_service::get_address(&state, &user, home.id).await?.data.expect("address");
    assert!(!home.is_default);

    let err = address_service::update_address(
        &state,
        &user,
        office.id,
        UpdateAddressRequest {
            phone: Some("  ".into()),
            ..Default::default()
        },
    )
    .await
    .expect_err("blank phone");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = address_service::update_address(
        &state,
        &stranger,
        office.id,
        UpdateAddressRequest {
            is_default: Some(true),
            ..Default::default()
        },
    )
    .await
    .expect_err("someone else's address");
    assert!(matches!(err, AppError::NotFound(_)));
    let office = address_service::get_address(&state, &user, office.id).await?.data.expect("address");
    assert!(office.is_default);
    Ok(())
}
