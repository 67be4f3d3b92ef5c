use feng_shui_shop::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
        product_images::ActiveModel as ImageActive,
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    middleware::auth::{ROLE_ADMIN, ROLE_MANAGER, ROLE_USER, issue_token},
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    stock: i32,
    brand: &'static str,
    color: &'static str,
    size: (f64, f64, f64),
    material: &'static str,
    space: &'static str,
    menh: &'static str,
    huong: &'static str,
    image: &'static str,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Sofa gỗ óc chó Mộc An",
        description: "Sofa ba chỗ khung gỗ óc chó, nệm bọc vải lanh",
        price: 18_500_000,
        stock: 8,
        brand: "Mộc An",
        color: "Nâu trầm",
        size: (210.0, 85.0, 90.0),
        material: "Gỗ óc chó, vải lanh",
        space: "Phòng khách",
        menh: "Mộc, Hỏa",
        huong: "Đông, Đông Nam, Nam",
        image: "https://cdn.example.com/products/sofa-moc-an.jpg",
    },
    SeedProduct {
        name: "Bàn trà đá cẩm thạch Bạch Kim",
        description: "Mặt đá cẩm thạch trắng, chân thép mạ vàng",
        price: 7_200_000,
        stock: 12,
        brand: "Bạch Kim",
        color: "Trắng",
        size: (120.0, 45.0, 60.0),
        material: "Đá cẩm thạch, thép",
        space: "Phòng khách",
        menh: "Kim, Thủy",
        huong: "Tây, Tây Bắc, Bắc",
        image: "https://cdn.example.com/products/ban-tra-bach-kim.jpg",
    },
    SeedProduct {
        name: "Giường ngủ Thổ Mộc",
        description: "Giường gỗ sồi đầu giường bọc da, màu đất nung",
        price: 24_900_000,
        stock: 4,
        brand: "Thổ Mộc",
        color: "Vàng đất",
        size: (180.0, 110.0, 210.0),
        material: "Gỗ sồi, da bò",
        space: "Phòng ngủ",
        menh: "Thổ, Kim",
        huong: "Đông Bắc, Tây Nam",
        image: "https://cdn.example.com/products/giuong-tho-moc.jpg",
    },
    SeedProduct {
        name: "Kệ sách Thủy Lam",
        description: "Kệ năm tầng sơn xanh lam, phù hợp phòng làm việc",
        price: 4_350_000,
        stock: 3,
        brand: "Thủy Lam",
        color: "Xanh lam",
        size: (90.0, 200.0, 35.0),
        material: "Gỗ MDF phủ sơn",
        space: "Phòng làm việc",
        menh: "Thủy, Mộc",
        huong: "Bắc, Đông",
        image: "https://cdn.example.com/products/ke-sach-thuy-lam.jpg",
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,feng_shui_shop=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "Quản trị viên", ROLE_ADMIN).await?;
    let manager_id = ensure_user(&orm, "manager@example.com", "Quản lý kho", ROLE_MANAGER).await?;
    let user_id = ensure_user(&orm, "user@example.com", "Nguyễn Văn A", ROLE_USER).await?;
    ensure_address(&orm, user_id).await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin: {admin_id}, Manager: {manager_id}, User: {user_id}");

    // Login lives outside this service; print dev tokens when a secret is configured.
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        let ttl = chrono::Duration::days(7);
        for (label, id, role) in [
            ("admin", admin_id, ROLE_ADMIN),
            ("manager", manager_id, ROLE_MANAGER),
            ("user", user_id, ROLE_USER),
        ] {
            let token = issue_token(&secret, id, role, ttl)?;
            println!("{label} token: {token}");
        }
    }
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    full_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    Users::insert(UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set(Some(full_name.to_string())),
        role: Set(role.to_string()),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(UserCol::Email)
            .update_column(UserCol::Role)
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {email} missing after upsert"))?;

    tracing::info!(email, role, "ensured user");
    Ok(user.id)
}

async fn ensure_address(orm: &DatabaseConnection, user_id: Uuid) -> anyhow::Result<()> {
    let existing = Addresses::find()
        .filter(AddressCol::UserId.eq(user_id))
        .count(orm)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        receiver_name: Set("Nguyễn Văn A".into()),
        phone: Set("0912345678".into()),
        address: Set("123 Đường Láng, Đống Đa".into()),
        city: Set("Hà Nội".into()),
        is_default: Set(true),
    }
    .insert(orm)
    .await?;

    tracing::info!(%user_id, "seeded default address");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for seed in PRODUCTS {
        let exists = Products::find()
            .filter(ProdCol::Name.eq(seed.name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let (width, height, depth) = seed.size;
        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(seed.name.to_string()),
            description: Set(Some(seed.description.to_string())),
            price: Set(seed.price),
            stock: Set(seed.stock),
            is_active: Set(true),
            brand: Set(Some(seed.brand.to_string())),
            color: Set(Some(seed.color.to_string())),
            width: Set(Some(width)),
            height: Set(Some(height)),
            depth: Set(Some(depth)),
            material: Set(Some(seed.material.to_string())),
            space: Set(Some(seed.space.to_string())),
            menh: Set(Some(seed.menh.to_string())),
            huong: Set(Some(seed.huong.to_string())),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;

        ImageActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            image_url: Set(seed.image.to_string()),
            is_primary: Set(true),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    tracing::info!(count = PRODUCTS.len(), "seeded products");
    Ok(())
}
