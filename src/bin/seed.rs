use clickngo::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    image_url: &'static str,
    tags: &'static str,
    stock: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&orm_from_pool(&pool)).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@clickngo.local", "admin123", ROLE_ADMIN).await?;
    let user_id = ensure_user(&pool, "user", "user@clickngo.local", "user123", ROLE_USER).await?;
    seed_products(&pool).await?;
    seed_promotions(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} <{email}> (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = [
        SeedProduct {
            name: "Intel Core i9-13900K",
            description: "24-core desktop processor, up to 5.8 GHz",
            price: Decimal::new(58999, 2),
            image_url: "/images/i9-13900k.jpg",
            tags: "cpu,intel,hardware",
            stock: 15,
        },
        SeedProduct {
            name: "NVIDIA GeForce RTX 4090",
            description: "24GB GDDR6X graphics card",
            price: Decimal::new(159999, 2),
            image_url: "/images/rtx-4090.jpg",
            tags: "gpu,nvidia,hardware",
            stock: 5,
        },
        SeedProduct {
            name: "Corsair Vengeance 32GB DDR5",
            description: "2x16GB DDR5-6000 memory kit",
            price: Decimal::new(15000, 2),
            image_url: "/images/corsair-ddr5.jpg",
            tags: "ram,corsair,hardware",
            stock: 40,
        },
        SeedProduct {
            name: "Samsung 980 Pro 1TB",
            description: "PCIe 4.0 NVMe SSD",
            price: Decimal::new(17999, 2),
            image_url: "/images/980-pro.jpg",
            tags: "storage,ssd,samsung",
            stock: 30,
        },
        SeedProduct {
            name: "Windows 11 Pro Key",
            description: "Retail license key",
            price: Decimal::new(19999, 2),
            image_url: "/images/win11-pro.jpg",
            tags: "software,license,microsoft",
            stock: 100,
        },
    ];

    for product in products {
        sqlx::query(
            r#"
            INSERT INTO products (name, description, price, image_url, tags, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(product.name)
        .bind(product.description)
        .bind(product.price)
        .bind(product.image_url)
        .bind(product.tags)
        .bind(product.stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_promotions(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let promotions = [
        ("WELCOME15", "percentage", Decimal::new(15, 2), None),
        ("SAVE50", "fixed", Decimal::new(50, 0), Some(100)),
    ];

    for (code, value_type, value, usage_limit) in promotions {
        sqlx::query(
            r#"
            INSERT INTO promotions (code, value_type, value, usage_limit)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(value_type)
        .bind(value)
        .bind(usage_limit)
        .execute(pool)
        .await?;
    }

    println!("Seeded promotions");
    Ok(())
}
