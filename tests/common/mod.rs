#![allow(dead_code)]

use clickngo::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::checkout::ShippingRequest,
    entity::{
        products::{ActiveModel as ProductActive, Model as ProductModel},
        promotions::{ActiveModel as PromotionActive, Model as PromotionModel},
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

/// Database URL for flow tests, or `None` when the environment has none.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            None
        }
    }
}

pub fn shipping() -> ShippingRequest {
    ShippingRequest {
        address: "3 Place Bellecour".into(),
        city: " Lyon ".into(),
        zip: "69002".into(),
        country: "France".into(),
    }
}

pub async fn setup_state(database_url: &str, max_connections: u32) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url, max_connections).await?;
    let state = AppState::new(pool, AppConfig::for_database(database_url));
    run_migrations(&state.orm).await?;

    // Clean tables between runs
    let backend = state.orm.get_database_backend();
    state
        .orm
        .execute(Statement::from_string(
            backend,
            "TRUNCATE TABLE listings, order_items, orders, checkout_sessions, audit_logs, promotions, products, users RESTART IDENTITY CASCADE",
        ))
        .await?;

    Ok(state)
}

pub async fn create_user(state: &AppState, role: &str, username: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: &str,
    stock: i32,
) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: NotSet,
        name: Set(name.to_string()),
        description: Set(Some("Test product".into())),
        price: Set(dec(price)),
        image_url: Set(None),
        tags: Set("test".into()),
        stock: Set(stock),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn create_promotion(
    state: &AppState,
    code: &str,
    value: &str,
    usage_limit: Option<i32>,
) -> anyhow::Result<PromotionModel> {
    let promotion = PromotionActive {
        id: NotSet,
        code: Set(Some(code.to_string())),
        value_type: Set("percentage".into()),
        value: Set(dec(value)),
        expires_at: Set(None),
        usage_limit: Set(usage_limit),
        used_count: Set(0),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(promotion)
}
