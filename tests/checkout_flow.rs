mod common;

use axum::http::StatusCode;
use clickngo::{
    checkout_session::CheckoutStage,
    dto::{
        admin::LowStockQuery,
        cart::{AddToCartRequest, ApplyPromotionRequest},
        orders::UpdateOrderStatusRequest,
    },
    entity::{AuditLogs, Products, Promotions, audit_logs},
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    services::{admin_service, cart_service, checkout_service, session_store},
};
use common::{create_product, create_promotion, create_user, dec, setup_state, shipping};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

// Flow: add to cart -> promotion -> shipping -> review -> confirm, then the
// single-use code, stock guard and admin views are checked against the result.
#[tokio::test]
async fn checkout_with_promotion_is_atomic() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url, 5).await?;

    let buyer = create_user(&state, ROLE_USER, "buyer").await?;
    let other = create_user(&state, ROLE_USER, "other").await?;
    let admin = create_user(&state, ROLE_ADMIN, "admin").await?;

    let cpu = create_product(&state, "Intel Core i9-13900K", "589.99", 10).await?;
    create_promotion(&state, "WELCOME15", "0.15", Some(1)).await?;

    // Quantities merge across adds.
    for _ in 0..2 {
        cart_service::add_to_cart(
            &state,
            &buyer,
            AddToCartRequest {
                product_id: cpu.id,
                quantity: None,
            },
        )
        .await?;
    }

    let view = cart_service::apply_promotion(
        &state,
        &buyer,
        ApplyPromotionRequest {
            code: " welcome15".into(),
        },
    )
    .await?
    .data
    .expect("cart view");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.subtotal, dec("1179.98"));
    assert_eq!(view.discount_amount, dec("176.997"));
    assert_eq!(view.total, dec("1002.983"));

    // Confirming before review is rejected.
    let err = checkout_service::confirm(&state, &buyer).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);

    checkout_service::set_shipping(&state, &buyer, shipping()).await?;
    let reviewed = checkout_service::review(&state, &buyer)
        .await?
        .data
        .expect("review");
    assert_eq!(reviewed.stage, CheckoutStage::Reviewed);

    let confirmed = checkout_service::confirm(&state, &buyer)
        .await?
        .data
        .expect("order");
    let order = &confirmed.order;
    assert_eq!(order.subtotal, dec("1179.98"));
    assert_eq!(order.discount_amount, dec("176.997"));
    assert_eq!(order.total, dec("1002.983"));
    assert!(order.promotion_id.is_some());
    assert!(order.tracking_number.starts_with("TRK"));
    assert_eq!(order.shipping_status, "Pending");
    assert_eq!(order.shipping_city, "Lyon");
    assert_eq!(confirmed.items.len(), 1);
    assert_eq!(confirmed.items[0].unit_price, dec("589.99"));
    assert_eq!(
        confirmed.items[0].product_name.as_deref(),
        Some("Intel Core i9-13900K")
    );

    let stock = Products::find_by_id(cpu.id)
        .one(&state.orm)
        .await?
        .expect("product")
        .stock;
    assert_eq!(stock, 8);

    let promotion = Promotions::find()
        .one(&state.orm)
        .await?
        .expect("promotion");
    assert_eq!(promotion.used_count, 1);

    // The session was cleared in the same transaction.
    let session = session_store::load(&state.orm, buyer.user_id).await?;
    assert!(session.is_empty());
    assert_eq!(session.stage(), CheckoutStage::CartOpen);
    assert!(session.promotion_code().is_none());
    assert!(checkout_service::confirm(&state, &buyer).await.is_err());

    let audited = AuditLogs::find()
        .filter(audit_logs::Column::Action.eq("checkout_confirm"))
        .filter(audit_logs::Column::UserId.eq(buyer.user_id))
        .all(&state.orm)
        .await?;
    assert_eq!(audited.len(), 1);

    // The single-use code is exhausted.
    cart_service::add_to_cart(
        &state,
        &other,
        AddToCartRequest {
            product_id: cpu.id,
            quantity: Some(100),
        },
    )
    .await?;
    let err = cart_service::apply_promotion(
        &state,
        &other,
        ApplyPromotionRequest {
            code: "WELCOME15".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Not enough stock: nothing is written and the session stays reviewed.
    checkout_service::set_shipping(&state, &other, shipping()).await?;
    checkout_service::review(&state, &other).await?;
    let err = checkout_service::confirm(&state, &other).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);

    let session = session_store::load(&state.orm, other.user_id).await?;
    assert_eq!(session.stage(), CheckoutStage::Reviewed);
    assert_eq!(session.lines().len(), 1);
    let stock = Products::find_by_id(cpu.id)
        .one(&state.orm)
        .await?
        .expect("product")
        .stock;
    assert_eq!(stock, 8);

    // Admin back office sees the order and the low stock.
    let updated = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?;
    assert_eq!(updated.data.expect("order").shipping_status, "Shipped");

    let err = admin_service::update_order_status(
        &state,
        &buyer,
        order.id,
        UpdateOrderStatusRequest {
            status: "Delivered".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            page: Some(1),
            per_page: Some(20),
            threshold: Some(10),
        },
    )
    .await?;
    assert!(
        low.data.expect("low stock").items.iter().any(|p| p.id == cpu.id),
        "expected product to appear in low-stock list"
    );

    Ok(())
}
