mod common;

use axum::http::StatusCode;
use clickngo::{
    checkout_session::CheckoutStage,
    dto::{
        cart::{AddToCartRequest, ApplyPromotionRequest, UpdateCartItemRequest},
        promotions::UpdatePromotionRequest,
    },
    entity::{Orders, Promotions},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    pricing::CartLine,
    services::{cart_service, checkout_service, promotion_service, session_store},
    state::AppState,
};
use common::{create_product, create_promotion, create_user, setup_state, shipping};
use sea_orm::{EntityTrait, PaginatorTrait};

// Concurrent writers on the same session, racing confirms on a shared
// single-use code, and a promotion withdrawn between review and confirm.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_session_writes_are_serialized() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url, 10).await?;
    let admin = create_user(&state, ROLE_ADMIN, "admin").await?;
    let buyer = create_user(&state, ROLE_USER, "buyer").await?;
    let cpu = create_product(&state, "Intel Core i9-13900K", "589.99", 100).await?;
    let ssd = create_product(&state, "Samsung 990 Pro 2TB", "179.99", 100).await?;

    // Twenty concurrent single adds all land.
    let mut handles = Vec::new();
    for _ in 0..20 {
        let state = state.clone();
        let buyer = buyer.clone();
        handles.push(tokio::spawn(async move {
            cart_service::add_to_cart(&state, &buyer, add(cpu.id, 1)).await
        }));
    }
    for handle in handles {
        handle.await??;
    }
    let session = session_store::load(&state.orm, buyer.user_id).await?;
    assert_eq!(
        session.lines(),
        &[CartLine {
            product_id: cpu.id,
            quantity: 20
        }]
    );

    // An edit racing confirm never brings the ordered cart back.
    cart_service::update_cart_item(
        &state,
        &buyer,
        cpu.id,
        UpdateCartItemRequest { quantity: 2 },
    )
    .await?;
    reviewed(&state, &buyer).await?;
    let (confirmed, edited) = tokio::join!(
        checkout_service::confirm(&state, &buyer),
        cart_service::add_to_cart(&state, &buyer, add(ssd.id, 1)),
    );
    edited?;
    let session = session_store::load(&state.orm, buyer.user_id).await?;
    let orders = Orders::find().count(&state.orm).await?;
    match confirmed {
        Ok(_) => {
            assert_eq!(orders, 1);
            assert_eq!(
                session.lines(),
                &[CartLine {
                    product_id: ssd.id,
                    quantity: 1
                }]
            );
            assert_eq!(session.stage(), CheckoutStage::CartOpen);
        }
        Err(err) => {
            // The edit reopened the cart first, so confirm saw an unreviewed session.
            assert_eq!(err.status(), StatusCode::CONFLICT);
            assert_eq!(orders, 0);
            assert_eq!(session.lines().len(), 2);
            assert_ne!(session.stage(), CheckoutStage::Reviewed);
        }
    }

    // Two buyers race for a code with a single redemption left.
    let first = create_user(&state, ROLE_USER, "first").await?;
    let second = create_user(&state, ROLE_USER, "second").await?;
    let promotion = create_promotion(&state, "ONCE10", "0.10", Some(1)).await?;
    for user in [&first, &second] {
        cart_service::add_to_cart(&state, user, add(ssd.id, 1)).await?;
        cart_service::apply_promotion(&state, user, code("once10")).await?;
        reviewed(&state, user).await?;
    }
    let orders_before = Orders::find().count(&state.orm).await?;
    let (a, b) = tokio::join!(
        checkout_service::confirm(&state, &first),
        checkout_service::confirm(&state, &second),
    );
    let (winner, loser, err) = match (a, b) {
        (Ok(_), Err(err)) => (&first, &second, err),
        (Err(err), Ok(_)) => (&second, &first, err),
        (a, b) => panic!(
            "expected exactly one confirm to succeed, got {:?} and {:?}",
            a.is_ok(),
            b.is_ok()
        ),
    };
    assert!(
        matches!(
            err.status(),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
        ),
        "unexpected status {}",
        err.status()
    );
    assert_eq!(Orders::find().count(&state.orm).await?, orders_before + 1);
    let used = Promotions::find_by_id(promotion.id)
        .one(&state.orm)
        .await?
        .expect("promotion")
        .used_count;
    assert_eq!(used, 1);
    assert!(session_store::load(&state.orm, winner.user_id).await?.is_empty());
    let lost = session_store::load(&state.orm, loser.user_id).await?;
    assert_eq!(lost.stage(), CheckoutStage::Reviewed);
    assert_eq!(lost.promotion_code(), Some("ONCE10"));
    assert_eq!(lost.lines().len(), 1);

    // A promotion switched off after review blocks confirm and leaves the session alone.
    let late = create_user(&state, ROLE_USER, "late").await?;
    let withdrawn = create_promotion(&state, "SPRING20", "0.20", None).await?;
    cart_service::add_to_cart(&state, &late, add(cpu.id, 1)).await?;
    cart_service::apply_promotion(&state, &late, code("SPRING20")).await?;
    reviewed(&state, &late).await?;
    let before = session_store::load(&state.orm, late.user_id).await?;

    promotion_service::update_promotion(
        &state,
        &admin,
        withdrawn.id,
        UpdatePromotionRequest {
            code: None,
            value_type: None,
            value: None,
            expires_at: None,
            usage_limit: None,
            is_active: Some(false),
        },
    )
    .await?;

    let orders_before = Orders::find().count(&state.orm).await?;
    let err = checkout_service::confirm(&state, &late).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(Orders::find().count(&state.orm).await?, orders_before);
    let after = session_store::load(&state.orm, late.user_id).await?;
    assert_eq!(after, before);
    assert_eq!(after.stage(), CheckoutStage::Reviewed);

    Ok(())
}

fn add(product_id: i64, quantity: i32) -> AddToCartRequest {
    AddToCartRequest {
        product_id,
        quantity: Some(quantity),
    }
}

fn code(code: &str) -> ApplyPromotionRequest {
    ApplyPromotionRequest { code: code.into() }
}

async fn reviewed(state: &AppState, user: &AuthUser) -> anyhow::Result<()> {
    checkout_service::set_shipping(state, user, shipping()).await?;
    let view = checkout_service::review(state, user)
        .await?
        .data
        .expect("review");
    assert_eq!(view.stage, CheckoutStage::Reviewed);
    Ok(())
}
