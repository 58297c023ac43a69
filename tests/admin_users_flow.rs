mod common;

use axum::http::StatusCode;
use clickngo::{
    dto::{admin::UpdateUserRequest, cart::AddToCartRequest, listings::CreateListingRequest},
    entity::{Listings, Users},
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    models::{DeliveryType, ListingPriceType},
    routes::params::Pagination,
    services::{admin_service, cart_service, checkout_service, listing_service},
};
use common::{create_product, create_user, setup_state, shipping};
use sea_orm::{EntityTrait, PaginatorTrait};

// Flow: list -> edit -> guard rails -> delete, including users that own orders.
#[tokio::test]
async fn admin_manages_users() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url, 5).await?;
    let admin = create_user(&state, ROLE_ADMIN, "admin").await?;
    let alice = create_user(&state, ROLE_USER, "alice").await?;
    let bob = create_user(&state, ROLE_USER, "bob").await?;

    let users = admin_service::list_users(&state, &admin, Pagination::default())
        .await?
        .data
        .expect("users")
        .items;
    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["admin", "alice", "bob"]);

    let err = admin_service::list_users(&state, &alice, Pagination::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    let promoted = admin_service::update_user(
        &state,
        &admin,
        alice.user_id,
        UpdateUserRequest {
            username: Some(" alice2 ".into()),
            email: Some("Alice2@Example.com".into()),
            role: Some("admin".into()),
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(promoted.username, "alice2");
    assert_eq!(promoted.email, "alice2@example.com");
    assert_eq!(promoted.role, ROLE_ADMIN);

    let err = admin_service::update_user(
        &state,
        &admin,
        bob.user_id,
        UpdateUserRequest {
            username: Some("alice2".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);

    let err = admin_service::update_user(
        &state,
        &admin,
        bob.user_id,
        UpdateUserRequest {
            role: Some("superuser".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err = admin_service::update_user(
        &state,
        &admin,
        admin.user_id,
        UpdateUserRequest {
            role: Some("user".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err = admin_service::delete_user(&state, &admin, admin.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    // A user with orders cannot be removed.
    let gpu = create_product(&state, "NVIDIA RTX 4090", "1599.99", 3).await?;
    cart_service::add_to_cart(
        &state,
        &bob,
        AddToCartRequest {
            product_id: gpu.id,
            quantity: Some(1),
        },
    )
    .await?;
    checkout_service::set_shipping(&state, &bob, shipping()).await?;
    checkout_service::review(&state, &bob).await?;
    checkout_service::confirm(&state, &bob).await?;
    let err = admin_service::delete_user(&state, &admin, bob.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);

    // Without orders the user goes, and their listings and session with them.
    let carol = create_user(&state, ROLE_USER, "carol").await?;
    cart_service::add_to_cart(
        &state,
        &carol,
        AddToCartRequest {
            product_id: gpu.id,
            quantity: None,
        },
    )
    .await?;
    listing_service::create_listing(
        &state,
        &carol,
        CreateListingRequest {
            title: "Desk lamp".into(),
            description: None,
            image_url: None,
            price_type: ListingPriceType::Free,
            price: None,
            delivery_type: DeliveryType::Pickup,
            delivery_fee: None,
        },
    )
    .await?;
    admin_service::delete_user(&state, &admin, carol.user_id).await?;
    assert!(Users::find_by_id(carol.user_id).one(&state.orm).await?.is_none());
    assert_eq!(Listings::find().count(&state.orm).await?, 0);

    let err = admin_service::get_user(&state, &admin, carol.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    Ok(())
}
