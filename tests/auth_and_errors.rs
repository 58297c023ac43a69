use axum::http::StatusCode;
use clickngo::{
    checkout_session::{CheckoutStage, SessionError},
    config::AppConfig,
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER, decode_token, ensure_admin},
    pricing::PricingError,
    services::auth_service::{hash_password, issue_token, verify_password},
};
use uuid::Uuid;

#[test]
fn password_hash_verifies_only_the_same_password() -> anyhow::Result<()> {
    let hash = hash_password("hunter22")?;
    assert_ne!(hash, "hunter22");
    assert!(verify_password("hunter22", &hash)?);
    assert!(!verify_password("hunter23", &hash)?);
    Ok(())
}

#[test]
fn issued_token_decodes_to_the_same_user() -> anyhow::Result<()> {
    let config = AppConfig::for_database("postgres://unused");
    let user_id = Uuid::new_v4();
    let token = issue_token(&config, user_id, ROLE_ADMIN)?;

    let user = decode_token(&token, &config.jwt_secret)?;
    assert_eq!(user.user_id, user_id);
    assert!(user.is_admin());

    let err = decode_token(&token, "another-secret").unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[test]
fn admin_guard_rejects_regular_users() {
    let user = AuthUser {
        user_id: Uuid::new_v4(),
        role: ROLE_USER.into(),
    };
    let err = ensure_admin(&user).unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[test]
fn checkout_errors_map_to_client_statuses() {
    let cases = [
        (AppError::from(PricingError::EmptyCart), StatusCode::BAD_REQUEST),
        (AppError::from(PricingError::ProductNotFound(4)), StatusCode::NOT_FOUND),
        (
            AppError::from(PricingError::InvalidPromotion("NOPE".into())),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (AppError::from(SessionError::MissingShipping), StatusCode::BAD_REQUEST),
        (
            AppError::from(SessionError::InvalidTransition {
                from: CheckoutStage::CartOpen,
                action: "confirm",
            }),
            StatusCode::CONFLICT,
        ),
        (AppError::Conflict("Insufficient stock".into()), StatusCode::CONFLICT),
    ];
    for (err, status) in cases {
        assert_eq!(err.status(), status, "{err}");
    }
}
