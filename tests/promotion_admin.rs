mod common;

use chrono::{Duration, Utc};
use clickngo::{
    dto::promotions::{CreatePromotionRequest, UpdatePromotionRequest},
    middleware::auth::ROLE_ADMIN,
    pricing::PromotionValueType,
    services::promotion_service,
};
use common::{create_user, dec, setup_state};

#[test]
fn update_request_tells_null_from_missing() {
    let cleared: UpdatePromotionRequest =
        serde_json::from_str(r#"{"expires_at": null, "usage_limit": null}"#).expect("json");
    assert_eq!(cleared.expires_at, Some(None));
    assert_eq!(cleared.usage_limit, Some(None));

    let untouched: UpdatePromotionRequest = serde_json::from_str(r#"{"is_active": false}"#).expect("json");
    assert_eq!(untouched.expires_at, None);
    assert_eq!(untouched.usage_limit, None);

    let set: UpdatePromotionRequest =
        serde_json::from_str(r#"{"usage_limit": 5, "expires_at": "2030-01-01T00:00:00Z"}"#).expect("json");
    assert_eq!(set.usage_limit, Some(Some(5)));
    assert!(matches!(set.expires_at, Some(Some(_))));
}

#[tokio::test]
async fn promotion_limits_can_be_cleared() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url, 5).await?;
    let admin = create_user(&state, ROLE_ADMIN, "admin").await?;

    let created = promotion_service::create_promotion(
        &state,
        &admin,
        CreatePromotionRequest {
            code: Some("summer".into()),
            value_type: PromotionValueType::Fixed,
            value: dec("25"),
            expires_at: Some(Utc::now() + Duration::days(7)),
            usage_limit: Some(10),
            is_active: true,
        },
    )
    .await?
    .data
    .expect("promotion");
    assert_eq!(created.code.as_deref(), Some("SUMMER"));
    assert!(created.expires_at.is_some());
    assert_eq!(created.usage_limit, Some(10));

    // Omitted fields keep their values.
    let renamed: UpdatePromotionRequest = serde_json::from_str(r#"{"value": "30"}"#)?;
    let updated = promotion_service::update_promotion(&state, &admin, created.id, renamed)
        .await?
        .data
        .expect("promotion");
    assert_eq!(updated.value, dec("30"));
    assert!(updated.expires_at.is_some());
    assert_eq!(updated.usage_limit, Some(10));

    // Explicit nulls clear them.
    let cleared: UpdatePromotionRequest =
        serde_json::from_str(r#"{"expires_at": null, "usage_limit": null}"#)?;
    let updated = promotion_service::update_promotion(&state, &admin, created.id, cleared)
        .await?
        .data
        .expect("promotion");
    assert_eq!(updated.expires_at, None);
    assert_eq!(updated.usage_limit, None);
    assert_eq!(updated.value, dec("30"));

    Ok(())
}
