use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::{
    audit::{self, AuditAction},
    dto::promotions::{CreatePromotionRequest, PromotionList, UpdatePromotionRequest},
    entity::promotions::{ActiveModel, Column, Entity as Promotions},
    error::{AppError, AppResult, conflict_on_constraint},
    middleware::auth::{AuthUser, ensure_admin},
    models::Promotion,
    pricing::{self, PromotionId, PromotionValueType, apply_promotion_code, normalize_code},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Look up an active promotion by code and check it can be redeemed at `now`.
pub async fn resolve_promotion<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    now: DateTime<Utc>,
    lock: bool,
) -> AppResult<pricing::Promotion> {
    let normalized = normalize_code(code);
    let mut finder = Promotions::find()
        .filter(Column::Code.eq(normalized.clone()))
        .filter(Column::IsActive.eq(true));
    if lock {
        finder = finder.lock(LockType::Update);
    }
    let found = finder
        .one(conn)
        .await?
        .map(pricing::Promotion::try_from)
        .transpose()?;

    let promotion = apply_promotion_code(&normalized, &found, now)?;
    Ok(promotion)
}

/// Count one redemption. Fails when a concurrent checkout used the last slot.
pub async fn record_redemption<C: ConnectionTrait>(conn: &C, id: PromotionId) -> AppResult<()> {
    let result = Promotions::update_many()
        .col_expr(Column::UsedCount, Expr::col(Column::UsedCount).add(1))
        .col_expr(Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(Column::Id.eq(id))
        .filter(Column::IsActive.eq(true))
        .filter(
            Column::UsageLimit
                .is_null()
                .or(Expr::col(Column::UsedCount).lt(Expr::col(Column::UsageLimit))),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Promotion is no longer available".into(),
        ));
    }
    Ok(())
}

pub async fn list_promotions(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PromotionList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = Promotions::find().order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Promotion::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApiResponse::success(
        "Promotions",
        PromotionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_promotion(
    state: &AppState,
    user: &AuthUser,
    id: PromotionId,
) -> AppResult<ApiResponse<Promotion>> {
    ensure_admin(user)?;
    let promotion = Promotions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::item("Promotion", Promotion::try_from(promotion)?))
}

pub async fn create_promotion(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    ensure_admin(user)?;
    validate_promotion(payload.value_type, payload.value, payload.usage_limit)?;

    let active = ActiveModel {
        id: NotSet,
        code: Set(clean_code(payload.code)),
        value_type: Set(payload.value_type.as_str().to_string()),
        value: Set(payload.value),
        expires_at: Set(payload.expires_at.map(Into::into)),
        usage_limit: Set(payload.usage_limit),
        used_count: Set(0),
        is_active: Set(payload.is_active),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let promotion = active
        .insert(&state.orm)
        .await
        .map_err(|err| conflict_on_constraint(err, "Promotion code already exists"))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::PromotionCreate,
        serde_json::json!({ "promotion_id": promotion.id, "code": promotion.code }),
    )
    .await;

    Ok(ApiResponse::item(
        "Promotion created",
        Promotion::try_from(promotion)?,
    ))
}

pub async fn update_promotion(
    state: &AppState,
    user: &AuthUser,
    id: PromotionId,
    payload: UpdatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    ensure_admin(user)?;
    let existing = Promotions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let value_type = match payload.value_type {
        Some(value_type) => value_type,
        None => PromotionValueType::parse(&existing.value_type)?,
    };
    let value = payload.value.unwrap_or(existing.value);
    let usage_limit = payload.usage_limit.unwrap_or(existing.usage_limit);
    validate_promotion(value_type, value, usage_limit)?;

    let mut active: ActiveModel = existing.into();
    if payload.code.is_some() {
        active.code = Set(clean_code(payload.code));
    }
    active.value_type = Set(value_type.as_str().to_string());
    active.value = Set(value);
    if let Some(expires_at) = payload.expires_at {
        active.expires_at = Set(expires_at.map(Into::into));
    }
    active.usage_limit = Set(usage_limit);
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let promotion = active
        .update(&state.orm)
        .await
        .map_err(|err| conflict_on_constraint(err, "Promotion code already exists"))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::PromotionUpdate,
        serde_json::json!({ "promotion_id": promotion.id }),
    )
    .await;

    Ok(ApiResponse::item("Updated", Promotion::try_from(promotion)?))
}

pub async fn delete_promotion(
    state: &AppState,
    user: &AuthUser,
    id: PromotionId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Promotions::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::PromotionDelete,
        serde_json::json!({ "promotion_id": id }),
    )
    .await;

    Ok(ApiResponse::item("Deleted", serde_json::json!({})))
}

fn clean_code(code: Option<String>) -> Option<String> {
    code.map(|code| normalize_code(&code))
        .filter(|code| !code.is_empty())
}

fn validate_promotion(
    value_type: PromotionValueType,
    value: Decimal,
    usage_limit: Option<i32>,
) -> AppResult<()> {
    value_type.validate(value)?;
    if usage_limit.is_some_and(|limit| limit < 0) {
        return Err(AppError::BadRequest("usage_limit must not be negative".into()));
    }
    Ok(())
}
