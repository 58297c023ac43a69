use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::{
    audit::{self, AuditAction},
    dto::listings::{CreateListingRequest, ListingList, UpdateListingRequest},
    entity::listings::{ActiveModel, Column, Entity as Listings, Model as ListingModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DeliveryType, Listing, ListingPriceType, ListingStatus},
    pricing::round_money,
    response::{ApiResponse, Meta},
    routes::params::{ListingQuery, Pagination},
    state::AppState,
};

pub type ListingId = i64;

/// Settle the stored price and delivery fee for a listing.
///
/// Free items store a zero price and pickup items a zero fee. Any other
/// price type needs a price.
pub fn listing_terms(
    price_type: ListingPriceType,
    price: Option<Decimal>,
    delivery_type: DeliveryType,
    delivery_fee: Option<Decimal>,
) -> AppResult<(Decimal, Decimal)> {
    let price = match price_type {
        ListingPriceType::Free => {
            if price.is_some_and(|price| !price.is_zero()) {
                return Err(AppError::BadRequest("free listings cannot have a price".into()));
            }
            Decimal::ZERO
        }
        ListingPriceType::Fixed | ListingPriceType::Negotiable => {
            price.ok_or_else(|| AppError::BadRequest("price is required".into()))?
        }
    };
    let delivery_fee = match delivery_type {
        DeliveryType::Pickup => {
            if delivery_fee.is_some_and(|fee| !fee.is_zero()) {
                return Err(AppError::BadRequest(
                    "pickup listings cannot have a delivery fee".into(),
                ));
            }
            Decimal::ZERO
        }
        DeliveryType::Shipping => delivery_fee.unwrap_or(Decimal::ZERO),
    };

    if price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if delivery_fee.is_sign_negative() {
        return Err(AppError::BadRequest("delivery_fee must not be negative".into()));
    }
    Ok((round_money(price), round_money(delivery_fee)))
}

/// Available listings, newest first.
pub async fn list_listings(
    state: &AppState,
    query: ListingQuery,
) -> AppResult<ApiResponse<ListingList>> {
    let mut condition = Condition::all().add(Column::Status.eq(ListingStatus::Available.as_str()));
    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    page_of(state, condition, query.pagination(), "Listings").await
}

/// Every listing the caller owns, sold ones included.
pub async fn list_my_listings(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ListingList>> {
    let condition = Condition::all().add(Column::UserId.eq(user.user_id));
    page_of(state, condition, pagination, "My listings").await
}

async fn page_of(
    state: &AppState,
    condition: Condition,
    pagination: Pagination,
    message: &str,
) -> AppResult<ApiResponse<ListingList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Listings::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Listing::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(message, ListingList { items }, Some(meta)))
}

pub async fn get_listing(state: &AppState, id: ListingId) -> AppResult<ApiResponse<Listing>> {
    let listing = Listings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::item("Listing", Listing::try_from(listing)?))
}

pub async fn create_listing(
    state: &AppState,
    user: &AuthUser,
    payload: CreateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    let title = clean_title(&payload.title)?;
    let (price, delivery_fee) = listing_terms(
        payload.price_type,
        payload.price,
        payload.delivery_type,
        payload.delivery_fee,
    )?;

    let listing = ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        title: Set(title),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        price_type: Set(payload.price_type.as_str().to_string()),
        price: Set(price),
        delivery_type: Set(payload.delivery_type.as_str().to_string()),
        delivery_fee: Set(delivery_fee),
        status: Set(ListingStatus::Available.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ListingCreate,
        serde_json::json!({ "listing_id": listing.id }),
    )
    .await;

    Ok(ApiResponse::item("Listing created", Listing::try_from(listing)?))
}

pub async fn update_listing(
    state: &AppState,
    user: &AuthUser,
    id: ListingId,
    payload: UpdateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    let existing = owned_listing(state, user, id).await?;
    let current = Listing::try_from(existing.clone())?;

    let price_type = payload.price_type.unwrap_or(current.price_type);
    let delivery_type = payload.delivery_type.unwrap_or(current.delivery_type);
    // Switching to free or pickup drops the old amount unless a new one is given.
    let price = payload
        .price
        .or((price_type != ListingPriceType::Free).then_some(current.price));
    let delivery_fee = payload
        .delivery_fee
        .or((delivery_type != DeliveryType::Pickup).then_some(current.delivery_fee));
    let (price, delivery_fee) = listing_terms(price_type, price, delivery_type, delivery_fee)?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(clean_title(&title)?);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.price_type = Set(price_type.as_str().to_string());
    active.price = Set(price);
    active.delivery_type = Set(delivery_type.as_str().to_string());
    active.delivery_fee = Set(delivery_fee);
    if let Some(status) = payload.status {
        active.status = Set(status.as_str().to_string());
    }
    active.updated_at = Set(Utc::now().into());

    let listing = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ListingUpdate,
        serde_json::json!({ "listing_id": listing.id, "status": listing.status }),
    )
    .await;

    Ok(ApiResponse::item("Updated", Listing::try_from(listing)?))
}

pub async fn delete_listing(
    state: &AppState,
    user: &AuthUser,
    id: ListingId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Listings::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ListingDelete,
        serde_json::json!({ "listing_id": id }),
    )
    .await;

    Ok(ApiResponse::item("Deleted", serde_json::json!({})))
}

// Someone else's listing reads as missing.
async fn owned_listing(state: &AppState, user: &AuthUser, id: ListingId) -> AppResult<ListingModel> {
    Listings::find_by_id(id)
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn clean_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    Ok(title.to_string())
}
