use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::{cart::CartView, checkout::ShippingRequest, orders::OrderWithItems},
    entity::{
        order_items::ActiveModel as OrderItemActive,
        orders::{ActiveModel as OrderActive, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    pricing::{OrderDraft, ProductId, ShippingInfo, finalize_checkout, price_cart},
    response::ApiResponse,
    services::{
        cart_service::{build_view, edit_session},
        order_service::{ShippingStatus, order_with_items},
        product_service::CatalogSnapshot,
        promotion_service, session_store,
    },
    state::AppState,
};

/// Opaque, practically unique shipment reference.
pub fn generate_tracking_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("TRK{}{:03}", now.timestamp_millis(), suffix)
}

pub async fn set_shipping(
    state: &AppState,
    user: &AuthUser,
    payload: ShippingRequest,
) -> AppResult<ApiResponse<CartView>> {
    let shipping: ShippingInfo = payload.into();
    let view = edit_session(state, user, |session| session.set_shipping(shipping)).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ShippingUpdate,
        serde_json::json!({ "stage": view.stage.as_str() }),
    )
    .await;

    Ok(ApiResponse::item("Shipping saved", view))
}

/// Price the cart strictly (a stale promotion code is an error here) and mark
/// the session reviewed.
pub async fn review(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let txn = state.orm.begin().await?;
    let mut session = session_store::load_for_update(&txn, user.user_id).await?;
    if let Some(code) = session.promotion_code() {
        promotion_service::resolve_promotion(&txn, code, Utc::now(), false).await?;
    }
    session.review()?;

    let view = build_view(&txn, &session).await?;
    session_store::save(&txn, user.user_id, &session).await?;
    txn.commit().await?;
    Ok(ApiResponse::item("Review your order", view))
}

/// Persist the reviewed checkout as one transaction.
///
/// Order, items, stock decrements, the promotion redemption and the cleared
/// session commit together. On any error the transaction is rolled back and
/// the stored session is still `reviewed`, so the user can retry.
pub async fn confirm(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let now = Utc::now();

    // Serializes concurrent confirms for the same user.
    let mut session = session_store::load_for_update(&txn, user.user_id).await?;
    let shipping = session.ensure_confirmable()?.clone();

    let ids: Vec<ProductId> = session.lines().iter().map(|line| line.product_id).collect();
    let catalog = CatalogSnapshot::load(&txn, &ids, true).await?;
    let promotion = match session.promotion_code() {
        Some(code) => Some(promotion_service::resolve_promotion(&txn, code, now, true).await?),
        None => None,
    };

    let priced = price_cart(session.lines(), &catalog, promotion.as_ref())?;
    let draft = finalize_checkout(&priced, &shipping, generate_tracking_number(now))?;

    for item in &draft.items {
        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .filter(ProdCol::Stock.gte(item.quantity))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            let name = catalog
                .get(item.product_id)
                .map_or_else(|| item.product_id.to_string(), |p| p.name.clone());
            return Err(AppError::Conflict(format!("Insufficient stock for {name}")));
        }
    }

    if let Some(promotion_id) = draft.promotion_id {
        promotion_service::record_redemption(&txn, promotion_id).await?;
    }

    let order = insert_order(&txn, user.user_id, &draft).await?;
    let order_id = order.id;

    session.confirm()?;
    session.clear()?;
    session_store::save(&txn, user.user_id, &session).await?;

    let data = order_with_items(&txn, order).await?;

    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        order_id = %order_id,
        total = %draft.total,
        discount = %draft.discount_amount,
        "checkout confirmed"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CheckoutConfirm,
        serde_json::json!({
            "order_id": order_id,
            "tracking_number": draft.tracking_number,
            "promotion_id": draft.promotion_id,
        }),
    )
    .await;

    Ok(ApiResponse::item("Checkout success", data))
}

async fn insert_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    draft: &OrderDraft,
) -> AppResult<OrderModel> {
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        subtotal: Set(draft.subtotal),
        discount_amount: Set(draft.discount_amount),
        total: Set(draft.total),
        promotion_id: Set(draft.promotion_id),
        shipping_address: Set(draft.shipping.address.clone()),
        shipping_city: Set(draft.shipping.city.clone()),
        shipping_zip: Set(draft.shipping.zip.clone()),
        shipping_country: Set(draft.shipping.country.clone()),
        tracking_number: Set(draft.tracking_number.clone()),
        shipping_status: Set(ShippingStatus::Pending.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    for item in &draft.items {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            line_total: Set(item.line_total),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
    }

    Ok(order)
}
