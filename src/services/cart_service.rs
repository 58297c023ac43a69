use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, EntityTrait, TransactionTrait};

use crate::{
    audit::{self, AuditAction},
    checkout_session::{CheckoutSession, SessionError},
    dto::cart::{
        AddToCartRequest, ApplyPromotionRequest, CartLineView, CartView, UpdateCartItemRequest,
    },
    entity::products::Entity as Products,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    pricing::{PricingError, ProductId, price_cart},
    response::ApiResponse,
    services::{product_service::CatalogSnapshot, promotion_service, session_store},
    state::AppState,
};

/// Price the session against the live catalog.
///
/// An empty cart renders as an empty view. A stored promotion code that no
/// longer applies is reported in `promotion_error` and priced as no discount.
pub async fn build_view<C: ConnectionTrait>(
    conn: &C,
    session: &CheckoutSession,
) -> AppResult<CartView> {
    let ids: Vec<ProductId> = session.lines().iter().map(|line| line.product_id).collect();
    let catalog = CatalogSnapshot::load(conn, &ids, false).await?;

    let (promotion, promotion_error) = match session.promotion_code() {
        Some(code) => match promotion_service::resolve_promotion(conn, code, Utc::now(), false).await {
            Ok(promotion) => (Some(promotion), None),
            Err(AppError::Pricing(err @ PricingError::InvalidPromotion(_))) => {
                (None, Some(err.to_string()))
            }
            Err(err) => return Err(err),
        },
        None => (None, None),
    };

    let priced = match price_cart(session.lines(), &catalog, promotion.as_ref()) {
        Ok(priced) => priced,
        Err(PricingError::EmptyCart) => return Ok(empty_view(session)),
        Err(err) => return Err(err.into()),
    };

    let items = priced
        .lines
        .iter()
        .map(|line| {
            let product = catalog.get(line.product_id);
            CartLineView {
                product_id: line.product_id,
                name: product.map(|p| p.name.clone()).unwrap_or_default(),
                image_url: product.and_then(|p| p.image_url.clone()),
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total,
            }
        })
        .collect();

    Ok(CartView {
        stage: session.stage(),
        items,
        subtotal: priced.subtotal,
        discount_amount: priced.discount_amount,
        total: priced.total,
        applied_promotion: priced.applied_promotion,
        promotion_error,
        shipping: session.shipping().cloned(),
    })
}

fn empty_view(session: &CheckoutSession) -> CartView {
    CartView {
        stage: session.stage(),
        items: Vec::new(),
        subtotal: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        total: Decimal::ZERO,
        applied_promotion: None,
        promotion_error: None,
        shipping: session.shipping().cloned(),
    }
}

/// Apply `edit` to the caller's session while holding its row lock, then
/// save it and price the result in the same transaction.
pub(crate) async fn edit_session<F>(state: &AppState, user: &AuthUser, edit: F) -> AppResult<CartView>
where
    F: FnOnce(&mut CheckoutSession) -> Result<(), SessionError>,
{
    let txn = state.orm.begin().await?;
    let mut session = session_store::load_for_update(&txn, user.user_id).await?;
    edit(&mut session)?;
    session_store::save(&txn, user.user_id, &session).await?;
    let view = build_view(&txn, &session).await?;
    txn.commit().await?;
    Ok(view)
}

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let session = session_store::load(&state.orm, user.user_id).await?;
    let view = build_view(&state.orm, &session).await?;
    Ok(ApiResponse::item("OK", view))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let quantity = payload.quantity.unwrap_or(1);
    let exists = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .is_some();
    if !exists {
        return Err(PricingError::ProductNotFound(payload.product_id).into());
    }

    let product_id = payload.product_id;
    let view = edit_session(state, user, |session| session.add_item(product_id, quantity)).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartUpdate,
        serde_json::json!({ "product_id": product_id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::item("Added to cart", view))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    product_id: ProductId,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    let quantity = payload.quantity;
    let view = edit_session(state, user, |session| session.set_quantity(product_id, quantity)).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartUpdate,
        serde_json::json!({ "product_id": product_id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::item("Cart updated", view))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: ProductId,
) -> AppResult<ApiResponse<CartView>> {
    let view = edit_session(state, user, |session| session.remove_item(product_id)).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartRemove,
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::item("Removed from cart", view))
}

/// Validate `code` against active promotions and remember it on success.
/// A rejected code leaves the session untouched.
pub async fn apply_promotion(
    state: &AppState,
    user: &AuthUser,
    payload: ApplyPromotionRequest,
) -> AppResult<ApiResponse<CartView>> {
    let promotion =
        match promotion_service::resolve_promotion(&state.orm, &payload.code, Utc::now(), false).await {
            Ok(promotion) => promotion,
            Err(err) => {
                tracing::info!(user_id = %user.user_id, error = %err, "promotion rejected");
                return Err(err);
            }
        };

    let code = payload.code;
    let view = edit_session(state, user, |session| session.apply_promotion(&code)).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::PromotionApply,
        serde_json::json!({ "promotion_id": promotion.id, "code": promotion.code }),
    )
    .await;

    Ok(ApiResponse::item("Promotion applied", view))
}

pub async fn clear_promotion(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CartView>> {
    let view = edit_session(state, user, |session| session.clear_promotion()).await?;
    Ok(ApiResponse::item("Promotion removed", view))
}
