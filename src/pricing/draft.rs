use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PricedCart, PricingError, ProductId, PromotionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemDraft {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Row-level data for one order and its items, ready to be written atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub tracking_number: String,
    pub shipping: ShippingInfo,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub promotion_id: Option<PromotionId>,
    pub items: Vec<OrderItemDraft>,
}

/// Turn a priced cart into an order draft. Unit prices are copied, so the
/// order keeps the price paid even if the catalog changes later.
pub fn finalize_checkout(
    cart: &PricedCart,
    shipping: &ShippingInfo,
    tracking_number: impl Into<String>,
) -> Result<OrderDraft, PricingError> {
    if cart.lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }

    let items = cart
        .lines
        .iter()
        .map(|line| OrderItemDraft {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
        })
        .collect();

    Ok(OrderDraft {
        tracking_number: tracking_number.into(),
        shipping: shipping.clone(),
        subtotal: cart.subtotal,
        discount_amount: cart.discount_amount,
        total: cart.total,
        promotion_id: cart.applied_promotion.as_ref().map(|promotion| promotion.id),
        items,
    })
}
