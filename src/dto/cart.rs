use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    checkout_session::CheckoutStage,
    pricing::{AppliedPromotion, ShippingInfo},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: i64,
    /// Defaults to 1.
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// Zero removes the line.
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyPromotionRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineView {
    pub product_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

/// Priced snapshot of the caller's checkout session.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub stage: CheckoutStage,
    pub items: Vec<CartLineView>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount_amount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub applied_promotion: Option<AppliedPromotion>,
    /// Set when the stored promotion code no longer applies.
    pub promotion_error: Option<String>,
    pub shipping: Option<ShippingInfo>,
}
