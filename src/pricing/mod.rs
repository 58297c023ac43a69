//! Cart pricing and promotion rules.
//!
//! Everything in this module is pure: callers load prices and promotions from
//! storage, hand them over through [`PriceLookup`] / [`PromotionLookup`], and
//! persist the resulting [`OrderDraft`] themselves.

mod draft;
mod engine;
mod promotion;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use draft::{OrderDraft, OrderItemDraft, ShippingInfo, finalize_checkout};
pub use engine::price_cart;
pub use promotion::{PromotionLookup, apply_promotion_code, normalize_code};

pub type ProductId = i64;
pub type PromotionId = i64;

/// Decimal places kept for every stored amount (`NUMERIC(14,4)`).
pub const MONEY_SCALE: u32 = 4;

/// Round an amount to the storage scale, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    #[error("Promotion code '{0}' is not valid")]
    InvalidPromotion(String),

    #[error("Invalid promotion value: {0}")]
    InvalidPromotionValue(String),

    #[error("Amount out of range")]
    Overflow,
}

/// One product/quantity pair held in a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl CartLine {
    pub fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Current unit prices keyed by product id.
pub trait PriceLookup {
    fn unit_price(&self, product_id: ProductId) -> Option<Decimal>;
}

impl PriceLookup for HashMap<ProductId, Decimal> {
    fn unit_price(&self, product_id: ProductId) -> Option<Decimal> {
        self.get(&product_id).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromotionValueType {
    /// Fraction of the subtotal in `[0, 1]`.
    Percentage,
    /// Currency amount taken off the subtotal.
    Fixed,
}

impl PromotionValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            PromotionValueType::Percentage => "percentage",
            PromotionValueType::Fixed => "fixed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, PricingError> {
        match value {
            "percentage" => Ok(PromotionValueType::Percentage),
            "fixed" => Ok(PromotionValueType::Fixed),
            other => Err(PricingError::InvalidPromotionValue(format!(
                "unknown value type '{other}'"
            ))),
        }
    }

    pub fn validate(self, value: Decimal) -> Result<(), PricingError> {
        if value.is_sign_negative() {
            return Err(PricingError::InvalidPromotionValue(
                "value must not be negative".into(),
            ));
        }
        if self == PromotionValueType::Percentage && value > Decimal::ONE {
            return Err(PricingError::InvalidPromotionValue(
                "percentage must be a fraction between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub code: Option<String>,
    pub value_type: PromotionValueType,
    pub value: Decimal,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
}

impl Promotion {
    pub fn percentage(id: PromotionId, code: Option<&str>, value: Decimal) -> Self {
        Self::simple(id, code, PromotionValueType::Percentage, value)
    }

    pub fn fixed(id: PromotionId, code: Option<&str>, value: Decimal) -> Self {
        Self::simple(id, code, PromotionValueType::Fixed, value)
    }

    fn simple(
        id: PromotionId,
        code: Option<&str>,
        value_type: PromotionValueType,
        value: Decimal,
    ) -> Self {
        Self {
            id,
            code: code.map(normalize_code),
            value_type,
            value,
            active: true,
            expires_at: None,
            usage_limit: None,
            used_count: 0,
        }
    }

    /// Active, not expired at `now`, and below its usage limit.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.expires_at.is_none_or(|expires| expires > now)
            && self.usage_limit.is_none_or(|limit| self.used_count < limit)
    }

    /// Discount this promotion grants on `subtotal`, rounded to [`MONEY_SCALE`].
    /// Fixed discounts are not capped at the subtotal; only the total is clamped.
    pub fn discount_on(&self, subtotal: Decimal) -> Result<Decimal, PricingError> {
        let discount = match self.value_type {
            PromotionValueType::Percentage => subtotal
                .checked_mul(self.value)
                .ok_or(PricingError::Overflow)?,
            PromotionValueType::Fixed => self.value,
        };
        Ok(round_money(discount).max(Decimal::ZERO))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AppliedPromotion {
    pub id: PromotionId,
    pub code: Option<String>,
    pub value_type: PromotionValueType,
    #[schema(value_type = String)]
    pub value: Decimal,
}

impl From<&Promotion> for AppliedPromotion {
    fn from(promotion: &Promotion) -> Self {
        Self {
            id: promotion.id,
            code: promotion.code.clone(),
            value_type: promotion.value_type,
            value: promotion.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount_amount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub applied_promotion: Option<AppliedPromotion>,
}
