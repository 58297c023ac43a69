use chrono::{DateTime, Utc};

use super::{PricingError, Promotion};

/// Promotions addressable by redemption code.
pub trait PromotionLookup {
    /// `code` is already normalized with [`normalize_code`].
    fn find_by_code(&self, code: &str) -> Option<Promotion>;
}

impl PromotionLookup for [Promotion] {
    fn find_by_code(&self, code: &str) -> Option<Promotion> {
        self.iter()
            .find(|promotion| {
                promotion
                    .code
                    .as_deref()
                    .is_some_and(|stored| stored.eq_ignore_ascii_case(code))
            })
            .cloned()
    }
}

impl PromotionLookup for Option<Promotion> {
    fn find_by_code(&self, code: &str) -> Option<Promotion> {
        self.as_ref()
            .filter(|promotion| {
                promotion
                    .code
                    .as_deref()
                    .is_some_and(|stored| stored.eq_ignore_ascii_case(code))
            })
            .cloned()
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Resolve a user-entered code to a redeemable promotion.
///
/// Usage counters are left untouched; they are incremented by the checkout
/// transaction once the order is committed.
pub fn apply_promotion_code<L>(
    code: &str,
    promotions: &L,
    now: DateTime<Utc>,
) -> Result<Promotion, PricingError>
where
    L: PromotionLookup + ?Sized,
{
    let normalized = normalize_code(code);
    if normalized.is_empty() {
        return Err(PricingError::InvalidPromotion(normalized));
    }

    match promotions.find_by_code(&normalized) {
        Some(promotion) if promotion.is_redeemable_at(now) => Ok(promotion),
        _ => Err(PricingError::InvalidPromotion(normalized)),
    }
}
