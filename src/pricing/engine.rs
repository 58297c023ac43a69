use rust_decimal::Decimal;

use super::{
    AppliedPromotion, CartLine, PriceLookup, PricedCart, PricedLine, PricingError, Promotion,
    round_money,
};

/// Price `lines` against current unit prices and apply at most one promotion.
///
/// Line totals and the discount are rounded to the storage scale first, so
/// `total = max(0, subtotal - discount_amount)` also holds for stored rows.
/// The discount is reported as granted, even when it exceeds the subtotal.
pub fn price_cart<L>(
    lines: &[CartLine],
    products: &L,
    promotion: Option<&Promotion>,
) -> Result<PricedCart, PricingError>
where
    L: PriceLookup + ?Sized,
{
    if lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;
    for line in lines {
        if line.quantity <= 0 {
            return Err(PricingError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }
        let unit_price = products
            .unit_price(line.product_id)
            .ok_or(PricingError::ProductNotFound(line.product_id))?;
        let line_total = unit_price
            .checked_mul(Decimal::from(line.quantity))
            .map(round_money)
            .ok_or(PricingError::Overflow)?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(PricingError::Overflow)?;
        priced.push(PricedLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price,
            line_total,
        });
    }

    let discount_amount = match promotion {
        Some(promotion) => promotion.discount_on(subtotal)?,
        None => Decimal::ZERO,
    };
    let total = (subtotal - discount_amount).max(Decimal::ZERO);

    Ok(PricedCart {
        lines: priced,
        subtotal,
        discount_amount,
        total,
        applied_promotion: promotion.map(AppliedPromotion::from),
    })
}
