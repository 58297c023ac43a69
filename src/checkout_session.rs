//! Per-user checkout state.
//!
//! A [`CheckoutSession`] is the only place cart contents, shipping details and
//! the chosen promotion code live. The web layer loads it, calls one of the
//! transition methods below and stores it back (see
//! `services::session_store`).
//!
//! ```text
//! CartOpen -> ShippingCollected -> Reviewed -> Confirmed -> (cleared) CartOpen
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::pricing::{CartLine, ProductId, ShippingInfo, normalize_code};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    #[default]
    CartOpen,
    ShippingCollected,
    Reviewed,
    Confirmed,
}

impl CheckoutStage {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckoutStage::CartOpen => "cart_open",
            CheckoutStage::ShippingCollected => "shipping_collected",
            CheckoutStage::Reviewed => "reviewed",
            CheckoutStage::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Quantity must be greater than 0, got {0}")]
    InvalidQuantity(i32),

    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    #[error("Shipping {0} is required")]
    MissingShippingField(&'static str),

    #[error("Shipping information has not been provided")]
    MissingShipping,

    #[error("Cannot {action} while checkout is {from}")]
    InvalidTransition {
        from: CheckoutStage,
        action: &'static str,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSession {
    lines: Vec<CartLine>,
    shipping: Option<ShippingInfo>,
    promotion_code: Option<String>,
    stage: CheckoutStage,
}

impl CheckoutSession {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn shipping(&self) -> Option<&ShippingInfo> {
        self.shipping.as_ref()
    }

    pub fn promotion_code(&self) -> Option<&str> {
        self.promotion_code.as_deref()
    }

    pub fn stage(&self) -> CheckoutStage {
        self.stage
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` of a product, merging with an existing line.
    pub fn add_item(&mut self, product_id: ProductId, quantity: i32) -> Result<(), SessionError> {
        self.ensure_editable("add to cart")?;
        if quantity <= 0 {
            return Err(SessionError::InvalidQuantity(quantity));
        }
        match self.lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(SessionError::InvalidQuantity(quantity))?;
            }
            None => self.lines.push(CartLine::new(product_id, quantity)),
        }
        self.cart_changed();
        Ok(())
    }

    /// Replace a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i32) -> Result<(), SessionError> {
        self.ensure_editable("update cart")?;
        if quantity < 0 {
            return Err(SessionError::InvalidQuantity(quantity));
        }
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or(SessionError::NotInCart(product_id))?;
        line.quantity = quantity;
        self.cart_changed();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), SessionError> {
        self.ensure_editable("remove from cart")?;
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        if self.lines.len() == before {
            return Err(SessionError::NotInCart(product_id));
        }
        self.cart_changed();
        Ok(())
    }

    /// Remember a promotion code. Validation against stored promotions is the
    /// caller's job; this only records the normalized code.
    pub fn apply_promotion(&mut self, code: &str) -> Result<(), SessionError> {
        self.ensure_editable("apply a promotion")?;
        self.promotion_code = Some(normalize_code(code));
        self.cart_changed();
        Ok(())
    }

    pub fn clear_promotion(&mut self) -> Result<(), SessionError> {
        self.ensure_editable("clear the promotion")?;
        if self.promotion_code.take().is_some() {
            self.cart_changed();
        }
        Ok(())
    }

    pub fn set_shipping(&mut self, shipping: ShippingInfo) -> Result<(), SessionError> {
        self.ensure_editable("set shipping")?;
        if self.lines.is_empty() {
            return Err(SessionError::EmptyCart);
        }
        validate_shipping(&shipping)?;
        self.shipping = Some(shipping);
        self.stage = CheckoutStage::ShippingCollected;
        Ok(())
    }

    pub fn review(&mut self) -> Result<(), SessionError> {
        if self.lines.is_empty() {
            return Err(SessionError::EmptyCart);
        }
        match self.stage {
            CheckoutStage::ShippingCollected | CheckoutStage::Reviewed => {}
            CheckoutStage::CartOpen if self.shipping.is_none() => {
                return Err(SessionError::MissingShipping);
            }
            from => {
                return Err(SessionError::InvalidTransition {
                    from,
                    action: "review",
                });
            }
        }
        self.stage = CheckoutStage::Reviewed;
        Ok(())
    }

    /// Check that the session may be confirmed, without changing it.
    pub fn ensure_confirmable(&self) -> Result<&ShippingInfo, SessionError> {
        if self.stage != CheckoutStage::Reviewed {
            return Err(SessionError::InvalidTransition {
                from: self.stage,
                action: "confirm",
            });
        }
        if self.lines.is_empty() {
            return Err(SessionError::EmptyCart);
        }
        self.shipping.as_ref().ok_or(SessionError::MissingShipping)
    }

    /// Mark the order as persisted. Only call once the commit is under way.
    pub fn confirm(&mut self) -> Result<(), SessionError> {
        self.ensure_confirmable()?;
        self.stage = CheckoutStage::Confirmed;
        Ok(())
    }

    /// Drop cart, shipping and promotion after a confirmed checkout.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if self.stage != CheckoutStage::Confirmed {
            return Err(SessionError::InvalidTransition {
                from: self.stage,
                action: "clear the cart",
            });
        }
        *self = Self::default();
        Ok(())
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), SessionError> {
        if self.stage == CheckoutStage::Confirmed {
            return Err(SessionError::InvalidTransition {
                from: self.stage,
                action,
            });
        }
        Ok(())
    }

    // Any change to what is being bought invalidates a previous review.
    fn cart_changed(&mut self) {
        self.stage = if self.lines.is_empty() {
            CheckoutStage::CartOpen
        } else if self.shipping.is_some() {
            CheckoutStage::ShippingCollected
        } else {
            CheckoutStage::CartOpen
        };
    }
}

fn validate_shipping(shipping: &ShippingInfo) -> Result<(), SessionError> {
    let fields = [
        ("address", &shipping.address),
        ("city", &shipping.city),
        ("zip", &shipping.zip),
        ("country", &shipping.country),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(SessionError::MissingShippingField(name));
        }
    }
    Ok(())
}
