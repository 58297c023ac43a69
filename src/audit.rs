use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    CartUpdate,
    CartRemove,
    PromotionApply,
    ShippingUpdate,
    CheckoutConfirm,
    OrderStatusUpdate,
    ProductCreate,
    ProductUpdate,
    ProductDelete,
    InventoryAdjust,
    PromotionCreate,
    PromotionUpdate,
    PromotionDelete,
    ListingCreate,
    ListingUpdate,
    ListingDelete,
    UserUpdate,
    UserDelete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::CartUpdate => "cart_update",
            AuditAction::CartRemove => "cart_remove",
            AuditAction::PromotionApply => "promotion_apply",
            AuditAction::ShippingUpdate => "shipping_update",
            AuditAction::CheckoutConfirm => "checkout_confirm",
            AuditAction::OrderStatusUpdate => "order_status_update",
            AuditAction::ProductCreate => "product_create",
            AuditAction::ProductUpdate => "product_update",
            AuditAction::ProductDelete => "product_delete",
            AuditAction::InventoryAdjust => "inventory_adjust",
            AuditAction::PromotionCreate => "promotion_create",
            AuditAction::PromotionUpdate => "promotion_update",
            AuditAction::PromotionDelete => "promotion_delete",
            AuditAction::ListingCreate => "listing_create",
            AuditAction::ListingUpdate => "listing_update",
            AuditAction::ListingDelete => "listing_delete",
            AuditAction::UserUpdate => "user_update",
            AuditAction::UserDelete => "user_delete",
        }
    }

    fn resource(self) -> &'static str {
        match self {
            AuditAction::UserRegister
            | AuditAction::UserLogin
            | AuditAction::UserUpdate
            | AuditAction::UserDelete => "users",
            AuditAction::CartUpdate
            | AuditAction::CartRemove
            | AuditAction::PromotionApply
            | AuditAction::ShippingUpdate => "checkout_sessions",
            AuditAction::CheckoutConfirm | AuditAction::OrderStatusUpdate => "orders",
            AuditAction::ProductCreate
            | AuditAction::ProductUpdate
            | AuditAction::ProductDelete
            | AuditAction::InventoryAdjust => "products",
            AuditAction::PromotionCreate
            | AuditAction::PromotionUpdate
            | AuditAction::PromotionDelete => "promotions",
            AuditAction::ListingCreate | AuditAction::ListingUpdate | AuditAction::ListingDelete => {
                "listings"
            }
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Best-effort audit write: failures are logged and never fail the request.
pub async fn record(pool: &DbPool, user_id: Option<Uuid>, action: AuditAction, metadata: Value) {
    if let Err(err) = log_audit(pool, user_id, action, Some(metadata)).await {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}
