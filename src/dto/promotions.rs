use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::{models::Promotion, pricing::PromotionValueType};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePromotionRequest {
    /// Omit for a promotion without a redemption code.
    pub code: Option<String>,
    pub value_type: PromotionValueType,
    #[schema(value_type = String)]
    pub value: Decimal,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePromotionRequest {
    pub code: Option<String>,
    pub value_type: Option<PromotionValueType>,
    #[schema(value_type = Option<String>)]
    pub value: Option<Decimal>,
    /// `null` removes the expiry, an omitted field keeps it.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    /// `null` removes the limit, an omitted field keeps it.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub usage_limit: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PromotionList {
    #[schema(value_type = Vec<Promotion>)]
    pub items: Vec<Promotion>,
}

fn default_active() -> bool {
    true
}

// Present fields map to `Some`, so an explicit `null` becomes `Some(None)`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
