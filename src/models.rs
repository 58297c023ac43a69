use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        listings::Model as ListingModel, order_items::Model as OrderItemModel,
        orders::Model as OrderModel, products::Model as ProductModel,
        promotions::Model as PromotionModel, users::Model as UserModel,
    },
    pricing::{Promotion as PricingPromotion, PromotionValueType, PricingError},
};

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            password_hash: model.password_hash,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image_url: model.image_url,
            tags: split_tags(&model.tags),
            stock: model.stock,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Promotion {
    pub id: i64,
    pub code: Option<String>,
    pub value_type: PromotionValueType,
    #[schema(value_type = String)]
    pub value: Decimal,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PromotionModel> for Promotion {
    type Error = PricingError;

    fn try_from(model: PromotionModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            code: model.code,
            value_type: PromotionValueType::parse(&model.value_type)?,
            value: model.value,
            expires_at: model.expires_at.map(|dt| dt.with_timezone(&Utc)),
            usage_limit: model.usage_limit,
            used_count: model.used_count,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<PromotionModel> for PricingPromotion {
    type Error = PricingError;

    fn try_from(model: PromotionModel) -> Result<Self, Self::Error> {
        let value_type = PromotionValueType::parse(&model.value_type)?;
        value_type.validate(model.value)?;
        Ok(Self {
            id: model.id,
            code: model.code,
            value_type,
            value: model.value,
            active: model.is_active,
            expires_at: model.expires_at.map(|dt| dt.with_timezone(&Utc)),
            usage_limit: model.usage_limit,
            used_count: model.used_count,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount_amount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub promotion_id: Option<i64>,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_zip: String,
    pub shipping_country: String,
    pub tracking_number: String,
    pub shipping_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            subtotal: model.subtotal,
            discount_amount: model.discount_amount,
            total: model.total,
            promotion_id: model.promotion_id,
            shipping_address: model.shipping_address,
            shipping_city: model.shipping_city,
            shipping_zip: model.shipping_zip,
            shipping_country: model.shipping_country,
            tracking_number: model.tracking_number,
            shipping_status: model.shipping_status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn from_entity(model: OrderItemModel, product_name: Option<String>) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name,
            quantity: model.quantity,
            unit_price: model.unit_price,
            line_total: model.line_total,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingPriceType {
    Fixed,
    Negotiable,
    /// Given away; the stored price is always zero.
    Free,
}

impl ListingPriceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingPriceType::Fixed => "fixed",
            ListingPriceType::Negotiable => "negotiable",
            ListingPriceType::Free => "free",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fixed" => Some(ListingPriceType::Fixed),
            "negotiable" => Some(ListingPriceType::Negotiable),
            "free" => Some(ListingPriceType::Free),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Collected by the buyer; no delivery fee.
    Pickup,
    Shipping,
}

impl DeliveryType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryType::Pickup => "pickup",
            DeliveryType::Shipping => "shipping",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pickup" => Some(DeliveryType::Pickup),
            "shipping" => Some(DeliveryType::Shipping),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Available,
    Sold,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Sold => "sold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(ListingStatus::Available),
            "sold" => Some(ListingStatus::Sold),
            _ => None,
        }
    }
}

/// A second-hand item posted by a user on the marketplace.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_type: ListingPriceType,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub delivery_type: DeliveryType,
    #[schema(value_type = String)]
    pub delivery_fee: Decimal,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ListingModel> for Listing {
    type Error = anyhow::Error;

    fn try_from(model: ListingModel) -> Result<Self, Self::Error> {
        let price_type = ListingPriceType::parse(&model.price_type)
            .ok_or_else(|| anyhow::anyhow!("unknown listing price type {}", model.price_type))?;
        let delivery_type = DeliveryType::parse(&model.delivery_type)
            .ok_or_else(|| anyhow::anyhow!("unknown delivery type {}", model.delivery_type))?;
        let status = ListingStatus::parse(&model.status)
            .ok_or_else(|| anyhow::anyhow!("unknown listing status {}", model.status))?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            image_url: model.image_url,
            price_type,
            price: model.price,
            delivery_type,
            delivery_fee: model.delivery_fee,
            status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
