use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DeliveryType, Listing, ListingPriceType, ListingStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_type: ListingPriceType,
    /// Required unless the item is free.
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub delivery_type: DeliveryType,
    #[schema(value_type = Option<String>)]
    pub delivery_fee: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_type: Option<ListingPriceType>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub delivery_type: Option<DeliveryType>,
    #[schema(value_type = Option<String>)]
    pub delivery_fee: Option<Decimal>,
    pub status: Option<ListingStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ListingList {
    #[schema(value_type = Vec<Listing>)]
    pub items: Vec<Listing>,
}
