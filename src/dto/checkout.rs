use serde::Deserialize;
use utoipa::ToSchema;

use crate::pricing::ShippingInfo;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShippingRequest {
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

impl From<ShippingRequest> for ShippingInfo {
    fn from(req: ShippingRequest) -> Self {
        Self {
            address: req.address.trim().to_string(),
            city: req.city.trim().to_string(),
            zip: req.zip.trim().to_string(),
            country: req.country.trim().to_string(),
        }
    }
}
