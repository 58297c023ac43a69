pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod listings;
pub mod orders;
pub mod products;
pub mod promotions;
