use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    checkout_session::CheckoutStage,
    dto::{
        admin::{InventoryAdjustRequest, LowStockList, UpdateUserRequest, UserList},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, ApplyPromotionRequest, CartLineView, CartView, UpdateCartItemRequest},
        checkout::ShippingRequest,
        listings::{CreateListingRequest, ListingList, UpdateListingRequest},
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        promotions::{CreatePromotionRequest, PromotionList, UpdatePromotionRequest},
    },
    models::{
        DeliveryType, Listing, ListingPriceType, ListingStatus, Order, OrderItem, Product, Promotion,
        User,
    },
    pricing::{AppliedPromotion, PromotionValueType, ShippingInfo},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, checkout, health, listings, orders, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::apply_promotion,
        cart::clear_promotion,
        checkout::set_shipping,
        checkout::review,
        checkout::confirm,
        orders::list_orders,
        orders::get_order,
        listings::list_listings,
        listings::list_my_listings,
        listings::create_listing,
        listings::get_listing,
        listings::update_listing,
        listings::delete_listing,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_promotions,
        admin::get_promotion,
        admin::create_promotion,
        admin::update_promotion,
        admin::delete_promotion,
        admin::list_users,
        admin::get_user,
        admin::update_user,
        admin::delete_user
    ),
    components(
        schemas(
            User,
            Product,
            Promotion,
            PromotionValueType,
            AppliedPromotion,
            Order,
            OrderItem,
            ShippingInfo,
            CheckoutStage,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            ApplyPromotionRequest,
            CartLineView,
            CartView,
            ShippingRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreatePromotionRequest,
            UpdatePromotionRequest,
            PromotionList,
            InventoryAdjustRequest,
            LowStockList,
            Listing,
            ListingPriceType,
            DeliveryType,
            ListingStatus,
            CreateListingRequest,
            UpdateListingRequest,
            ListingList,
            UpdateUserRequest,
            UserList,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Promotion>,
            ApiResponse<PromotionList>,
            ApiResponse<LowStockList>,
            ApiResponse<Listing>,
            ApiResponse<ListingList>,
            ApiResponse<User>,
            ApiResponse<UserList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Session cart and promotion code"),
        (name = "Checkout", description = "Shipping, review and confirmation"),
        (name = "Orders", description = "Order history"),
        (name = "Marketplace", description = "User listings for second-hand items"),
        (name = "Admin", description = "Back office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
