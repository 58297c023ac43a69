use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{post, put},
};

use crate::{
    dto::{cart::CartView, checkout::ShippingRequest, orders::OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shipping", put(set_shipping))
        .route("/review", post(review))
        .route("/confirm", post(confirm))
}

#[utoipa::path(
    put,
    path = "/api/checkout/shipping",
    request_body = ShippingRequest,
    responses(
        (status = 200, description = "Shipping information collected", body = ApiResponse<CartView>),
        (status = 400, description = "Empty cart or missing field"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn set_shipping(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ShippingRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = checkout_service::set_shipping(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/review",
    responses(
        (status = 200, description = "Priced order ready to confirm", body = ApiResponse<CartView>),
        (status = 400, description = "Shipping information missing"),
        (status = 422, description = "Applied promotion is no longer valid"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn review(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = checkout_service::review(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/confirm",
    responses(
        (status = 201, description = "Order persisted and cart cleared", body = ApiResponse<OrderWithItems>),
        (status = 409, description = "Not reviewed, out of stock or promotion exhausted"),
        (status = 422, description = "Applied promotion is no longer valid"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn confirm(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = checkout_service::confirm(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
