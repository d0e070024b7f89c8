use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateCartRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    response::{ApiResponse, Meta},
    services::{cart_service, wishlist_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_to_cart))
        .route("/update", put(update_cart))
        .route("/clear", delete(clear_cart))
        .route("/{product_id}/move-to-wishlist", post(move_to_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with live prices and totals", body = ApiResponse<CartView>),
        (status = 401, description = "Missing or rejected token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = cart_service::get_cart(&state, &user.user_id).await?;
    let meta = Meta::new(cart.items.len() as i64);
    Ok(Json(ApiResponse::success("OK", cart, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added or merged", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid quantity or not enough stock"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Cart changed concurrently")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    cart_service::add_item(&state, &user.user_id, &payload.product_id, payload.quantity).await?;
    Ok(Json(ApiResponse::success(
        "Added to cart successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    put,
    path = "/api/cart/update",
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity set, zero removes the line", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not enough stock"),
        (status = 404, description = "Cart or line not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateCartRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    cart_service::update_item(&state, &user.user_id, &payload.product_id, payload.quantity).await?;
    Ok(Json(ApiResponse::success(
        "Cart updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/cart/clear",
    responses(
        (status = 200, description = "All lines removed", body = ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    cart_service::clear_cart(&state, &user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/cart/{product_id}/move-to-wishlist",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Line moved to the wishlist", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn move_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    wishlist_service::move_to_wishlist(&state, &user.user_id, &product_id).await?;
    Ok(Json(ApiResponse::success(
        "Moved to wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
