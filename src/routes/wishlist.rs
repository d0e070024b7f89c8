use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};

use crate::{
    dto::wishlist::{AddWishlistRequest, WishlistAddOutcome, WishlistCheck, WishlistCount, WishlistView},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    response::{ApiResponse, Meta},
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wishlist))
        .route("/add", post(add_to_wishlist))
        .route("/count", get(wishlist_count))
        .route("/check/{product_id}", get(check_wishlist))
        .route("/{product_id}", delete(remove_from_wishlist))
        .route("/{product_id}/move-to-cart", post(move_to_cart))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses(
        (status = 200, description = "Wishlist entries, newest first", body = ApiResponse<WishlistView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let wishlist = wishlist_service::get_wishlist(&state, &user.user_id).await?;
    let meta = Meta::new(wishlist.items.len() as i64);
    Ok(Json(ApiResponse::success("OK", wishlist, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/add",
    request_body = AddWishlistRequest,
    responses(
        (status = 200, description = "Added, or already present", body = ApiResponse<WishlistAddOutcome>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AddWishlistRequest>,
) -> AppResult<Json<ApiResponse<WishlistAddOutcome>>> {
    let outcome = wishlist_service::add_item(&state, &user.user_id, &payload.product_id).await?;
    let message = match outcome {
        WishlistAddOutcome::Added => "Added to wishlist successfully",
        WishlistAddOutcome::AlreadyPresent => "Already in wishlist",
    };
    Ok(Json(ApiResponse::success(message, outcome, None)))
}

#[utoipa::path(
    get,
    path = "/api/wishlist/count",
    responses(
        (status = 200, description = "Number of wishlist entries", body = ApiResponse<WishlistCount>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn wishlist_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> Json<ApiResponse<WishlistCount>> {
    let count = wishlist_service::count_items(&state, &user.user_id).await;
    Json(ApiResponse::success("OK", WishlistCount { count }, None))
}

#[utoipa::path(
    get,
    path = "/api/wishlist/check/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Whether the product is wishlisted", body = ApiResponse<WishlistCheck>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn check_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> Json<ApiResponse<WishlistCheck>> {
    let in_wishlist = wishlist_service::is_in_wishlist(&state, &user.user_id, &product_id).await;
    Json(ApiResponse::success("OK", WishlistCheck { in_wishlist }, None))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Entry removed, or was never there", body = ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    wishlist_service::remove_item(&state, &user.user_id, &product_id).await?;
    Ok(Json(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/{product_id}/move-to-cart",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Entry moved to the cart", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not enough stock, the entry stays"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn move_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    wishlist_service::move_to_cart(&state, &user.user_id, &product_id).await?;
    Ok(Json(ApiResponse::success(
        "Moved to cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
