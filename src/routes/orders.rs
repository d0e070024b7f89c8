use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderCreated, OrderList, OrderWithItems},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    response::{ApiResponse, Meta},
    services::order_service,
    state::AppState,
};

pub fn route() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{order_id}", get(get_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let orders = order_service::list_orders(&state, &user.user_id).await?;
    let meta = Meta::new(orders.len() as i64);
    Ok(Json(ApiResponse::success(
        "OK",
        OrderList { items: orders },
        Some(meta),
    )))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed from the cart", body = ApiResponse<OrderCreated>),
        (status = 400, description = "Empty cart, bad address or not enough stock"),
        (status = 404, description = "A cart product no longer exists"),
        (status = 409, description = "Stock was taken by a concurrent order")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderCreated>>)> {
    let created = order_service::create_order(&state, &user.user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order created", created, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    params(
        ("order_id" = String, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with its line items", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Order belongs to someone else"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let order = order_service::get_order(&state, &user, &order_id).await?;
    Ok(Json(ApiResponse::success("OK", order, None)))
}
