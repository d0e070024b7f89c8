use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};

use crate::{
    dto::orders::{AdminOrderList, OrderWithItems, UpdateOrderRequest},
    error::AppResult,
    middleware::{auth::AdminUser, json::AppJson},
    response::{ApiResponse, Meta},
    routes::params::AdminOrderQuery,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{order_id}", put(update_order))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "All orders with items (admin only)", body = ApiResponse<AdminOrderList>),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<AdminOrderQuery>,
) -> AppResult<Json<ApiResponse<AdminOrderList>>> {
    let items = admin_service::list_all_orders(&state, query.status.as_deref()).await?;
    let meta = Meta::new(items.len() as i64);
    Ok(Json(ApiResponse::success(
        "Orders",
        AdminOrderList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{order_id}",
    params(
        ("order_id" = String, Path, description = "Order ID")
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order status or tracking updated", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Nothing to update or unknown status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<String>,
    AppJson(payload): AppJson<UpdateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let order = admin_service::update_order(&state, &order_id, payload).await?;
    tracing::debug!(admin_id = %admin.user_id, order_id, "admin order update");
    Ok(Json(ApiResponse::success("Order updated", order, None)))
}
