use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::orders::TrackingInfo,
    error::AppResult,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{order_id}", get(get_tracking))
}

#[utoipa::path(
    get,
    path = "/api/tracking/{order_id}",
    params(
        ("order_id" = String, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Shipment status and carrier link", body = ApiResponse<TrackingInfo>),
        (status = 404, description = "Order not found")
    ),
    tag = "Tracking"
)]
pub async fn get_tracking(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<TrackingInfo>>> {
    let info = order_service::tracking_info(&state, &order_id).await?;
    Ok(Json(ApiResponse::success("OK", info, None)))
}
