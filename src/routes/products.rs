use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::products::ProductDetail,
    error::AppResult,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{product_id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Current price and stock", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let product = catalog_service::get_product(&state.orm, &product_id).await?;
    let detail = ProductDetail {
        in_stock: product.stock > 0,
        product,
    };
    Ok(Json(ApiResponse::success("OK", detail, None)))
}
