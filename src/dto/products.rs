use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub in_stock: bool,
}
