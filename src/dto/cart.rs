use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub product_id: String,
    /// Zero or less removes the line.
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: i64,
    pub shipping: i64,
    pub total: i64,
}
