use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem, ShippingAddress};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreated {
    pub order_id: String,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderList {
    pub items: Vec<OrderWithItems>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_provider: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingInfo {
    pub order_id: String,
    pub status: String,
    pub tracking_number: Option<String>,
    pub tracking_provider: Option<String>,
    pub tracking_url: Option<String>,
}
