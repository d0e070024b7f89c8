use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdminOrderQuery {
    /// One of pending, confirmed, shipped, delivered, cancelled.
    pub status: Option<String>,
}
