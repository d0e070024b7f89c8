use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddWishlistRequest {
    pub product_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WishlistLine {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub stock: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WishlistView {
    pub items: Vec<WishlistLine>,
}

/// Adding is idempotent; a repeat add reports the existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WishlistAddOutcome {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistCheck {
    pub in_wishlist: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistCount {
    pub count: u64,
}
