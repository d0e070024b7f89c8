use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    db::generate_id,
    dto::orders::{CreateOrderRequest, OrderCreated, OrderWithItems, TrackingInfo},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress},
    services::{cart_service, catalog_service},
    state::AppState,
};

/// Carriers whose public tracking pages we can link to.
const KNOWN_CARRIERS: [(&str, &str); 2] = [
    ("delhivery", "https://www.delhivery.com/track/package/"),
    ("bluedart", "https://www.bluedart.com/tracking/"),
];

struct PendingItem {
    product_id: String,
    name: String,
    price: i64,
    image: String,
    quantity: i32,
}

/// Turn the caller's cart into an order.
///
/// Steps run as independent writes: header, then per line the item snapshot
/// and a conditional stock decrement, then the ordered cart lines are
/// deleted. The decrement (`stock >= n`) is the authority on stock; the
/// validation pass before it only fails fast.
pub async fn create_order(
    state: &AppState,
    user_id: &str,
    payload: CreateOrderRequest,
) -> AppResult<OrderCreated> {
    validate_address(&payload.shipping_address)?;
    let db = &state.orm;

    let cart = cart_service::find_cart(db, user_id)
        .await?
        .ok_or(AppError::EmptyCart)?;
    let lines = cart_service::cart_lines(db, &cart.id).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let mut pending = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = catalog_service::find_product(db, &line.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", line.product_id)))?;
        if product.stock < line.quantity {
            return Err(AppError::InsufficientStock(product.name));
        }
        pending.push(PendingItem {
            image: product.primary_image(),
            product_id: product.product_id,
            name: product.name,
            price: product.price,
            quantity: line.quantity,
        });
    }

    let totals = cart_service::compute_totals(
        pending.iter().map(|item| (item.price, item.quantity)),
        state.shipping_fee,
    );
    let shipping_address = serde_json::to_string(&payload.shipping_address)
        .map_err(|e| AppError::Internal(e.into()))?;

    let now = Utc::now();
    let order = OrderActive {
        order_id: Set(generate_id("order", 10)),
        user_id: Set(user_id.to_string()),
        subtotal: Set(totals.subtotal),
        shipping: Set(totals.shipping),
        total: Set(totals.total),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        shipping_address: Set(shipping_address),
        tracking_number: Set(None),
        tracking_provider: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;

    let mut decremented: Vec<(String, i32)> = Vec::with_capacity(pending.len());
    for item in &pending {
        OrderItemActive {
            id: Set(generate_id("oi", 16)),
            order_id: Set(order.order_id.clone()),
            product_id: Set(item.product_id.clone()),
            name: Set(item.name.clone()),
            price: Set(item.price),
            image: Set(item.image.clone()),
            quantity: Set(item.quantity),
            created_at: Set(now.into()),
        }
        .insert(db)
        .await?;

        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .filter(ProdCol::ProductId.eq(item.product_id.as_str()))
            .filter(ProdCol::Stock.gte(item.quantity))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            tracing::warn!(
                order_id = %order.order_id,
                product_id = %item.product_id,
                "stock taken by a concurrent order, rolling back"
            );
            release_order(db, &order.order_id, &decremented).await?;
            return Err(AppError::Conflict(format!(
                "Stock for {} changed while placing the order, please retry",
                item.name
            )));
        }
        decremented.push((item.product_id.clone(), item.quantity));
    }

    let ordered_lines: Vec<String> = lines.into_iter().map(|line| line.id).collect();
    CartItems::delete_many()
        .filter(CartItemCol::Id.is_in(ordered_lines))
        .exec(db)
        .await?;

    tracing::info!(order_id = %order.order_id, user_id, total = order.total, "order created");
    Ok(OrderCreated {
        order_id: order.order_id,
        total: order.total,
    })
}

/// Return stock already taken by an order that could not complete and mark
/// the order cancelled.
async fn release_order(
    db: &DatabaseConnection,
    order_id: &str,
    decremented: &[(String, i32)],
) -> AppResult<()> {
    for (product_id, quantity) in decremented {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(*quantity))
            .filter(ProdCol::ProductId.eq(product_id.as_str()))
            .exec(db)
            .await?;
    }
    Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Cancelled.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(OrderCol::OrderId.eq(order_id))
        .exec(db)
        .await?;
    Ok(())
}

fn validate_address(address: &ShippingAddress) -> AppResult<()> {
    let required = [
        ("full_name", &address.full_name),
        ("phone", &address.phone),
        ("address_line1", &address.address_line1),
        ("city", &address.city),
        ("state", &address.state),
        ("pincode", &address.pincode),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(AppError::BadRequest(format!(
            "shipping_address.{field} is required"
        )));
    }
    Ok(())
}

pub async fn list_orders(state: &AppState, user_id: &str) -> AppResult<Vec<Order>> {
    Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect()
}

/// Owner or admin only. Absent orders are NotFound, foreign ones Forbidden.
pub async fn get_order(state: &AppState, user: &AuthUser, order_id: &str) -> AppResult<OrderWithItems> {
    let order = Orders::find_by_id(order_id.to_string())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if order.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden("Access denied".into()));
    }

    let items = order_items(&state.orm, &order.order_id).await?;
    Ok(OrderWithItems {
        order: order_from_entity(order)?,
        items,
    })
}

pub async fn order_items(db: &DatabaseConnection, order_id: &str) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();
    Ok(items)
}

pub async fn tracking_info(state: &AppState, order_id: &str) -> AppResult<TrackingInfo> {
    let order = Orders::find_by_id(order_id.to_string())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    let tracking_url = match (&order.tracking_provider, &order.tracking_number) {
        (Some(provider), Some(number)) => tracking_url(provider, number),
        _ => None,
    };
    Ok(TrackingInfo {
        order_id: order.order_id,
        status: order.status,
        tracking_number: order.tracking_number,
        tracking_provider: order.tracking_provider,
        tracking_url,
    })
}

pub fn tracking_url(provider: &str, tracking_number: &str) -> Option<String> {
    if tracking_number.is_empty() {
        return None;
    }
    let provider = provider.trim().to_ascii_lowercase();
    KNOWN_CARRIERS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, base)| format!("{base}{tracking_number}"))
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let shipping_address = serde_json::from_str(&model.shipping_address)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("order {}: bad address snapshot: {e}", model.order_id)))?;
    Ok(Order {
        order_id: model.order_id,
        user_id: model.user_id,
        subtotal: model.subtotal,
        shipping: model.shipping,
        total: model.total,
        status: model.status,
        payment_status: model.payment_status,
        shipping_address,
        tracking_number: model.tracking_number,
        tracking_provider: model.tracking_provider,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        product_id: model.product_id,
        name: model.name,
        price: model.price,
        image: model.image,
        quantity: model.quantity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ana Lima".into(),
            phone: "9999999999".into(),
            address_line1: "12 MG Road".into(),
            address_line2: None,
            city: "Pune".into(),
            state: "MH".into(),
            pincode: "411001".into(),
        }
    }

    #[test]
    fn tracking_url_matches_known_carriers_case_insensitively() {
        assert_eq!(
            tracking_url("Delhivery", "DL123").as_deref(),
            Some("https://www.delhivery.com/track/package/DL123")
        );
        assert_eq!(
            tracking_url("BLUEDART", "BD9").as_deref(),
            Some("https://www.bluedart.com/tracking/BD9")
        );
    }

    #[test]
    fn unknown_carrier_has_no_url() {
        assert_eq!(tracking_url("pigeon-post", "X1"), None);
        assert_eq!(tracking_url("delhivery", ""), None);
    }

    #[test]
    fn address_requires_core_fields() {
        assert!(validate_address(&address()).is_ok());

        let mut missing_city = address();
        missing_city.city = "  ".into();
        let err = validate_address(&missing_city).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("city")));
    }
}
