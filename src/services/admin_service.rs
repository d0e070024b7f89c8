use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set};

use crate::{
    dto::orders::{OrderWithItems, UpdateOrderRequest},
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    models::OrderStatus,
    services::order_service::{order_from_entity, order_items},
    state::AppState,
};

/// Every order with its items, newest first, optionally narrowed to one status.
pub async fn list_all_orders(
    state: &AppState,
    status: Option<&str>,
) -> AppResult<Vec<OrderWithItems>> {
    let mut finder = Orders::find();
    if let Some(raw) = status.filter(|s| !s.trim().is_empty()) {
        let status = OrderStatus::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown order status: {raw}")))?;
        finder = finder.filter(OrderCol::Status.eq(status.as_str()));
    }

    let orders = finder
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let items = order_items(&state.orm, &order.order_id).await?;
        result.push(OrderWithItems {
            order: order_from_entity(order)?,
            items,
        });
    }
    Ok(result)
}

pub async fn update_order(
    state: &AppState,
    order_id: &str,
    payload: UpdateOrderRequest,
) -> AppResult<OrderWithItems> {
    let UpdateOrderRequest {
        status,
        tracking_number,
        tracking_provider,
    } = payload;
    if status.is_none() && tracking_number.is_none() && tracking_provider.is_none() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    let status = status
        .map(|raw| {
            OrderStatus::parse(&raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown order status: {raw}")))
        })
        .transpose()?;

    let order = Orders::find_by_id(order_id.to_string())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    let mut active = order.into_active_model();
    if let Some(status) = status {
        active.status = Set(status.as_str().to_string());
    }
    if let Some(number) = tracking_number {
        active.tracking_number = Set(Some(number.trim().to_string()).filter(|n| !n.is_empty()));
    }
    if let Some(provider) = tracking_provider {
        active.tracking_provider = Set(Some(provider.trim().to_ascii_lowercase()).filter(|p| !p.is_empty()));
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(order_id, status = %order.status, "order updated by admin");
    let items = order_items(&state.orm, &order.order_id).await?;
    Ok(OrderWithItems {
        order: order_from_entity(order)?,
        items,
    })
}
