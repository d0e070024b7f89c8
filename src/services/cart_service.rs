use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    db::{generate_id, is_unique_violation},
    dto::cart::{CartLine, CartView},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems,
            Model as CartItemModel,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
    },
    error::{AppError, AppResult},
    services::catalog_service,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: i64,
    pub shipping: i64,
    pub total: i64,
}

/// Subtotal over `(price, quantity)` pairs; shipping applies only to a
/// non-empty basket.
pub fn compute_totals<I>(lines: I, shipping_fee: i64) -> Totals
where
    I: IntoIterator<Item = (i64, i32)>,
{
    let mut count = 0usize;
    let subtotal = lines
        .into_iter()
        .inspect(|_| count += 1)
        .map(|(price, quantity)| price * i64::from(quantity))
        .sum::<i64>();
    let shipping = if count > 0 { shipping_fee } else { 0 };
    Totals {
        subtotal,
        shipping,
        total: subtotal + shipping,
    }
}

pub async fn find_cart(db: &DatabaseConnection, user_id: &str) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(cart)
}

/// Idempotent: the unique key on `user_id` settles concurrent creators.
pub async fn get_or_create_cart(db: &DatabaseConnection, user_id: &str) -> AppResult<CartModel> {
    if let Some(cart) = find_cart(db, user_id).await? {
        return Ok(cart);
    }

    let active = CartActive {
        id: Set(generate_id("cart", 12)),
        user_id: Set(user_id.to_string()),
        created_at: Set(Utc::now().into()),
    };
    match active.insert(db).await {
        Ok(cart) => Ok(cart),
        Err(err) if is_unique_violation(&err) => find_cart(db, user_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart vanished after duplicate insert"))),
        Err(err) => Err(err.into()),
    }
}

pub async fn cart_lines(db: &DatabaseConnection, cart_id: &str) -> AppResult<Vec<CartItemModel>> {
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(db)
        .await?;
    Ok(lines)
}

async fn find_line(
    db: &DatabaseConnection,
    cart_id: &str,
    product_id: &str,
) -> AppResult<Option<CartItemModel>> {
    let line = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .one(db)
        .await?;
    Ok(line)
}

pub async fn get_cart(state: &AppState, user_id: &str) -> AppResult<CartView> {
    let db = &state.orm;
    let cart = get_or_create_cart(db, user_id).await?;

    let mut items = Vec::new();
    for line in cart_lines(db, &cart.id).await? {
        let Some(product) = catalog_service::find_product(db, &line.product_id).await? else {
            tracing::warn!(product_id = %line.product_id, "cart line references a missing product");
            continue;
        };
        items.push(CartLine {
            image: product.primary_image(),
            product_id: line.product_id,
            name: product.name,
            price: product.price,
            quantity: line.quantity,
        });
    }

    let totals = compute_totals(
        items.iter().map(|item| (item.price, item.quantity)),
        state.shipping_fee,
    );
    Ok(CartView {
        items,
        subtotal: totals.subtotal,
        shipping: totals.shipping,
        total: totals.total,
    })
}

pub async fn add_item(
    state: &AppState,
    user_id: &str,
    product_id: &str,
    quantity: i32,
) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }
    let db = &state.orm;

    let product = catalog_service::get_product(db, product_id).await?;
    if product.stock < quantity {
        return Err(AppError::InsufficientStock(product.name));
    }

    let cart = get_or_create_cart(db, user_id).await?;

    match find_line(db, &cart.id, product_id).await? {
        Some(line) => {
            let merged = line
                .quantity
                .checked_add(quantity)
                .ok_or(AppError::StockLimitExceeded)?;
            if merged > product.stock {
                return Err(AppError::StockLimitExceeded);
            }

            // Compare-and-set on the quantity we read, so two merges cannot
            // both build on the same stale value.
            let result = CartItems::update_many()
                .col_expr(CartItemCol::Quantity, Expr::value(merged))
                .filter(CartItemCol::Id.eq(line.id.as_str()))
                .filter(CartItemCol::Quantity.eq(line.quantity))
                .exec(db)
                .await?;
            if result.rows_affected == 0 {
                return Err(AppError::Conflict(
                    "Cart changed while adding the item, please retry".into(),
                ));
            }
        }
        None => {
            let active = CartItemActive {
                id: Set(generate_id("ci", 16)),
                cart_id: Set(cart.id.clone()),
                product_id: Set(product_id.to_string()),
                quantity: Set(quantity),
                created_at: Set(Utc::now().into()),
            };
            if let Err(err) = active.insert(db).await {
                if is_unique_violation(&err) {
                    return Err(AppError::Conflict(
                        "Cart changed while adding the item, please retry".into(),
                    ));
                }
                return Err(err.into());
            }
        }
    }

    tracing::info!(user_id, product_id, quantity, "added to cart");
    Ok(())
}

/// Sets a line's quantity; zero or less removes the line.
pub async fn update_item(
    state: &AppState,
    user_id: &str,
    product_id: &str,
    quantity: i32,
) -> AppResult<()> {
    let db = &state.orm;
    let cart = find_cart(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

    if quantity <= 0 {
        CartItems::delete_many()
            .filter(CartItemCol::CartId.eq(cart.id.as_str()))
            .filter(CartItemCol::ProductId.eq(product_id))
            .exec(db)
            .await?;
        return Ok(());
    }

    let product = catalog_service::get_product(db, product_id).await?;
    if quantity > product.stock {
        return Err(AppError::InsufficientStock(product.name));
    }

    let result = CartItems::update_many()
        .col_expr(CartItemCol::Quantity, Expr::value(quantity))
        .filter(CartItemCol::CartId.eq(cart.id.as_str()))
        .filter(CartItemCol::ProductId.eq(product_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Item not in cart".into()));
    }
    Ok(())
}

/// Removes one line. Returns whether anything was deleted.
pub async fn remove_item(state: &AppState, user_id: &str, product_id: &str) -> AppResult<bool> {
    let db = &state.orm;
    let Some(cart) = find_cart(db, user_id).await? else {
        return Ok(false);
    };
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id.as_str()))
        .filter(CartItemCol::ProductId.eq(product_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn clear_cart(state: &AppState, user_id: &str) -> AppResult<()> {
    let db = &state.orm;
    if let Some(cart) = find_cart(db, user_id).await? {
        CartItems::delete_many()
            .filter(CartItemCol::CartId.eq(cart.id.as_str()))
            .exec(db)
            .await?;
    }
    Ok(())
}
