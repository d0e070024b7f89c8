use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::{
    db::{generate_id, is_unique_violation},
    dto::wishlist::{WishlistAddOutcome, WishlistLine, WishlistView},
    entity::{
        wishlist_items::{ActiveModel as WishlistItemActive, Column as WishlistItemCol, Entity as WishlistItems},
        wishlists::{ActiveModel as WishlistActive, Column as WishlistCol, Entity as Wishlists, Model as WishlistModel},
    },
    error::{AppError, AppResult},
    services::{cart_service, catalog_service},
    state::AppState,
};

async fn find_wishlist(db: &DatabaseConnection, user_id: &str) -> AppResult<Option<WishlistModel>> {
    let wishlist = Wishlists::find()
        .filter(WishlistCol::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(wishlist)
}

pub async fn get_or_create_wishlist(
    db: &DatabaseConnection,
    user_id: &str,
) -> AppResult<WishlistModel> {
    if let Some(wishlist) = find_wishlist(db, user_id).await? {
        return Ok(wishlist);
    }

    let active = WishlistActive {
        id: Set(generate_id("wl", 12)),
        user_id: Set(user_id.to_string()),
        created_at: Set(Utc::now().into()),
    };
    match active.insert(db).await {
        Ok(wishlist) => Ok(wishlist),
        Err(err) if is_unique_violation(&err) => find_wishlist(db, user_id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("wishlist vanished after duplicate insert"))
        }),
        Err(err) => Err(err.into()),
    }
}

pub async fn get_wishlist(state: &AppState, user_id: &str) -> AppResult<WishlistView> {
    let db = &state.orm;
    let wishlist = get_or_create_wishlist(db, user_id).await?;

    let rows = WishlistItems::find()
        .filter(WishlistItemCol::WishlistId.eq(wishlist.id.as_str()))
        .order_by_desc(WishlistItemCol::AddedAt)
        .all(db)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(product) = catalog_service::find_product(db, &row.product_id).await? else {
            tracing::warn!(product_id = %row.product_id, "wishlist entry references a missing product");
            continue;
        };
        items.push(WishlistLine {
            image: product.primary_image(),
            product_id: row.product_id,
            name: product.name,
            price: product.price,
            stock: product.stock,
            added_at: row.added_at.with_timezone(&Utc),
        });
    }

    Ok(WishlistView { items })
}

pub async fn add_item(
    state: &AppState,
    user_id: &str,
    product_id: &str,
) -> AppResult<WishlistAddOutcome> {
    let db = &state.orm;
    catalog_service::get_product(db, product_id).await?;

    let wishlist = get_or_create_wishlist(db, user_id).await?;
    let existing = WishlistItems::find()
        .filter(WishlistItemCol::WishlistId.eq(wishlist.id.as_str()))
        .filter(WishlistItemCol::ProductId.eq(product_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(WishlistAddOutcome::AlreadyPresent);
    }

    let active = WishlistItemActive {
        id: Set(generate_id("wi", 16)),
        wishlist_id: Set(wishlist.id),
        product_id: Set(product_id.to_string()),
        added_at: Set(Utc::now().into()),
    };
    match active.insert(db).await {
        Ok(_) => {
            tracing::info!(user_id, product_id, "added to wishlist");
            Ok(WishlistAddOutcome::Added)
        }
        Err(err) if is_unique_violation(&err) => Ok(WishlistAddOutcome::AlreadyPresent),
        Err(err) => Err(err.into()),
    }
}

/// Removes one entry. Returns whether anything was deleted.
pub async fn remove_item(state: &AppState, user_id: &str, product_id: &str) -> AppResult<bool> {
    let db = &state.orm;
    let Some(wishlist) = find_wishlist(db, user_id).await? else {
        return Ok(false);
    };
    let result = WishlistItems::delete_many()
        .filter(WishlistItemCol::WishlistId.eq(wishlist.id.as_str()))
        .filter(WishlistItemCol::ProductId.eq(product_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Advisory lookup: store failures read as "not in wishlist".
pub async fn is_in_wishlist(state: &AppState, user_id: &str, product_id: &str) -> bool {
    match lookup_membership(&state.orm, user_id, product_id).await {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(error = %err, user_id, product_id, "wishlist check failed");
            false
        }
    }
}

async fn lookup_membership(
    db: &DatabaseConnection,
    user_id: &str,
    product_id: &str,
) -> AppResult<bool> {
    let Some(wishlist) = find_wishlist(db, user_id).await? else {
        return Ok(false);
    };
    let found = WishlistItems::find()
        .filter(WishlistItemCol::WishlistId.eq(wishlist.id.as_str()))
        .filter(WishlistItemCol::ProductId.eq(product_id))
        .one(db)
        .await?;
    Ok(found.is_some())
}

/// Advisory count: store failures read as zero.
pub async fn count_items(state: &AppState, user_id: &str) -> u64 {
    match lookup_count(&state.orm, user_id).await {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(error = %err, user_id, "wishlist count failed");
            0
        }
    }
}

async fn lookup_count(db: &DatabaseConnection, user_id: &str) -> AppResult<u64> {
    let Some(wishlist) = find_wishlist(db, user_id).await? else {
        return Ok(0);
    };
    let count = WishlistItems::find()
        .filter(WishlistItemCol::WishlistId.eq(wishlist.id.as_str()))
        .count(db)
        .await?;
    Ok(count)
}

/// Cart add runs first; the wishlist entry is only removed once it succeeded.
pub async fn move_to_cart(state: &AppState, user_id: &str, product_id: &str) -> AppResult<()> {
    cart_service::add_item(state, user_id, product_id, 1).await?;
    remove_item(state, user_id, product_id).await?;
    tracing::info!(user_id, product_id, "moved wishlist entry to cart");
    Ok(())
}

/// Wishlist add runs first; the cart line is only removed once it succeeded.
pub async fn move_to_wishlist(state: &AppState, user_id: &str, product_id: &str) -> AppResult<()> {
    add_item(state, user_id, product_id).await?;
    cart_service::remove_item(state, user_id, product_id).await?;
    tracing::info!(user_id, product_id, "moved cart line to wishlist");
    Ok(())
}
