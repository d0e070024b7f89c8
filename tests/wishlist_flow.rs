mod common;

use std::time::Duration;

use common::{create_product, create_user, setup_state};
use storefront_core::{
    dto::wishlist::WishlistAddOutcome, error::AppError, models::Role,
    services::{cart_service, wishlist_service},
};

#[tokio::test]
async fn add_is_idempotent() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_lamp", "Lamp", 4999, 75).await?;

    let first = wishlist_service::add_item(&state, &user.user_id, "prod_lamp").await?;
    let second = wishlist_service::add_item(&state, &user.user_id, "prod_lamp").await?;
    assert_eq!(first, WishlistAddOutcome::Added);
    assert_eq!(second, WishlistAddOutcome::AlreadyPresent);

    assert_eq!(wishlist_service::count_items(&state, &user.user_id).await, 1);
    assert!(wishlist_service::is_in_wishlist(&state, &user.user_id, "prod_lamp").await);
    Ok(())
}

#[tokio::test]
async fn add_requires_existing_product() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;

    let err = wishlist_service::add_item(&state, &user.user_id, "prod_ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(wishlist_service::count_items(&state, &user.user_id).await, 0);
    Ok(())
}

#[tokio::test]
async fn listing_is_newest_first_with_live_product_data() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_lamp", "Lamp", 4999, 75).await?;
    create_product(&state, "prod_watch", "Watch", 33199, 30).await?;

    wishlist_service::add_item(&state, &user.user_id, "prod_lamp").await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    wishlist_service::add_item(&state, &user.user_id, "prod_watch").await?;

    let wishlist = wishlist_service::get_wishlist(&state, &user.user_id).await?;
    let ids: Vec<_> = wishlist.items.iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(ids, vec!["prod_watch", "prod_lamp"]);
    assert_eq!(wishlist.items[0].stock, 30);
    assert_eq!(wishlist.items[0].price, 33199);
    Ok(())
}

#[tokio::test]
async fn remove_reports_whether_anything_was_deleted() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_lamp", "Lamp", 4999, 75).await?;

    assert!(!wishlist_service::remove_item(&state, &user.user_id, "prod_lamp").await?);
    wishlist_service::add_item(&state, &user.user_id, "prod_lamp").await?;
    assert!(wishlist_service::remove_item(&state, &user.user_id, "prod_lamp").await?);
    assert!(!wishlist_service::is_in_wishlist(&state, &user.user_id, "prod_lamp").await);
    Ok(())
}

#[tokio::test]
async fn move_to_cart_moves_one_unit() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_lamp", "Lamp", 4999, 75).await?;

    wishlist_service::add_item(&state, &user.user_id, "prod_lamp").await?;
    wishlist_service::move_to_cart(&state, &user.user_id, "prod_lamp").await?;

    let cart = cart_service::get_cart(&state, &user.user_id).await?;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 1);
    assert!(!wishlist_service::is_in_wishlist(&state, &user.user_id, "prod_lamp").await);
    Ok(())
}

#[tokio::test]
async fn failed_move_to_cart_keeps_the_wishlist_entry() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_sold_out", "Sold Out Lamp", 4999, 0).await?;

    wishlist_service::add_item(&state, &user.user_id, "prod_sold_out").await?;
    let err = wishlist_service::move_to_cart(&state, &user.user_id, "prod_sold_out")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));

    assert!(wishlist_service::is_in_wishlist(&state, &user.user_id, "prod_sold_out").await);
    let cart = cart_service::get_cart(&state, &user.user_id).await?;
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn move_to_wishlist_takes_the_line_out_of_the_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_lamp", "Lamp", 4999, 75).await?;

    cart_service::add_item(&state, &user.user_id, "prod_lamp", 2).await?;
    wishlist_service::move_to_wishlist(&state, &user.user_id, "prod_lamp").await?;

    let cart = cart_service::get_cart(&state, &user.user_id).await?;
    assert!(cart.items.is_empty());
    assert!(wishlist_service::is_in_wishlist(&state, &user.user_id, "prod_lamp").await);
    Ok(())
}
