mod common;

use std::time::Duration;

use common::{SHIPPING_FEE, address, create_product, create_user, set_product, setup_state, stock_of};
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
use storefront_core::{
    dto::orders::{CreateOrderRequest, UpdateOrderRequest},
    entity::Orders,
    error::AppError,
    models::Role,
    services::{admin_service, cart_service, order_service},
};

fn request() -> CreateOrderRequest {
    CreateOrderRequest {
        shipping_address: address(),
    }
}

// Integration flow: user fills the cart -> places the order; stock moves and the cart empties.
#[tokio::test]
async fn order_from_cart_decrements_stock_and_empties_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_widget", "Test Widget", 1000, 10).await?;

    cart_service::add_item(&state, &user.user_id, "prod_widget", 2).await?;
    let created = order_service::create_order(&state, &user.user_id, request()).await?;

    assert!(created.order_id.starts_with("order_"));
    assert_eq!(created.total, 2000 + SHIPPING_FEE);
    assert_eq!(stock_of(&state, "prod_widget").await?, 8);

    let cart = cart_service::get_cart(&state, &user.user_id).await?;
    assert!(cart.items.is_empty());

    let order = order_service::get_order(&state, &user, &created.order_id).await?;
    assert_eq!(order.order.status, "pending");
    assert_eq!(order.order.payment_status, "pending");
    assert_eq!(order.order.subtotal, 2000);
    assert_eq!(order.order.shipping, SHIPPING_FEE);
    assert_eq!(order.order.shipping_address, address());
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].name, "Test Widget");
    assert_eq!(order.items[0].quantity, 2);
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_be_ordered() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;

    let err = order_service::create_order(&state, &user.user_id, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    create_product(&state, "prod_widget", "Test Widget", 1000, 10).await?;
    cart_service::add_item(&state, &user.user_id, "prod_widget", 1).await?;
    cart_service::clear_cart(&state, &user.user_id).await?;
    let err = order_service::create_order(&state, &user.user_id, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_leaves_no_trace() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 250, 10).await?;
    create_product(&state, "prod_lamp", "Lamp", 1000, 5).await?;

    cart_service::add_item(&state, &user.user_id, "prod_mug", 2).await?;
    cart_service::add_item(&state, &user.user_id, "prod_lamp", 5).await?;
    // Someone else bought lamps after they went into the cart.
    set_product(&state, "prod_lamp", 1000, 3).await?;

    let err = order_service::create_order(&state, &user.user_id, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(name) if name == "Lamp"));

    assert_eq!(Orders::find().count(&state.orm).await?, 0);
    assert_eq!(stock_of(&state, "prod_mug").await?, 10);
    assert_eq!(stock_of(&state, "prod_lamp").await?, 3);
    let cart = cart_service::get_cart(&state, &user.user_id).await?;
    assert_eq!(cart.items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn blank_address_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 250, 10).await?;
    cart_service::add_item(&state, &user.user_id, "prod_mug", 1).await?;

    let mut req = request();
    req.shipping_address.pincode = String::new();
    let err = order_service::create_order(&state, &user.user_id, req)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock_of(&state, "prod_mug").await?, 10);
    Ok(())
}

#[tokio::test]
async fn order_keeps_its_price_snapshot() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 250, 10).await?;

    cart_service::add_item(&state, &user.user_id, "prod_mug", 2).await?;
    let created = order_service::create_order(&state, &user.user_id, request()).await?;

    set_product(&state, "prod_mug", 999, 8).await?;
    let order = order_service::get_order(&state, &user, &created.order_id).await?;
    assert_eq!(order.items[0].price, 250);
    assert_eq!(order.order.subtotal, 500);
    assert_eq!(order.order.total, order.order.subtotal + order.order.shipping);
    Ok(())
}

#[tokio::test]
async fn orders_are_visible_to_owner_and_admin_only() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = create_user(&state, Role::Customer, "ana@example.com").await?;
    let other = create_user(&state, Role::Customer, "ben@example.com").await?;
    let admin = create_user(&state, Role::Admin, "admin@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 250, 10).await?;

    cart_service::add_item(&state, &owner.user_id, "prod_mug", 1).await?;
    let created = order_service::create_order(&state, &owner.user_id, request()).await?;

    let err = order_service::get_order(&state, &other, &created.order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let seen_by_admin = order_service::get_order(&state, &admin, &created.order_id).await?;
    assert_eq!(seen_by_admin.order.user_id, owner.user_id);

    let err = order_service::get_order(&state, &owner, "order_missing")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn listing_is_newest_first_and_per_user() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    let other = create_user(&state, Role::Customer, "ben@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 250, 10).await?;

    cart_service::add_item(&state, &user.user_id, "prod_mug", 1).await?;
    let first = order_service::create_order(&state, &user.user_id, request()).await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    cart_service::add_item(&state, &user.user_id, "prod_mug", 1).await?;
    let second = order_service::create_order(&state, &user.user_id, request()).await?;

    let orders = order_service::list_orders(&state, &user.user_id).await?;
    let ids: Vec<_> = orders.iter().map(|o| o.order_id.clone()).collect();
    assert_eq!(ids, vec![second.order_id, first.order_id]);
    assert!(order_service::list_orders(&state, &other.user_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_orders_never_oversell() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let ana = create_user(&state, Role::Customer, "ana@example.com").await?;
    let ben = create_user(&state, Role::Customer, "ben@example.com").await?;
    create_product(&state, "prod_last", "Last One", 500, 1).await?;

    cart_service::add_item(&state, &ana.user_id, "prod_last", 1).await?;
    cart_service::add_item(&state, &ben.user_id, "prod_last", 1).await?;

    let (a, b) = tokio::join!(
        order_service::create_order(&state, &ana.user_id, request()),
        order_service::create_order(&state, &ben.user_id, request()),
    );

    let successes = [a.is_ok(), b.is_ok()].into_iter().filter(|ok| *ok).count();
    assert_eq!(successes, 1);
    for result in [a, b] {
        if let Err(err) = result {
            assert!(matches!(
                err,
                AppError::InsufficientStock(_) | AppError::Conflict(_)
            ));
        }
    }
    assert_eq!(stock_of(&state, "prod_last").await?, 0);

    let pending = admin_service::list_all_orders(&state, Some("pending")).await?;
    assert_eq!(pending.len(), 1);
    Ok(())
}

#[tokio::test]
async fn stock_lost_mid_order_restores_earlier_lines() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 1000, 10).await?;
    create_product(&state, "prod_lamp", "Lamp", 4999, 5).await?;

    cart_service::add_item(&state, &user.user_id, "prod_mug", 3).await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    cart_service::add_item(&state, &user.user_id, "prod_lamp", 2).await?;

    // Another buyer drains the lamp between validation and its decrement.
    state
        .orm
        .execute_unprepared(
            "CREATE TRIGGER drain_lamp AFTER INSERT ON order_items \
             WHEN NEW.product_id = 'prod_mug' \
             BEGIN UPDATE products SET stock = 0 WHERE product_id = 'prod_lamp'; END;",
        )
        .await?;

    let err = order_service::create_order(&state, &user.user_id, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(stock_of(&state, "prod_mug").await?, 10);
    assert_eq!(stock_of(&state, "prod_lamp").await?, 0);

    let orders = Orders::find().all(&state.orm).await?;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, "cancelled");

    let cart = cart_service::get_cart(&state, &user.user_id).await?;
    assert_eq!(cart.items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn admin_updates_drive_tracking() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 250, 10).await?;
    cart_service::add_item(&state, &user.user_id, "prod_mug", 1).await?;
    let created = order_service::create_order(&state, &user.user_id, request()).await?;

    let info = order_service::tracking_info(&state, &created.order_id).await?;
    assert_eq!(info.status, "pending");
    assert!(info.tracking_url.is_none());

    let updated = admin_service::update_order(
        &state,
        &created.order_id,
        UpdateOrderRequest {
            status: Some("Shipped".into()),
            tracking_number: Some("DL123".into()),
            tracking_provider: Some("Delhivery".into()),
        },
    )
    .await?;
    assert_eq!(updated.order.status, "shipped");

    let info = order_service::tracking_info(&state, &created.order_id).await?;
    assert_eq!(info.tracking_number.as_deref(), Some("DL123"));
    assert_eq!(
        info.tracking_url.as_deref(),
        Some("https://www.delhivery.com/track/package/DL123")
    );

    admin_service::update_order(
        &state,
        &created.order_id,
        UpdateOrderRequest {
            tracking_provider: Some("pigeon-post".into()),
            ..Default::default()
        },
    )
    .await?;
    let info = order_service::tracking_info(&state, &created.order_id).await?;
    assert!(info.tracking_url.is_none());
    Ok(())
}

#[tokio::test]
async fn admin_update_validates_input() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 250, 10).await?;
    cart_service::add_item(&state, &user.user_id, "prod_mug", 1).await?;
    let created = order_service::create_order(&state, &user.user_id, request()).await?;

    let err = admin_service::update_order(&state, &created.order_id, UpdateOrderRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = admin_service::update_order(
        &state,
        &created.order_id,
        UpdateOrderRequest {
            status: Some("teleported".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = admin_service::update_order(
        &state,
        "order_missing",
        UpdateOrderRequest {
            status: Some("confirmed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = order_service::tracking_info(&state, "order_missing")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn admin_listing_filters_by_status() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::Customer, "ana@example.com").await?;
    create_product(&state, "prod_mug", "Mug", 250, 10).await?;

    cart_service::add_item(&state, &user.user_id, "prod_mug", 1).await?;
    let first = order_service::create_order(&state, &user.user_id, request()).await?;
    cart_service::add_item(&state, &user.user_id, "prod_mug", 2).await?;
    order_service::create_order(&state, &user.user_id, request()).await?;

    admin_service::update_order(
        &state,
        &first.order_id,
        UpdateOrderRequest {
            status: Some("confirmed".into()),
            ..Default::default()
        },
    )
    .await?;

    let all = admin_service::list_all_orders(&state, None).await?;
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|o| !o.items.is_empty()));

    let confirmed = admin_service::list_all_orders(&state, Some("confirmed")).await?;
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].order.order_id, first.order_id);

    let err = admin_service::list_all_orders(&state, Some("bogus"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}
