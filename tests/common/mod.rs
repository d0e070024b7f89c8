#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_core::{
    db::{create_orm_conn, generate_id, run_migrations},
    entity::{products::ActiveModel as ProductActive, products::Entity as Products, users::ActiveModel as UserActive},
    middleware::auth::AuthUser,
    models::{Role, ShippingAddress},
    services::identity_service::TokenVerifier,
    state::AppState,
};

pub const SHIPPING_FEE: i64 = 100;

/// Issuer stand-in with a fixed verdict.
pub struct StaticVerifier {
    pub accept: bool,
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, _token: &str) -> bool {
        self.accept
    }
}

pub async fn setup_state() -> anyhow::Result<AppState> {
    setup_state_with(true).await
}

pub async fn setup_state_with(accept_tokens: bool) -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:").await?;
    run_migrations(&orm).await?;
    Ok(AppState {
        orm,
        verifier: Arc::new(StaticVerifier {
            accept: accept_tokens,
        }),
        shipping_fee: SHIPPING_FEE,
    })
}

pub async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let user_id = generate_id("user", 12);
    UserActive {
        user_id: Set(user_id.clone()),
        email: Set(email.to_string()),
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        picture: Set(None),
        role: Set(role.as_str().to_string()),
        external_subject: Set(format!("ext-{user_id}")),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id,
        email: email.to_string(),
        role,
    })
}

pub async fn create_product(
    state: &AppState,
    product_id: &str,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<()> {
    ProductActive {
        product_id: Set(product_id.to_string()),
        name: Set(name.to_string()),
        description: Set(format!("{name} for testing")),
        price: Set(price),
        stock: Set(stock),
        images: Set(format!(r#"["https://img.example.com/{product_id}.jpg"]"#)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

pub async fn set_product(state: &AppState, product_id: &str, price: i64, stock: i32) -> anyhow::Result<()> {
    let product = Products::find_by_id(product_id.to_string())
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no product {product_id}"))?;
    let mut active: ProductActive = product.into();
    active.price = Set(price);
    active.stock = Set(stock);
    active.update(&state.orm).await?;
    Ok(())
}

pub async fn stock_of(state: &AppState, product_id: &str) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id.to_string())
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no product {product_id}"))?;
    Ok(product.stock)
}

pub fn mint_token(claims: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"held-by-the-issuer"),
    )
    .expect("token encodes")
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ana Lima".into(),
        phone: "9999999999".into(),
        address_line1: "12 MG Road".into(),
        address_line2: Some("Flat 4".into()),
        city: "Pune".into(),
        state: "MH".into(),
        pincode: "411001".into(),
    }
}
