use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sea_orm::sea_query::Expr;
use storefront_core::{
    config::database_url_from_env,
    db::{create_orm_conn, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Entity as Products},
        users::{Column as UserCol, Entity as Users},
    },
    models::Role,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = database_url_from_env()?;
    let orm = create_orm_conn(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_products(&orm).await?;
    if let Ok(email) = std::env::var("SEED_ADMIN_EMAIL") {
        promote_admin(&orm, &email).await?;
    }

    println!("Seed completed");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = [
        (
            "prod_headphones",
            "Sonic Pro X Headphones",
            "Premium wireless headphones with ANC and spatial audio.",
            24999,
            50,
            "https://images.unsplash.com/photo-1560718217-69193acc0713",
        ),
        (
            "prod_watch",
            "Horizon Smart Watch",
            "Advanced smartwatch with GPS and health tracking.",
            33199,
            30,
            "https://images.unsplash.com/photo-1733908511568-3abc819b21b5",
        ),
        (
            "prod_lamp",
            "Minimal Desk Lamp",
            "LED desk lamp with touch controls.",
            4999,
            75,
            "https://images.unsplash.com/photo-1507473885765-e6ed057f782c",
        ),
    ];

    for (product_id, name, description, price, stock, image) in products {
        if Products::find_by_id(product_id.to_string()).one(orm).await?.is_some() {
            println!("Product {product_id} already present");
            continue;
        }
        ProductActive {
            product_id: Set(product_id.to_string()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            price: Set(price),
            stock: Set(stock),
            images: Set(serde_json::to_string(&[image])?),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

/// Users are provisioned on first sign-in, so this only promotes an existing one.
async fn promote_admin(orm: &DatabaseConnection, email: &str) -> anyhow::Result<()> {
    let result = Users::update_many()
        .col_expr(UserCol::Role, Expr::value(Role::Admin.as_str()))
        .filter(UserCol::Email.eq(email))
        .exec(orm)
        .await?;
    if result.rows_affected == 0 {
        println!("No user with email {email} yet; sign in once, then re-run the seed");
    } else {
        println!("Ensured user {email} (role=admin)");
    }
    Ok(())
}
