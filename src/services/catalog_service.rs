use sea_orm::{ConnectionTrait, EntityTrait};

use crate::{
    entity::products::{Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    models::Product,
};

/// Fresh read of a product. Stock is contended, so callers must not reuse
/// an earlier result when deciding whether a mutation is allowed.
pub async fn find_product<C: ConnectionTrait>(db: &C, product_id: &str) -> AppResult<Option<Product>> {
    let product = Products::find_by_id(product_id.to_string()).one(db).await?;
    Ok(product.map(product_from_entity))
}

pub async fn get_product<C: ConnectionTrait>(db: &C, product_id: &str) -> AppResult<Product> {
    find_product(db, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        images: parse_images(&model.product_id, &model.images),
        product_id: model.product_id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
    }
}

fn parse_images(product_id: &str, raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(images) => images,
        Err(err) => {
            tracing::warn!(product_id, error = %err, "unreadable product images");
            Vec::new()
        }
    }
}
