use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::identity_service::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub verifier: Arc<dyn TokenVerifier>,
    pub shipping_fee: i64,
}
