use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Role;

/// Claims read from the bearer token before the issuer has vouched for it.
/// Only convenience fields live here; none of them grant authority.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub role: Role,
}
