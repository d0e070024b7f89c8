use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use crate::{
    error::AppError,
    models::{Role, User},
    services::identity_service,
    state::AppState,
};

/// Caller identity, resolved through the token issuer on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            role: user.role,
        }
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    Ok(())
}

pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_str = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthenticated)?
        .to_str()
        .map_err(|_| AppError::Unauthenticated)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AppError::Unauthenticated)?;
    if token.is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = identity_service::resolve_user(state, token).await?;
        Ok(user.into())
    }
}

/// Extractor that only admits admin callers.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_admin(&user)?;
        Ok(AdminUser(user))
    }
}
