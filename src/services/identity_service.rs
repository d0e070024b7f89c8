//! Bridges externally issued bearer tokens to local user records.
//!
//! A token is handled in two phases. Its payload is decoded locally, without
//! signature checks, to pick up the email and subject. Authority comes only
//! from the issuer: a [`TokenVerifier`] must confirm the token before any
//! local identity is resolved or provisioned. Every failure along the way is
//! reported as [`AppError::Unauthenticated`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::{
    db::{generate_id, is_unique_violation},
    dto::auth::{MeResponse, TokenClaims, UserMetadata},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::{Role, User},
    state::AppState,
};

/// Remote authority that vouches for a bearer token.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Returns true only when the issuer positively accepted the token.
    async fn verify(&self, token: &str) -> bool;
}

/// Verifies tokens against the issuer's `/auth/v1/user` endpoint.
pub struct RemoteTokenVerifier {
    client: reqwest::Client,
    verify_url: String,
    api_key: String,
}

impl RemoteTokenVerifier {
    pub fn new(issuer_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            verify_url: format!("{}/auth/v1/user", issuer_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl TokenVerifier for RemoteTokenVerifier {
    async fn verify(&self, token: &str) -> bool {
        let result = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => true,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "token rejected by issuer");
                false
            }
            Err(err) => {
                tracing::error!(error = %err, timeout = err.is_timeout(), "token verification request failed");
                false
            }
        }
    }
}

/// Resolve the caller behind `token`, provisioning a local user on first sight.
pub async fn resolve_user(state: &AppState, token: &str) -> AppResult<User> {
    let claims = decode_unverified_claims(token).ok_or(AppError::Unauthenticated)?;
    let (email, subject) = match (claims.email.as_deref(), claims.sub.as_deref()) {
        (Some(email), Some(sub)) if !email.is_empty() && !sub.is_empty() => (email, sub),
        _ => {
            tracing::debug!("token missing email or sub");
            return Err(AppError::Unauthenticated);
        }
    };

    if !state.verifier.verify(token).await {
        return Err(AppError::Unauthenticated);
    }

    let metadata = claims.user_metadata.clone().unwrap_or_default();
    let user = find_or_provision(&state.orm, email, subject, &metadata).await?;
    Ok(user_from_entity(user))
}

async fn find_or_provision(
    db: &DatabaseConnection,
    email: &str,
    subject: &str,
    metadata: &UserMetadata,
) -> AppResult<UserModel> {
    if let Some(user) = find_by_subject(db, subject).await? {
        return follow_email_change(db, user, email).await;
    }
    if let Some(user) = find_by_email(db, email).await? {
        return Ok(user);
    }

    let user_id = generate_id("user", 12);
    let active = UserActive {
        user_id: Set(user_id.clone()),
        email: Set(email.to_string()),
        name: Set(display_name(metadata, email)),
        picture: Set(metadata.avatar_url.clone().or_else(|| metadata.picture.clone())),
        role: Set(Role::Customer.as_str().to_string()),
        external_subject: Set(subject.to_string()),
        created_at: Set(Utc::now().into()),
    };

    match active.insert(db).await {
        Ok(user) => {
            tracing::info!(user_id = %user.user_id, "provisioned local user");
            Ok(user)
        }
        // Another request provisioned the same subject or email first.
        Err(err) if is_unique_violation(&err) => find_existing(db, subject, email).await,
        Err(err) => Err(err.into()),
    }
}

async fn find_existing(db: &DatabaseConnection, subject: &str, email: &str) -> AppResult<UserModel> {
    if let Some(user) = find_by_subject(db, subject).await? {
        return Ok(user);
    }
    find_by_email(db, email)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user vanished after duplicate insert")))
}

/// The issuer owns the email address; the local record follows it.
async fn follow_email_change(
    db: &DatabaseConnection,
    user: UserModel,
    email: &str,
) -> AppResult<UserModel> {
    if user.email == email {
        return Ok(user);
    }

    let user_id = user.user_id.clone();
    let mut active = user.into_active_model();
    active.email = Set(email.to_string());
    match active.update(db).await {
        Ok(user) => {
            tracing::info!(user_id = %user.user_id, "local user email updated from issuer");
            Ok(user)
        }
        Err(err) if is_unique_violation(&err) => {
            tracing::warn!(user_id = %user_id, "new email already belongs to another local user");
            Users::find_by_id(user_id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user vanished during email update")))
        }
        Err(err) => Err(err.into()),
    }
}

async fn find_by_subject(db: &DatabaseConnection, subject: &str) -> AppResult<Option<UserModel>> {
    let user = Users::find()
        .filter(UserCol::ExternalSubject.eq(subject))
        .one(db)
        .await?;
    Ok(user)
}

async fn find_by_email(db: &DatabaseConnection, email: &str) -> AppResult<Option<UserModel>> {
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(db)
        .await?;
    Ok(user)
}

pub async fn user_profile(state: &AppState, user_id: &str) -> AppResult<MeResponse> {
    let user = Users::find_by_id(user_id.to_string())
        .one(&state.orm)
        .await?
        .map(user_from_entity)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(MeResponse {
        user_id: user.user_id,
        email: user.email,
        name: user.name,
        picture: user.picture,
        role: user.role,
    })
}

/// Decode the JWT payload without checking its signature.
pub fn decode_unverified_claims(token: &str) -> Option<TokenClaims> {
    jsonwebtoken::decode_header(token).ok()?;
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Full name, then name, then the local part of the email.
pub fn display_name(metadata: &UserMetadata, email: &str) -> String {
    [metadata.full_name.as_deref(), metadata.name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        role: Role::from_db(&model.role),
        user_id: model.user_id,
        email: model.email,
        name: model.name,
        picture: model.picture,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
