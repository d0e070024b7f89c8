use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::auth::MeResponse,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::identity_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user profile", body = ApiResponse<MeResponse>),
        (status = 401, description = "Missing or rejected token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let profile = identity_service::user_profile(&state, &user.user_id).await?;
    Ok(Json(ApiResponse::success("OK", profile, None)))
}
