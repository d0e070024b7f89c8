use std::sync::OnceLock;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("Stock limit exceeded")]
    StockLimitExceeded,

    /// Lost a race on a conditional write; nothing was applied for this step.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::EmptyCart
            | AppError::InsufficientStock(_)
            | AppError::StockLimitExceeded => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

static HIDE_INTERNAL_DETAILS: OnceLock<bool> = OnceLock::new();

/// Called once at startup; production hides the cause of 500 responses.
pub fn init_error_reporting(production: bool) {
    if HIDE_INTERNAL_DETAILS.set(production).is_err() {
        tracing::warn!("error reporting was already initialised");
    }
}

impl AppError {
    /// Client-facing message. Server faults collapse to a generic line when hidden.
    fn public_message(&self, hide_internal: bool) -> String {
        if hide_internal && self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "unhandled error");
        }
        let hide_internal = HIDE_INTERNAL_DETAILS.get().copied().unwrap_or(false);
        let message = self.public_message(hide_internal);

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_failures_map_to_bad_request() {
        assert_eq!(AppError::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InsufficientStock("Lamp".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::StockLimitExceeded.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_failures_are_distinguished() {
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("Access denied".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::Conflict("raced".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn hidden_mode_masks_only_server_faults() {
        let db = AppError::OrmError(sea_orm::DbErr::Custom("connection refused".into()));
        assert_eq!(db.public_message(true), "Internal server error");
        assert!(db.public_message(false).contains("connection refused"));

        let stock = AppError::InsufficientStock("Lamp".into());
        assert_eq!(stock.public_message(true), "Insufficient stock for Lamp");
        assert_eq!(
            AppError::NotFound("Order not found".into()).public_message(true),
            "Order not found"
        );
    }
}
