// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<StoreError> for ApiError {
    /// Maps storage failures to HTTP statuses.
    ///
    /// Ownership mismatches are reported by the repositories as `NotFound`,
    /// so a resource that exists but belongs to someone else is
    /// indistinguishable from one that does not exist.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::not_found(format!("{entity} not found")),
            StoreError::AlreadyExists(message) => Self::conflict(message),
            StoreError::AlreadyShared => {
                Self::conflict("This credential is already shared with this user")
            }
            StoreError::RecipientWithoutKey => {
                Self::bad_request("Recipient has no registered public key")
            }
            StoreError::SelfShare => {
                Self::bad_request("Cannot share a credential with yourself")
            }
            other => {
                tracing::error!(error = %other, "storage failure");
                Self::internal("Internal storage error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let dup = ApiError::conflict("duplicate");
        assert_eq!(dup.status, StatusCode::CONFLICT);
        assert_eq!(dup.message, "duplicate");
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let nf: ApiError = StoreError::NotFound("Credential".into()).into();
        assert_eq!(nf.status, StatusCode::NOT_FOUND);

        let shared: ApiError = StoreError::AlreadyShared.into();
        assert_eq!(shared.status, StatusCode::CONFLICT);

        let keyless: ApiError = StoreError::RecipientWithoutKey.into();
        assert_eq!(keyless.status, StatusCode::BAD_REQUEST);

        let own: ApiError = StoreError::SelfShare.into();
        assert_eq!(own.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
