//! Response envelope types.
//!
//! Every JSON response from the API uses one shape: `{success, message}`.
//! The error formatter here backs the centralized error stage; it is wired
//! up only when the fallback handler is enabled on the router.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// The one response shape the API speaks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Normalize any error reaching the end of the chain into the envelope.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, ApiResponse::error(message)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_flat() {
        let json = serde_json::to_value(ApiResponse::ok("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "hello"}));
    }

    #[test]
    fn error_response_carries_status() {
        let response = error_response(StatusCode::NOT_FOUND, "missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
