//! Route handlers terminating the middleware chain.

use axum::{
    http::{StatusCode, Uri},
    Json,
};
use serde::Deserialize;

use crate::http::response::ApiResponse;

pub const WELCOME_MESSAGE: &str =
    "Welcome to Confer. The civilized way to tell someone they're on mute.";

/// `GET /` — fixed welcome envelope.
pub async fn welcome() -> Json<ApiResponse> {
    Json(ApiResponse::ok(WELCOME_MESSAGE))
}

#[derive(Debug, Deserialize)]
pub struct EchoRequest {
    pub message: String,
}

/// `POST /` — echo the posted message back verbatim.
pub async fn echo(Json(payload): Json<EchoRequest>) -> Json<ApiResponse> {
    Json(ApiResponse::ok(format!(
        "you have posted the following message to the api: {}",
        payload.message
    )))
}

/// Fallback for unmatched routes.
///
/// Present but not registered on the router; see `HttpServer::build_router`.
pub async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!(
            "Can't find {uri} on this server."
        ))),
    )
}
