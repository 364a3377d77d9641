// SPDX-License-Identifier: MIT

//! The `{success:true, data}` success envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap handler data in the success envelope with status 200.
pub fn ok<T: Serialize>(data: T) -> Response {
    with_status(StatusCode::OK, data)
}

/// Wrap handler data in the success envelope with an explicit status.
pub fn with_status<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(SuccessBody {
            success: true,
            data,
        }),
    )
        .into_response()
}
