// SPDX-License-Identifier: MIT

//! Request extractors whose rejections speak the application error catalog
//! instead of axum's plain-text defaults.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::{AppError, ErrorKind};

/// Drop-in replacement for `axum::Json` on request bodies; rejections map
/// to catalog kinds instead of axum's plain-text defaults.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let kind = match rejection {
                    JsonRejection::MissingJsonContentType(_) => ErrorKind::UnsupportedMediaType,
                    JsonRejection::JsonSyntaxError(_) => ErrorKind::JsonProcessingError,
                    JsonRejection::JsonDataError(_) => ErrorKind::BindingError,
                    _ => ErrorKind::BindingError,
                };
                Err(kind.into())
            }
        }
    }
}

/// Query extractor; a value that fails to parse (bad number, bad date) is
/// a type mismatch, not a generic 400.
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(_) => Err(ErrorKind::NumberFormatError.into()),
        }
    }
}

/// Path extractor; a non-numeric id in a numeric segment is a type
/// mismatch, not a generic 400.
pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(AppPath(value)),
            Err(_) => Err(ErrorKind::NumberFormatError.into()),
        }
    }
}
