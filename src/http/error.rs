use std::borrow::Cow;
use std::collections::HashMap;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use crate::auth::AuthError;
use crate::error::Entity;
use crate::repository::CatalogError;

type FieldErrors = HashMap<Cow<'static, str>, Vec<Cow<'static, str>>>;

/// Failures of the development backend, rendered as HTTP responses.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("{0} not found")]
    NotFound(Entity),

    /// Field name to messages, sent as `{"errors": {...}}`.
    #[error("invalid request")]
    Invalid { errors: FieldErrors },
}

impl ApiError {
    pub fn invalid<K, V>(errors: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: Into<Cow<'static, str>>,
    {
        let mut fields = FieldErrors::new();
        for (field, message) in errors {
            fields.entry(field.into()).or_default().push(message.into());
        }
        Self::Invalid { errors: fields }
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::SectionNotFound => Self::NotFound(Entity::Section),
            CatalogError::MediaNotFound => Self::NotFound(Entity::Media),
        }
    }
}

#[derive(Serialize)]
struct ErrorsBody {
    errors: FieldErrors,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized(_) => {
                let challenge = [(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))];
                (StatusCode::UNAUTHORIZED, challenge, self.to_string()).into_response()
            }
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            Self::Invalid { errors } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorsBody { errors })).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let res = ApiError::from(AuthError::MissingToken).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[test]
    fn catalog_errors_are_not_found() {
        let err = ApiError::from(CatalogError::MediaNotFound);
        assert_eq!(err.to_string(), "media item not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn field_errors_are_grouped() {
        let err = ApiError::invalid([("file", "not an image"), ("file", "file too large"), ("section_id", "not a number")]);
        match &err {
            ApiError::Invalid { errors } => {
                assert_eq!(errors["file"].len(), 2);
                assert_eq!(errors["section_id"], vec![Cow::Borrowed("not a number")]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
