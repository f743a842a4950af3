//! Marks whether a response body came from the store or from sample data.

use axum::{
    Json,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const DATA_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-data-source");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Live,
    Fallback,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Fallback => "fallback",
        }
    }
}

/// JSON body plus an `x-data-source` header. The body is left untouched so
/// live and fallback payloads keep the same shape.
pub struct Sourced<T>(pub DataSource, pub T);

impl<T> Sourced<T> {
    pub fn live(body: T) -> Self {
        Self(DataSource::Live, body)
    }

    pub fn fallback(body: T) -> Self {
        Self(DataSource::Fallback, body)
    }
}

impl<T: Serialize> IntoResponse for Sourced<T> {
    fn into_response(self) -> Response {
        let Sourced(source, body) = self;
        (
            [(DATA_SOURCE_HEADER, HeaderValue::from_static(source.as_str()))],
            Json(body),
        )
            .into_response()
    }
}

/// Live body, or the sample payload when the store query failed.
pub fn live_or_fallback<T>(
    what: &'static str,
    live: Result<T, sqlx::Error>,
    fallback: impl FnOnce() -> T,
) -> Sourced<T> {
    match live {
        Ok(body) => Sourced::live(body),
        Err(e) => {
            tracing::warn!(error = %e, "Database unavailable, using fallback {} data", what);
            Sourced::fallback(fallback())
        }
    }
}
