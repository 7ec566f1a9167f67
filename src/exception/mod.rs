//! Everything a request handler can raise.
//!
//! Handlers return `Result<T, Exception>`. Turning an [`Exception`] into a
//! response does not pick a representation yet: the raised value travels in
//! the response extensions until an [`ErrorsLayer`](crate::component::ErrorsLayer)
//! hands it to the handler registered on the active component.

use crate::problem::ProblemError;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::{Arc, Mutex};

pub mod http;
pub mod status;

pub use http::{HttpException, HttpExceptionKind};
pub use status::STANDARD_ERROR_CODES;

/// A raised error, before normalization.
#[derive(Debug)]
pub enum Exception {
    /// Recognized HTTP exception carrying its own status and description.
    Http(HttpException),
    /// Already normalized.
    Problem(ProblemError),
    /// Anything else raised by application code.
    Unhandled(anyhow::Error),
}

impl Exception {
    pub fn unhandled(error: impl Into<anyhow::Error>) -> Self {
        Self::Unhandled(error.into())
    }

    /// Status this exception will be answered with if nothing rewrites it.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Http(exc) => exc.status(),
            Self::Problem(problem) => problem.status,
            Self::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unhandled(_))
    }

    /// Minimal `"<name>: <description>"` text that never exposes internals
    /// of an unrecognized failure.
    pub fn summary(&self) -> String {
        match self {
            Self::Http(exc) => format!("{}: {}", exc.name(), exc.description()),
            Self::Problem(problem) => format!("{}: {}", problem.title, problem.detail),
            Self::Unhandled(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                format!(
                    "{}: {}",
                    status::title(status),
                    status::default_description(status)
                )
            }
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(exc) => fmt::Display::fmt(exc, f),
            Self::Problem(problem) => fmt::Display::fmt(problem, f),
            Self::Unhandled(err) => write!(f, "500 Internal Server Error: {err}"),
        }
    }
}

impl From<HttpException> for Exception {
    fn from(exc: HttpException) -> Self {
        Self::Http(exc)
    }
}

impl From<ProblemError> for Exception {
    fn from(problem: ProblemError) -> Self {
        Self::Problem(problem)
    }
}

impl From<anyhow::Error> for Exception {
    fn from(err: anyhow::Error) -> Self {
        Self::Unhandled(err)
    }
}

/// Raise a recognized HTTP exception from inside a handler.
pub fn abort(status: StatusCode, description: impl Into<String>) -> Exception {
    HttpException::new(status)
        .with_description(description)
        .into()
}

/// Take-once slot carrying a raised exception inside response extensions.
#[derive(Clone)]
pub struct RaisedException(Arc<Mutex<Option<Exception>>>);

impl RaisedException {
    fn new(exception: Exception) -> Self {
        Self(Arc::new(Mutex::new(Some(exception))))
    }

    pub fn take(&self) -> Option<Exception> {
        match self.0.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Put an exception back after a layer declined to handle it.
    pub fn restore(&self, exception: Exception) {
        match self.0.lock() {
            Ok(mut slot) => *slot = Some(exception),
            Err(poisoned) => *poisoned.into_inner() = Some(exception),
        }
    }
}

/// Marks responses produced by this crate so the dispatch layer leaves them
/// alone.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Handled;

impl IntoResponse for Exception {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (
            status,
            [(header::CONTENT_TYPE, "text/plain")],
            self.summary(),
        )
            .into_response();
        response
            .extensions_mut()
            .insert(RaisedException::new(self));
        response
    }
}
