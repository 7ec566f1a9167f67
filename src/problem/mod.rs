//! RFC 7807 problem details, the single shape every raised error ends up in.

use crate::exception::status;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub mod kind;

pub use kind::ProblemType;

/// Structured payload attached to a problem next to the standard fields.
#[derive(Debug)]
pub enum ProblemPayload {
    /// Serialized into the `response` member of the body.
    Data(serde_json::Value),
    /// A complete response, sent as-is instead of a problem body.
    Raw(Response),
}

impl ProblemPayload {
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Raw(_) => None,
        }
    }
}

impl From<serde_json::Value> for ProblemPayload {
    fn from(value: serde_json::Value) -> Self {
        Self::Data(value)
    }
}

impl From<Response> for ProblemPayload {
    fn from(response: Response) -> Self {
        Self::Raw(response)
    }
}

/// The canonical error value.
///
/// `status` is always the code written on the wire for this error.
#[derive(Debug, Error)]
#[error("{} {title}: {detail}", .status.as_u16())]
#[must_use]
pub struct ProblemError {
    /// URI reference identifying the problem class.
    pub type_url: String,
    pub title: String,
    pub status: StatusCode,
    pub detail: String,
    /// URI reference for this occurrence.
    pub instance: String,
    pub response: Option<ProblemPayload>,
    pub headers: HeaderMap,
}

impl ProblemError {
    /// A problem of the default [`ProblemType`] with the standard title and
    /// description for `status`.
    pub fn new(status: StatusCode) -> Self {
        ProblemType::default().problem(status, status::default_description(status))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn with_payload(mut self, payload: impl Into<ProblemPayload>) -> Self {
        self.response = Some(payload.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Wire body for this problem. A raw payload serializes as `null`; the
    /// API handler never serializes such problems anyway.
    pub fn body(&self) -> ProblemBody<'_> {
        ProblemBody {
            type_url: &self.type_url,
            title: &self.title,
            status: self.status,
            detail: &self.detail,
            instance: &self.instance,
            response: self.response.as_ref().and_then(ProblemPayload::as_data),
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Serialized form of a [`ProblemError`].
#[derive(Debug, Serialize)]
pub struct ProblemBody<'a> {
    #[serde(rename = "type")]
    pub type_url: &'a str,
    pub title: &'a str,
    #[serde(serialize_with = "serialize_status_code")]
    pub status: StatusCode,
    pub detail: &'a str,
    pub instance: &'a str,
    pub response: Option<&'a serde_json::Value>,
}
