use crate::error::{ConfigError, Result};
use crate::exception::status;
use crate::problem::ProblemPayload;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::fmt;

/// What a recognized HTTP exception represents beyond its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpExceptionKind {
    Plain,
    /// `valid_methods` is `None` when the router did not report them.
    MethodNotAllowed { valid_methods: Option<Vec<Method>> },
    /// A routing redirect to `new_url`.
    Redirect { new_url: String },
}

/// An error the host framework itself knows how to describe: it carries its
/// own status code and description.
#[derive(Debug)]
pub struct HttpException {
    status: StatusCode,
    description: Option<String>,
    kind: HttpExceptionKind,
    headers: HeaderMap,
    payload: Option<ProblemPayload>,
}

impl HttpException {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            description: None,
            kind: HttpExceptionKind::Plain,
            headers: HeaderMap::new(),
            payload: None,
        }
    }

    /// Build from a numeric code, rejecting anything outside 100..=599.
    pub fn from_code(code: u16) -> Result<Self> {
        if !(100..=599).contains(&code) {
            return Err(ConfigError::invalid_status(code, "must be within 100..=599"));
        }
        let status = StatusCode::from_u16(code)
            .map_err(|e| ConfigError::invalid_status(code, e.to_string()))?;
        Ok(Self::new(status))
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub fn method_not_allowed(valid_methods: Option<Vec<Method>>) -> Self {
        Self {
            kind: HttpExceptionKind::MethodNotAllowed { valid_methods },
            ..Self::new(StatusCode::METHOD_NOT_ALLOWED)
        }
    }

    pub fn redirect(new_url: impl Into<String>) -> Self {
        Self {
            kind: HttpExceptionKind::Redirect {
                new_url: new_url.into(),
            },
            ..Self::new(StatusCode::PERMANENT_REDIRECT)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<ProblemPayload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Standard name of the status.
    pub fn name(&self) -> &'static str {
        status::title(self.status)
    }

    pub fn description(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or_else(|| status::default_description(self.status))
    }

    pub fn kind(&self) -> &HttpExceptionKind {
        &self.kind
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn payload(&self) -> Option<&ProblemPayload> {
        self.payload.as_ref()
    }

    pub fn set_payload(&mut self, payload: impl Into<ProblemPayload>) {
        self.payload = Some(payload.into());
    }

    pub(crate) fn into_parts(self) -> (StatusCode, String, HeaderMap, Option<ProblemPayload>) {
        let description = self.description().to_string();
        (self.status, description, self.headers, self.payload)
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.status.as_u16(),
            self.name(),
            self.description()
        )
    }
}

impl std::error::Error for HttpException {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_bounds() {
        assert!(HttpException::from_code(404).is_ok());
        assert!(HttpException::from_code(99).is_err());
        assert!(matches!(
            HttpException::from_code(600),
            Err(ConfigError::InvalidStatusCode { code: 600, .. })
        ));
    }

    #[test]
    fn test_description_defaults_per_status() {
        let exc = HttpException::not_found();
        assert_eq!(exc.name(), "Not Found");
        assert!(exc.description().starts_with("The requested URL was not found"));

        let exc = HttpException::new(StatusCode::BAD_REQUEST).with_description("bad input");
        assert_eq!(exc.to_string(), "400 Bad Request: bad input");
    }

    #[test]
    fn test_redirect_is_permanent() {
        let exc = HttpException::redirect("/x");
        assert_eq!(exc.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            exc.kind(),
            &HttpExceptionKind::Redirect {
                new_url: "/x".to_string()
            }
        );
    }
}
