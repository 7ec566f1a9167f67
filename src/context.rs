use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, header};
use std::convert::Infallible;

const X_REQUESTED_WITH: &str = "x-requested-with";

/// What the error handlers may know about the request being answered.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Host without port.
    pub host: Option<String>,
    /// `X-Requested-With: XMLHttpRequest` was sent.
    pub is_xhr: bool,
    pub headers: HeaderMap,
}

impl RequestContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);
        Self::build(&parts.method, uri, &parts.headers)
    }

    /// Paths are taken from [`OriginalUri`] when present, so handlers of
    /// nested routers see the full request path.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let uri = request
            .extensions()
            .get::<OriginalUri>()
            .map_or(request.uri(), |original| &original.0);
        Self::build(request.method(), uri, request.headers())
    }

    fn build(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| uri.authority().map(|authority| authority.as_str()))
            .map(strip_port);

        let is_xhr = headers
            .get(X_REQUESTED_WITH)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("xmlhttprequest"));

        Self {
            method: method.clone(),
            path: uri.path().to_string(),
            host,
            is_xhr,
            headers: headers.clone(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(strip_port(&host.into()));
        self
    }

    pub fn with_xhr(mut self, is_xhr: bool) -> Self {
        self.is_xhr = is_xhr;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

pub(crate) fn strip_port(host: &str) -> String {
    // bracketed IPv6 literals keep their colons
    match host.rfind(':') {
        Some(idx) if !host[idx..].contains(']') => host[..idx].to_string(),
        _ => host.to_string(),
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
