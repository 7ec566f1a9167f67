use crate::problem::{ProblemError, ProblemType};
use axum::Json;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};

/// Turns a normalized problem into the API response.
///
/// Any closure `Fn(&ProblemError, &ProblemType) -> Response` is a builder.
/// The status written by a builder is always replaced with the problem's.
pub trait ResponseBuilder: Send + Sync + 'static {
    fn build(&self, problem: &ProblemError, problem_type: &ProblemType) -> Response;
}

impl<F> ResponseBuilder for F
where
    F: Fn(&ProblemError, &ProblemType) -> Response + Send + Sync + 'static,
{
    fn build(&self, problem: &ProblemError, problem_type: &ProblemType) -> Response {
        self(problem, problem_type)
    }
}

/// Serializes the problem body as JSON, keeping the problem's headers and
/// defaulting the content type to `application/<marker>+json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseBuilder;

impl ResponseBuilder for JsonResponseBuilder {
    fn build(&self, problem: &ProblemError, problem_type: &ProblemType) -> Response {
        let mut response = (problem.status, Json(problem.body())).into_response();

        let headers = response.headers_mut();
        let json_content_type = headers.remove(header::CONTENT_TYPE);
        headers.extend(problem.headers.clone());

        if !headers.contains_key(header::CONTENT_TYPE) {
            let content_type = HeaderValue::from_str(&problem_type.json_content_type())
                .ok()
                .or(json_content_type);
            if let Some(value) = content_type {
                headers.insert(header::CONTENT_TYPE, value);
            }
        }
        response
    }
}

/// Insert the problem marker into the subtype of the outgoing content type
/// (`application/json` becomes `application/problem+json`).
///
/// Only content types belonging to one of `families` are rewritten; types
/// already carrying the marker are left alone. A missing content type is
/// set to `application/<marker>+json`.
pub fn force_content_type(headers: &mut HeaderMap, problem_type: &ProblemType, families: &[String]) {
    let marker = problem_type.marker();
    let Some(current) = headers.get(header::CONTENT_TYPE) else {
        if let Ok(value) = HeaderValue::from_str(&problem_type.json_content_type()) {
            headers.insert(header::CONTENT_TYPE, value);
        }
        return;
    };
    let Ok(current) = current.to_str() else {
        return;
    };

    if current.contains(marker) || !families.iter().any(|family| current.contains(family.as_str()))
    {
        return;
    }
    let Some((main, sub)) = current.split_once('/') else {
        return;
    };

    let rewritten = format!("{main}/{marker}+{}", sub.trim_start());
    if let Ok(value) = HeaderValue::from_str(&rewritten) {
        headers.insert(header::CONTENT_TYPE, value);
    }
}
