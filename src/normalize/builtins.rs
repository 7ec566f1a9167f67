use crate::exception::{Exception, HttpExceptionKind};
use crate::normalize::NormalizeStep;
use axum::http::{HeaderValue, header};
use serde_json::json;

/// Exposes the redirect target as `Location` header and payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectStep;

impl NormalizeStep for RedirectStep {
    fn normalize(&self, exception: &mut Exception) {
        let Exception::Http(exc) = exception else {
            return;
        };
        let HttpExceptionKind::Redirect { new_url } = exc.kind() else {
            return;
        };

        let new_url = new_url.clone();
        if let Ok(value) = HeaderValue::from_str(&new_url) {
            exc.headers_mut().insert(header::LOCATION, value);
        }
        exc.set_payload(json!({ "Location": new_url }));
    }
}

/// Exposes the methods a route accepts as `Allow` header and payload.
/// Exceptions that don't know their valid methods pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNotAllowedStep;

impl NormalizeStep for MethodNotAllowedStep {
    fn normalize(&self, exception: &mut Exception) {
        let Exception::Http(exc) = exception else {
            return;
        };
        let HttpExceptionKind::MethodNotAllowed {
            valid_methods: Some(methods),
        } = exc.kind()
        else {
            return;
        };
        if methods.is_empty() {
            return;
        }

        let methods: Vec<String> = methods.iter().map(ToString::to_string).collect();
        if let Ok(value) = HeaderValue::from_str(&methods.join(", ")) {
            exc.headers_mut().insert(header::ALLOW, value);
        }
        exc.set_payload(json!({ "Allow": methods }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::HttpException;
    use axum::http::Method;

    fn http(exception: Exception) -> HttpException {
        match exception {
            Exception::Http(exc) => exc,
            other => panic!("expected http exception, got {other:?}"),
        }
    }

    #[test]
    fn test_redirect_sets_location() {
        let mut exception = Exception::from(HttpException::redirect("/x"));
        RedirectStep.normalize(&mut exception);

        let exc = http(exception);
        assert_eq!(exc.headers()[header::LOCATION], "/x");
        assert_eq!(
            exc.payload().and_then(|p| p.as_data()),
            Some(&json!({"Location": "/x"}))
        );
    }

    #[test]
    fn test_redirect_ignores_other_exceptions() {
        let mut exception = Exception::from(HttpException::not_found());
        RedirectStep.normalize(&mut exception);
        assert!(http(exception).headers().is_empty());
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let mut exception = Exception::from(HttpException::method_not_allowed(Some(vec![
            Method::GET,
            Method::POST,
        ])));
        MethodNotAllowedStep.normalize(&mut exception);

        let exc = http(exception);
        assert_eq!(exc.headers()[header::ALLOW], "GET, POST");
        assert_eq!(
            exc.payload().and_then(|p| p.as_data()),
            Some(&json!({"Allow": ["GET", "POST"]}))
        );
    }

    #[test]
    fn test_method_not_allowed_without_methods_is_skipped() {
        for methods in [None, Some(vec![])] {
            let mut exception = Exception::from(HttpException::method_not_allowed(methods));
            MethodNotAllowedStep.normalize(&mut exception);

            let exc = http(exception);
            assert!(exc.headers().get(header::ALLOW).is_none());
            assert!(exc.payload().is_none());
        }
    }
}
