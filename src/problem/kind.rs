use crate::error::{ConfigError, Result};
use crate::exception::status;
use crate::problem::ProblemError;
use axum::http::{HeaderMap, StatusCode};

const STATUS_PLACEHOLDER: &str = "{status}";

/// Describes the family of problems an application emits: how the `type`
/// URI is derived, the default `instance`, and the marker inserted into
/// content types (`application/<marker>+json`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemType {
    type_template: String,
    default_instance: String,
    marker: String,
}

impl Default for ProblemType {
    fn default() -> Self {
        Self {
            type_template: "https://httpstatuses.com/{status}".to_string(),
            default_instance: "about:blank".to_string(),
            marker: "problem".to_string(),
        }
    }
}

impl ProblemType {
    /// `type_template` may contain `{status}`, replaced by the numeric code.
    pub fn new(type_template: impl Into<String>) -> Self {
        Self {
            type_template: type_template.into(),
            ..Self::default()
        }
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.default_instance = instance.into();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Checked once when the handler is configured.
    pub fn validate(&self) -> Result<()> {
        if self.type_template.trim().is_empty() {
            return Err(ConfigError::invalid_problem_type("type template is empty"));
        }
        if self.default_instance.trim().is_empty() {
            return Err(ConfigError::invalid_problem_type("default instance is empty"));
        }
        let valid_marker = !self.marker.is_empty()
            && self
                .marker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid_marker {
            return Err(ConfigError::invalid_problem_type(format!(
                "content-type marker '{}' is not a media type token",
                self.marker
            )));
        }
        Ok(())
    }

    pub fn type_url(&self, status: StatusCode) -> String {
        self.type_template
            .replace(STATUS_PLACEHOLDER, &status.as_u16().to_string())
    }

    pub fn default_instance(&self) -> &str {
        &self.default_instance
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// `application/<marker>+json`
    pub fn json_content_type(&self) -> String {
        format!("application/{}+json", self.marker)
    }

    /// Fresh problem of this type.
    pub fn problem(&self, status: StatusCode, detail: impl Into<String>) -> ProblemError {
        ProblemError {
            type_url: self.type_url(status),
            title: status::title(status).to_string(),
            status,
            detail: detail.into(),
            instance: self.default_instance.clone(),
            response: None,
            headers: HeaderMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_template() {
        let kind = ProblemType::new("https://errors.example.com/{status}/details")
            .with_instance("urn:request");
        kind.validate().unwrap();
        let problem = kind.problem(StatusCode::GONE, "moved away");
        assert_eq!(problem.type_url, "https://errors.example.com/410/details");
        assert_eq!(problem.instance, "urn:request");
        assert_eq!(problem.title, "Gone");
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        assert!(ProblemType::new("  ").validate().is_err());
        assert!(ProblemType::default().with_marker("").validate().is_err());
        assert!(
            ProblemType::default()
                .with_marker("pro/blem")
                .validate()
                .is_err()
        );
        assert!(ProblemType::default().with_instance("").validate().is_err());
    }

    #[test]
    fn test_json_content_type() {
        assert_eq!(
            ProblemType::default().json_content_type(),
            "application/problem+json"
        );
    }
}
