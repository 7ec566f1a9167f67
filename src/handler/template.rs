use crate::problem::ProblemError;
use std::collections::HashMap;
use thiserror::Error;

/// Page used when no configured template can be rendered.
pub const DEFAULT_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ status }} {{ title }}</title>
</head>
<body>
  <h1>{{ title }}</h1>
  <p>{{ detail }}</p>
</body>
</html>
"#;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template render failed: {0}")]
    Render(String),
}

/// Renders error pages by name. Integrators plug their own engine in here.
pub trait TemplateRenderer: Send + Sync + 'static {
    fn render(&self, name: &str, problem: &ProblemError) -> Result<String, TemplateError>;
}

/// Named templates using `{{ status }}`, `{{ title }}`, `{{ detail }}`,
/// `{{ type }}` and `{{ instance }}` placeholders. Values are HTML-escaped.
#[derive(Debug, Clone)]
pub struct BuiltinTemplates {
    templates: HashMap<String, String>,
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::empty().with_template("error.html", DEFAULT_HTML_TEMPLATE)
    }
}

impl BuiltinTemplates {
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(name.into(), source.into());
        self
    }
}

impl TemplateRenderer for BuiltinTemplates {
    fn render(&self, name: &str, problem: &ProblemError) -> Result<String, TemplateError> {
        let source = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        render_source(source, problem)
    }
}

/// Substitute problem fields into `source`.
pub fn render_source(source: &str, problem: &ProblemError) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| TemplateError::Render("unclosed '{{'".to_string()))?;

        let value = match after[..end].trim() {
            "status" => problem.status.as_u16().to_string(),
            "title" => problem.title.clone(),
            "detail" => problem.detail.clone(),
            "type" => problem.type_url.clone(),
            "instance" => problem.instance.clone(),
            other => return Err(TemplateError::Render(format!("unknown variable '{other}'"))),
        };
        out.push_str(&escape_html(&value));
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
