use crate::context::strip_port;
use crate::dispatch::{DispatchContext, ErrorDispatch};
use crate::problem::ProblemError;
use axum::response::Response;

/// Ignores components and answers with the generic problem document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDispatcher;

impl ErrorDispatch for DefaultDispatcher {
    fn dispatch(&self, problem: ProblemError, ctx: &DispatchContext<'_>) -> Response {
        ctx.default_response(problem)
    }
}

/// Picks the first component whose subdomain equals the request's, the
/// subdomain being the request host minus the configured server name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubdomainDispatcher;

impl ErrorDispatch for SubdomainDispatcher {
    fn dispatch(&self, problem: ProblemError, ctx: &DispatchContext<'_>) -> Response {
        let Some(server_name) = ctx.server_name() else {
            tracing::warn!("SERVER_NAME must be set in order to use the subdomain dispatcher");
            return ctx.default_response(problem);
        };

        let subdomain = ctx
            .request
            .host
            .as_deref()
            .and_then(|host| subdomain_of(host, server_name));
        let Some(subdomain) = subdomain else {
            return ctx.default_response(problem);
        };

        let matched = ctx
            .registry
            .components()
            .find(|component| component.subdomain() == Some(subdomain.as_str()));

        match matched {
            Some(component) => ctx.invoke_or_default(component, problem),
            None => ctx.default_response(problem),
        }
    }
}

/// Label left of `server_name` in `host`, if any.
fn subdomain_of(host: &str, server_name: &str) -> Option<String> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let server_name = strip_port(server_name);
    let suffix = format!(".{}", server_name.trim_end_matches('.').to_ascii_lowercase());

    let label = host.strip_suffix(&suffix)?;
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Picks the first component whose URL prefix starts the request path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlPrefixDispatcher;

impl ErrorDispatch for UrlPrefixDispatcher {
    fn dispatch(&self, problem: ProblemError, ctx: &DispatchContext<'_>) -> Response {
        let path = ctx.request.path.as_str();

        for component in ctx.registry.components() {
            let Some(prefix) = component.url_prefix() else {
                tracing::warn!(
                    "Component '{}' has no url prefix and is skipped by the url prefix dispatcher",
                    component.name()
                );
                continue;
            };
            if path.starts_with(prefix) {
                return ctx.invoke_or_default(component, problem);
            }
        }

        ctx.default_response(problem)
    }
}
