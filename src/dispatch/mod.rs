//! Choosing which component answers an error that happened outside every
//! component's routes (typically "not found" and "method not allowed").

use crate::component::{Component, ComponentRegistry, HandlerKey};
use crate::context::RequestContext;
use crate::error::{ConfigError, Result};
use crate::handler::ErrorsHandler;
use crate::problem::ProblemError;
use axum::response::Response;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

pub mod layer;
pub mod strategies;

pub use layer::{DispatchLayer, DispatchMiddleware};
pub use strategies::{DefaultDispatcher, SubdomainDispatcher, UrlPrefixDispatcher};

/// Names of the built-in dispatch strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DispatcherKind {
    Default,
    Subdomain,
    UrlPrefix,
}

/// The single capability every dispatch strategy provides.
pub trait ErrorDispatch: Send + Sync + 'static {
    fn dispatch(&self, problem: ProblemError, ctx: &DispatchContext<'_>) -> Response;
}

/// Everything a strategy may consult while dispatching one error.
pub struct DispatchContext<'a> {
    pub request: &'a RequestContext,
    pub registry: &'a ComponentRegistry,
    handler: &'a ErrorsHandler,
}

impl<'a> DispatchContext<'a> {
    pub fn new(
        request: &'a RequestContext,
        registry: &'a ComponentRegistry,
        handler: &'a ErrorsHandler,
    ) -> Self {
        Self {
            request,
            registry,
            handler,
        }
    }

    /// Base host name subdomains are computed against.
    pub fn server_name(&self) -> Option<&str> {
        self.handler.config().server_name.as_deref()
    }

    /// Generic problem document for `problem`, ignoring components.
    pub fn default_response(&self, problem: ProblemError) -> Response {
        self.handler.api_handler(problem, self.request)
    }

    /// Run `component`'s own handler for the problem's status. Hands the
    /// problem back when the component has none.
    pub fn invoke(
        &self,
        component: &Component,
        problem: ProblemError,
    ) -> std::result::Result<Response, ProblemError> {
        match component.handler(HandlerKey::Status(problem.status)) {
            Some(handler) => {
                tracing::debug!(
                    component = component.name(),
                    status = problem.status.as_u16(),
                    "Dispatching error to component"
                );
                Ok(handler(problem.into(), self.request))
            }
            None => Err(problem),
        }
    }

    /// `invoke`, falling back to the default response.
    pub fn invoke_or_default(&self, component: &Component, problem: ProblemError) -> Response {
        self.invoke(component, problem)
            .unwrap_or_else(|problem| self.default_response(problem))
    }
}

/// Dispatch strategy of an application.
#[derive(Clone)]
pub enum Dispatcher {
    Default,
    Subdomain,
    UrlPrefix,
    Custom(Arc<dyn ErrorDispatch>),
}

impl Dispatcher {
    /// Strategy registered under `name`.
    pub fn from_name(name: &str) -> Result<Self> {
        DispatcherKind::from_str(name.trim())
            .map(Self::from)
            .map_err(|_| ConfigError::UnknownDispatcher {
                name: name.to_string(),
                expected: DispatcherKind::iter()
                    .map(|kind| kind.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn custom(dispatcher: impl ErrorDispatch) -> Self {
        Self::Custom(Arc::new(dispatcher))
    }

    /// `None` for custom strategies.
    pub fn kind(&self) -> Option<DispatcherKind> {
        match self {
            Self::Default => Some(DispatcherKind::Default),
            Self::Subdomain => Some(DispatcherKind::Subdomain),
            Self::UrlPrefix => Some(DispatcherKind::UrlPrefix),
            Self::Custom(_) => None,
        }
    }

    pub fn dispatch(&self, problem: ProblemError, ctx: &DispatchContext<'_>) -> Response {
        match self {
            Self::Default => DefaultDispatcher.dispatch(problem, ctx),
            Self::Subdomain => SubdomainDispatcher.dispatch(problem, ctx),
            Self::UrlPrefix => UrlPrefixDispatcher.dispatch(problem, ctx),
            Self::Custom(dispatcher) => dispatcher.dispatch(problem, ctx),
        }
    }
}

impl From<DispatcherKind> for Dispatcher {
    fn from(kind: DispatcherKind) -> Self {
        match kind {
            DispatcherKind::Default => Self::Default,
            DispatcherKind::Subdomain => Self::Subdomain,
            DispatcherKind::UrlPrefix => Self::UrlPrefix,
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "Dispatcher::{kind:?}"),
            None => f.write_str("Dispatcher::Custom(..)"),
        }
    }
}
