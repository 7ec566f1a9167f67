//! Independently routable parts of an application and the error handlers
//! they register.

use crate::context::RequestContext;
use crate::error::{ConfigError, Result};
use crate::exception::{Exception, STANDARD_ERROR_CODES};
use axum::http::StatusCode;
use axum::response::Response;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub mod layer;

pub use layer::{ErrorsLayer, ErrorsMiddleware};

/// Name of the root component standing for the whole application.
pub const APP_COMPONENT: &str = "app";

pub type ErrorHandlerFn = Arc<dyn Fn(Exception, &RequestContext) -> Response + Send + Sync>;

/// Slot of a component's handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    Status(StatusCode),
    /// Catch-all for unrecognized exceptions.
    Failure,
}

/// A sub-router (or the application itself) with its own error handlers.
#[derive(Clone)]
pub struct Component {
    name: String,
    subdomain: Option<String>,
    url_prefix: Option<String>,
    handlers: HashMap<HandlerKey, ErrorHandlerFn>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.handlers.keys().collect();
        keys.sort_by_key(|key| match key {
            HandlerKey::Status(status) => status.as_u16(),
            HandlerKey::Failure => 0,
        });
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("subdomain", &self.subdomain)
            .field("url_prefix", &self.url_prefix)
            .field("handlers", &keys)
            .finish()
    }
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subdomain: None,
            url_prefix: None,
            handlers: HashMap::new(),
        }
    }

    /// The root application component.
    pub fn app() -> Self {
        Self::new(APP_COMPONENT)
    }

    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    pub fn with_url_prefix(mut self, url_prefix: impl Into<String>) -> Self {
        self.url_prefix = Some(url_prefix.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subdomain(&self) -> Option<&str> {
        self.subdomain.as_deref()
    }

    pub fn url_prefix(&self) -> Option<&str> {
        self.url_prefix.as_deref()
    }

    /// Register `handler` for one error status, or for all
    /// [`STANDARD_ERROR_CODES`] plus the failure slot when `code` is `None`.
    pub fn register<F>(&mut self, code: Option<StatusCode>, handler: F) -> Result<()>
    where
        F: Fn(Exception, &RequestContext) -> Response + Send + Sync + 'static,
    {
        let handler: ErrorHandlerFn = Arc::new(handler);

        if let Some(code) = code {
            if !(code.is_client_error() || code.is_server_error()) {
                return Err(ConfigError::invalid_status(
                    code.as_u16(),
                    "error handlers can only be registered for 4xx and 5xx statuses",
                ));
            }
            self.handlers.insert(HandlerKey::Status(code), handler);
            return Ok(());
        }

        for code in STANDARD_ERROR_CODES {
            let status = StatusCode::from_u16(code)
                .map_err(|e| ConfigError::invalid_status(code, e.to_string()))?;
            self.handlers
                .insert(HandlerKey::Status(status), Arc::clone(&handler));
        }
        self.handlers.insert(HandlerKey::Failure, handler);
        Ok(())
    }

    pub fn register_failure<F>(&mut self, handler: F)
    where
        F: Fn(Exception, &RequestContext) -> Response + Send + Sync + 'static,
    {
        self.handlers.insert(HandlerKey::Failure, Arc::new(handler));
    }

    pub fn handler(&self, key: HandlerKey) -> Option<&ErrorHandlerFn> {
        self.handlers.get(&key)
    }

    pub fn has_handler(&self, status: StatusCode) -> bool {
        self.handlers.contains_key(&HandlerKey::Status(status))
    }

    pub fn has_failure_handler(&self) -> bool {
        self.handlers.contains_key(&HandlerKey::Failure)
    }

    /// Handler answering `exception` on this component: unrecognized
    /// exceptions go to the failure slot; recognized ones use their status
    /// and fall back to the failure slot.
    pub fn handler_for(&self, exception: &Exception) -> Option<&ErrorHandlerFn> {
        if !exception.is_recognized() {
            return self.handler(HandlerKey::Failure);
        }
        self.handler(HandlerKey::Status(exception.status()))
            .or_else(|| self.handler(HandlerKey::Failure))
    }
}

/// Every component of an application in registration order, plus the root.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    app: Arc<Component>,
    components: Vec<Arc<Component>>,
}

impl ComponentRegistry {
    pub fn new(app: Component) -> Self {
        Self {
            app: Arc::new(app),
            components: Vec::new(),
        }
    }

    /// Append a component. Names must be unique.
    pub fn with_component(mut self, component: Component) -> Result<Self> {
        let taken = component.name == self.app.name
            || self.components.iter().any(|c| c.name == component.name);
        if taken {
            return Err(ConfigError::DuplicateComponent {
                name: component.name,
            });
        }
        self.components.push(Arc::new(component));
        Ok(self)
    }

    pub fn app(&self) -> &Arc<Component> {
        &self.app
    }

    pub fn components(&self) -> impl Iterator<Item = &Arc<Component>> {
        self.components.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Component>> {
        if self.app.name == name {
            return Some(&self.app);
        }
        self.components.iter().find(|c| c.name == name)
    }

    /// Layer routing raised exceptions to the named component's handlers.
    pub fn layer(&self, name: &str) -> Option<ErrorsLayer> {
        self.get(name).map(|component| ErrorsLayer::new(Arc::clone(component)))
    }

    pub fn app_layer(&self) -> ErrorsLayer {
        ErrorsLayer::new(Arc::clone(&self.app))
    }
}
