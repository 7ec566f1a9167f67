//! # errors-handler
//!
//! Uniform error handling for axum applications split into components.
//!
//! Every error a handler raises is normalized into an RFC 7807 problem
//! document and answered by the component the request belongs to: API
//! components reply with `application/problem+json`, web components with an
//! HTML error page. Errors that happen before any route matched ("not
//! found", "method not allowed") are routed to a component by a configurable
//! dispatcher that looks at the request's subdomain or URL prefix.
//!
//! ## Features
//!
//! - **Normalization**: an ordered, extensible chain turns raised exceptions
//!   into [`ProblemError`]s, adding `Allow` and `Location` details on the way
//! - **Per-component handlers**: register API, web, default or custom
//!   handlers per status code on each [`Component`]
//! - **Dispatch**: `default`, `subdomain` and `urlprefix` strategies, or your
//!   own [`ErrorDispatch`](dispatch::ErrorDispatch)
//! - **Configuration**: plain key/value settings (`ERROR_PAGE`,
//!   `ERROR_DISPATCHER`, ...) read from the environment or set in code
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use errors_handler::prelude::*;
//! use axum::extract::Request;
//! use axum::routing::get;
//!
//! async fn find_user() -> Result<&'static str, Exception> {
//!     Err(abort(StatusCode::NOT_FOUND, "No such user"))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ErrorsConfig::from_store(&ConfigStore::from_env()).unwrap();
//!     let errors = ErrorsHandler::new(config.with_dispatcher("urlprefix")).unwrap();
//!
//!     let mut api = Component::new("api").with_url_prefix("/api");
//!     errors.api_register(&mut api, None).unwrap();
//!
//!     let mut app = Component::app();
//!     errors.default_register(&mut app).unwrap();
//!
//!     let registry = Arc::new(ComponentRegistry::new(app).with_component(api).unwrap());
//!
//!     let api_routes = Router::new()
//!         .route("/users/{id}", get(find_user))
//!         .layer(registry.layer("api").unwrap());
//!
//!     let router = Router::new()
//!         .nest("/api", api_routes)
//!         .layer(registry.app_layer());
//!     let service = errors.wrap(router, registry);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     axum::serve(listener, axum::ServiceExt::<Request>::into_make_service(service))
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod component;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod exception;
pub mod handler;
pub mod normalize;
pub mod problem;

pub use component::{Component, ComponentRegistry, ErrorHandlerFn, ErrorsLayer};
pub use config::{ConfigStore, ErrorsConfig};
pub use context::RequestContext;
pub use dispatch::{DispatchLayer, Dispatcher, DispatcherKind};
pub use error::{ConfigError, Result};
pub use exception::{Exception, HttpException, abort};
pub use handler::{ErrorsHandler, ErrorsHandlerBuilder};
pub use normalize::{NormalizationChain, NormalizeStep};
pub use problem::{ProblemError, ProblemPayload, ProblemType};

pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use errors_handler::prelude::*;
/// ```
pub mod prelude {
    pub use crate::component::{Component, ComponentRegistry, ErrorHandlerFn, ErrorsLayer};
    pub use crate::config::{ConfigStore, ErrorsConfig};
    pub use crate::context::RequestContext;
    pub use crate::dispatch::{DispatchContext, DispatchLayer, Dispatcher, ErrorDispatch};
    pub use crate::error::ConfigError;
    pub use crate::exception::{Exception, HttpException, abort};
    pub use crate::handler::{ErrorsHandler, ResponseBuilder, TemplateRenderer};
    pub use crate::normalize::{NormalizationChain, NormalizeStep};
    pub use crate::problem::{ProblemError, ProblemType};
    pub use axum::{
        Router,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
