//! The error coordinator: normalizes raised exceptions and builds the API and
//! web responses for them.

use crate::component::{Component, ComponentRegistry, ErrorHandlerFn};
use crate::config::ErrorsConfig;
use crate::context::RequestContext;
use crate::dispatch::{DispatchContext, DispatchLayer, DispatchMiddleware, Dispatcher};
use crate::error::Result;
use crate::exception::Exception;
use crate::normalize::NormalizationChain;
use crate::problem::{ProblemError, ProblemPayload, ProblemType};
use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;
use tower::Layer;

pub mod response;
pub mod template;

pub use response::{JsonResponseBuilder, ResponseBuilder, force_content_type};
pub use template::{BuiltinTemplates, DEFAULT_HTML_TEMPLATE, TemplateError, TemplateRenderer};

/// Coordinates normalization and response building for one application.
///
/// Cheap to clone; every clone shares the same immutable setup.
///
/// # Example
/// ```
/// use errors_handler::prelude::*;
///
/// let errors = ErrorsHandler::builder()
///     .config(ErrorsConfig::default().with_dispatcher("urlprefix"))
///     .build()
///     .unwrap();
///
/// let mut api = Component::new("api").with_url_prefix("/api");
/// errors.api_register(&mut api, None).unwrap();
///
/// let mut web = Component::new("web").with_url_prefix("/web");
/// errors.web_register(&mut web, None).unwrap();
/// ```
#[derive(Clone)]
pub struct ErrorsHandler {
    inner: Arc<Inner>,
}

struct Inner {
    config: ErrorsConfig,
    problem_type: ProblemType,
    chain: NormalizationChain,
    response_builder: Arc<dyn ResponseBuilder>,
    renderer: Arc<dyn TemplateRenderer>,
    dispatcher: Option<Dispatcher>,
    dispatch_codes: Vec<StatusCode>,
}

impl ErrorsHandler {
    pub fn builder() -> ErrorsHandlerBuilder {
        ErrorsHandlerBuilder::new()
    }

    /// Handler with every default except the given configuration.
    pub fn new(config: ErrorsConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &ErrorsConfig {
        &self.inner.config
    }

    pub fn problem_type(&self) -> &ProblemType {
        &self.inner.problem_type
    }

    pub fn dispatcher(&self) -> Option<&Dispatcher> {
        self.inner.dispatcher.as_ref()
    }

    pub fn dispatch_codes(&self) -> &[StatusCode] {
        &self.inner.dispatch_codes
    }

    /// Run the normalization chain against the configured problem type.
    pub fn normalize(&self, exception: impl Into<Exception>) -> ProblemError {
        self.inner
            .chain
            .normalize(exception.into(), &self.inner.problem_type, &self.inner.config)
    }

    /// Problem document response.
    ///
    /// A problem whose payload is already a complete response gets that
    /// response back, with the problem's status.
    pub fn api_handler(&self, exception: impl Into<Exception>, _ctx: &RequestContext) -> Response {
        let mut problem = self.normalize(exception);

        match problem.response.take() {
            Some(ProblemPayload::Raw(mut response)) => {
                *response.status_mut() = problem.status;
                response
            }
            payload => {
                problem.response = payload;
                let mut response = self
                    .inner
                    .response_builder
                    .build(&problem, &self.inner.problem_type);
                *response.status_mut() = problem.status;

                if self.inner.config.force_content_type {
                    force_content_type(
                        response.headers_mut(),
                        &self.inner.problem_type,
                        &self.inner.config.content_types,
                    );
                }
                response
            }
        }
    }

    /// Browser-facing response: the configured error page, or the problem
    /// document for AJAX requests when XHR forcing is on.
    ///
    /// Without a configured page the answer is plain text (the problem in
    /// debug mode, the generic message otherwise) sent with the problem's
    /// own status, not a blanket 500, so the wire status always matches
    /// the problem's `status`.
    pub fn web_handler(&self, exception: impl Into<Exception>, ctx: &RequestContext) -> Response {
        let problem = self.normalize(exception);
        let config = &self.inner.config;

        if config.xhr_enabled && ctx.is_xhr {
            return self.api_handler(problem, ctx);
        }

        let Some(page) = config.error_page.as_deref() else {
            let body = if config.debug {
                problem.to_string()
            } else {
                config.default_message.clone()
            };
            return plain_response(&problem, body);
        };

        match self.inner.renderer.render(page, &problem) {
            Ok(html) => html_response(&problem, html),
            Err(e) => {
                tracing::warn!("Error page '{}' could not be rendered: {}", page, e);
                self.default_page(&problem)
            }
        }
    }

    /// Minimal built-in HTML page, independent of any configured template.
    pub fn failure_handler(&self, exception: impl Into<Exception>, _ctx: &RequestContext) -> Response {
        let problem = self.normalize(exception);
        self.default_page(&problem)
    }

    fn default_page(&self, problem: &ProblemError) -> Response {
        match template::render_source(DEFAULT_HTML_TEMPLATE, problem) {
            Ok(html) => html_response(problem, html),
            Err(_) => plain_response(problem, problem.to_string()),
        }
    }

    /// Attach `handler` to `component` for `code`, or for every standard
    /// error status plus unrecognized exceptions when `code` is `None`.
    pub fn register<F>(component: &mut Component, code: Option<StatusCode>, handler: F) -> Result<()>
    where
        F: Fn(Exception, &RequestContext) -> Response + Send + Sync + 'static,
    {
        component.register(code, handler)
    }

    pub fn api_register(&self, component: &mut Component, code: Option<StatusCode>) -> Result<()> {
        let errors = self.clone();
        component.register(code, move |exception, ctx| errors.api_handler(exception, ctx))
    }

    pub fn web_register(&self, component: &mut Component, code: Option<StatusCode>) -> Result<()> {
        let errors = self.clone();
        component.register(code, move |exception, ctx| errors.web_handler(exception, ctx))
    }

    /// Built-in HTML page for every status and for unrecognized exceptions.
    pub fn default_register(&self, component: &mut Component) -> Result<()> {
        let errors = self.clone();
        component.register(None, move |exception, ctx| {
            errors.failure_handler(exception, ctx)
        })
    }

    /// Catch-all for unrecognized exceptions only; defaults to the built-in
    /// HTML page.
    pub fn failure_register(&self, component: &mut Component, handler: Option<ErrorHandlerFn>) {
        match handler {
            Some(handler) => component.register_failure(move |exception, ctx| handler(exception, ctx)),
            None => {
                let errors = self.clone();
                component.register_failure(move |exception, ctx| {
                    errors.failure_handler(exception, ctx)
                });
            }
        }
    }

    /// Hand an error that happened outside every component's routes to the
    /// configured dispatcher. `None` when no dispatcher is configured.
    pub fn dispatch(
        &self,
        exception: impl Into<Exception>,
        ctx: &RequestContext,
        registry: &ComponentRegistry,
    ) -> Option<Response> {
        let dispatcher = self.inner.dispatcher.as_ref()?;
        let problem = self.normalize(exception);
        let dispatch_ctx = DispatchContext::new(ctx, registry, self);
        Some(dispatcher.dispatch(problem, &dispatch_ctx))
    }

    /// Layer answering unmatched routes; apply it to a whole service with
    /// [`Layer::layer`], or use [`wrap`](Self::wrap).
    pub fn dispatch_layer(&self, registry: Arc<ComponentRegistry>) -> DispatchLayer {
        DispatchLayer::new(self.clone(), registry)
    }

    /// The finished application router wrapped so that unmatched routes
    /// reach the dispatcher.
    ///
    /// Serve the result with
    /// `axum::serve(listener, axum::ServiceExt::<Request>::into_make_service(service))`.
    pub fn wrap(
        &self,
        router: Router,
        registry: Arc<ComponentRegistry>,
    ) -> DispatchMiddleware<Router> {
        self.dispatch_layer(registry).layer(router)
    }
}

fn html_response(problem: &ProblemError, html: String) -> Response {
    let mut response = (problem.status, Html(html)).into_response();
    extend_headers(&mut response, problem);
    response
}

fn plain_response(problem: &ProblemError, body: String) -> Response {
    let mut response = (problem.status, body).into_response();
    extend_headers(&mut response, problem);
    response
}

/// Copy the problem's own headers except its content type, which belongs to
/// the JSON representation.
fn extend_headers(response: &mut Response, problem: &ProblemError) {
    for (name, value) in &problem.headers {
        if name != header::CONTENT_TYPE {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
}

/// One-time setup of an [`ErrorsHandler`].
pub struct ErrorsHandlerBuilder {
    config: ErrorsConfig,
    problem_type: ProblemType,
    chain: NormalizationChain,
    response_builder: Arc<dyn ResponseBuilder>,
    renderer: Arc<dyn TemplateRenderer>,
    dispatcher: Option<Dispatcher>,
    dispatch_codes: Vec<StatusCode>,
}

impl Default for ErrorsHandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorsHandlerBuilder {
    pub fn new() -> Self {
        Self {
            config: ErrorsConfig::default(),
            problem_type: ProblemType::default(),
            chain: NormalizationChain::default(),
            response_builder: Arc::new(JsonResponseBuilder),
            renderer: Arc::new(BuiltinTemplates::default()),
            dispatcher: None,
            dispatch_codes: vec![StatusCode::NOT_FOUND, StatusCode::METHOD_NOT_ALLOWED],
        }
    }

    pub fn config(mut self, config: ErrorsConfig) -> Self {
        self.config = config;
        self
    }

    /// Problem family every normalized error belongs to; validated by
    /// [`build`](Self::build).
    pub fn problem_type(mut self, problem_type: ProblemType) -> Self {
        self.problem_type = problem_type;
        self
    }

    pub fn chain(mut self, chain: NormalizationChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn response_builder(mut self, builder: impl ResponseBuilder) -> Self {
        self.response_builder = Arc::new(builder);
        self
    }

    pub fn renderer(mut self, renderer: impl TemplateRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Takes precedence over the dispatcher named in the configuration.
    pub fn dispatcher(mut self, dispatcher: impl Into<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher.into());
        self
    }

    pub fn dispatch_codes(mut self, codes: impl IntoIterator<Item = StatusCode>) -> Self {
        self.dispatch_codes = codes.into_iter().collect();
        self
    }

    /// # Errors
    ///
    /// Fails when the problem type is invalid. An unknown dispatcher name is
    /// logged and leaves the handler without a dispatcher.
    pub fn build(self) -> Result<ErrorsHandler> {
        self.problem_type.validate()?;

        let dispatcher = match (self.dispatcher, self.config.dispatcher.as_deref()) {
            (Some(dispatcher), _) => Some(dispatcher),
            (None, Some(name)) => match Dispatcher::from_name(name) {
                Ok(dispatcher) => Some(dispatcher),
                Err(e) => {
                    tracing::error!("{}", e);
                    None
                }
            },
            (None, None) => None,
        };

        Ok(ErrorsHandler {
            inner: Arc::new(Inner {
                config: self.config,
                problem_type: self.problem_type,
                chain: self.chain,
                response_builder: self.response_builder,
                renderer: self.renderer,
                dispatcher,
                dispatch_codes: self.dispatch_codes,
            }),
        })
    }
}
