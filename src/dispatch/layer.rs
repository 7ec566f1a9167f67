use crate::component::ComponentRegistry;
use crate::context::RequestContext;
use crate::exception::{Exception, Handled, HttpException, RaisedException};
use crate::handler::ErrorsHandler;
use axum::body::{Body, HttpBody};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer answering requests no route matched.
///
/// The router's bare "not found" and "method not allowed" responses go to
/// the configured dispatcher. Without one they go to the application
/// component's handler, and pass through untouched when it has none.
///
/// Wrap the finished [`Router`](axum::Router) with it (see
/// [`ErrorsHandler::wrap`]) rather than attaching it with `Router::layer`:
/// axum sets the `Allow` header of a 405 outside of route layers, so a
/// route-level layer never sees the allowed methods.
#[derive(Clone)]
pub struct DispatchLayer {
    errors: ErrorsHandler,
    registry: Arc<ComponentRegistry>,
}

impl DispatchLayer {
    pub fn new(errors: ErrorsHandler, registry: Arc<ComponentRegistry>) -> Self {
        Self { errors, registry }
    }
}

impl<S> Layer<S> for DispatchLayer {
    type Service = DispatchMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DispatchMiddleware {
            inner,
            errors: self.errors.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

#[derive(Clone)]
pub struct DispatchMiddleware<S> {
    inner: S,
    errors: ErrorsHandler,
    registry: Arc<ComponentRegistry>,
}

impl<S> Service<Request<Body>> for DispatchMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let ctx = RequestContext::from_request(&request);
        let errors = self.errors.clone();
        let registry = Arc::clone(&self.registry);

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(request).await?;
            if !is_unrouted(&response, errors.dispatch_codes()) {
                return Ok(response);
            }

            let exception = unrouted_exception(&response);
            tracing::debug!(
                method = %ctx.method,
                path = %ctx.path,
                status = response.status().as_u16(),
                "No route matched"
            );

            let handled = if errors.dispatcher().is_some() {
                errors.dispatch(exception, &ctx, &registry)
            } else {
                registry
                    .app()
                    .handler_for(&exception)
                    .map(|handler| handler(exception, &ctx))
            };

            Ok(match handled {
                Some(mut handled) => {
                    handled.extensions_mut().insert(Handled);
                    handled
                }
                None => response,
            })
        })
    }
}

/// The router's own empty answer for one of `codes`, as opposed to a
/// response some handler produced.
fn is_unrouted(response: &Response, codes: &[StatusCode]) -> bool {
    codes.contains(&response.status())
        && response.extensions().get::<Handled>().is_none()
        && response.extensions().get::<RaisedException>().is_none()
        && response.body().size_hint().exact() == Some(0)
}

fn unrouted_exception(response: &Response) -> Exception {
    match response.status() {
        StatusCode::NOT_FOUND => HttpException::not_found().into(),
        StatusCode::METHOD_NOT_ALLOWED => {
            HttpException::method_not_allowed(allowed_methods(response)).into()
        }
        status => HttpException::new(status).into(),
    }
}

fn allowed_methods(response: &Response) -> Option<Vec<Method>> {
    let allow = response.headers().get(header::ALLOW)?.to_str().ok()?;
    let methods: Vec<Method> = allow
        .split(',')
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .filter_map(|method| Method::from_bytes(method.as_bytes()).ok())
        .collect();
    (!methods.is_empty()).then_some(methods)
}
