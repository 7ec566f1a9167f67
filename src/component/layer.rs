use crate::component::Component;
use crate::context::RequestContext;
use crate::exception::{Handled, RaisedException};
use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer answering raised exceptions with one component's handlers.
///
/// Exceptions the component has no handler for stay attached to the
/// response, so an enclosing layer (usually the application's) gets them.
#[derive(Clone)]
pub struct ErrorsLayer {
    component: Arc<Component>,
}

impl ErrorsLayer {
    pub fn new(component: Arc<Component>) -> Self {
        Self { component }
    }
}

impl<S> Layer<S> for ErrorsLayer {
    type Service = ErrorsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorsMiddleware {
            inner,
            component: Arc::clone(&self.component),
        }
    }
}

#[derive(Clone)]
pub struct ErrorsMiddleware<S> {
    inner: S,
    component: Arc<Component>,
}

impl<S> Service<Request<Body>> for ErrorsMiddleware<S>
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
        let component = Arc::clone(&self.component);

        // the clone is not ready yet; keep it and drive the ready one
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(request).await?;
            Ok(handle_raised(&component, response, &ctx))
        })
    }
}

/// Replace a placeholder response carrying a raised exception with the
/// component handler's response.
pub(crate) fn handle_raised(
    component: &Component,
    response: Response,
    ctx: &RequestContext,
) -> Response {
    let Some(slot) = response.extensions().get::<RaisedException>().cloned() else {
        return response;
    };
    let Some(exception) = slot.take() else {
        return response;
    };

    match component.handler_for(&exception) {
        Some(handler) => {
            tracing::debug!(
                component = component.name(),
                status = exception.status().as_u16(),
                "Handling raised exception"
            );
            let mut handled = handler(exception, ctx);
            handled.extensions_mut().insert(Handled);
            handled
        }
        None => {
            slot.restore(exception);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::{Exception, abort};
    use axum::Router;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use tower::ServiceExt;

    fn component_with_conflict_handler() -> Arc<Component> {
        let mut component = Component::new("api");
        component
            .register(Some(StatusCode::CONFLICT), |exc: Exception, ctx: &RequestContext| {
                (
                    exc.status(),
                    [(header::CONTENT_TYPE, "text/plain")],
                    format!("handled {} on {}", exc.status().as_u16(), ctx.path),
                )
                    .into_response()
            })
            .unwrap();
        Arc::new(component)
    }

    async fn conflict() -> Result<&'static str, Exception> {
        Err(abort(StatusCode::CONFLICT, "duplicate"))
    }

    async fn gone() -> Result<&'static str, Exception> {
        Err(abort(StatusCode::GONE, "removed"))
    }

    #[tokio::test]
    async fn test_registered_status_is_handled() {
        let app = Router::new()
            .route("/items", get(conflict))
            .layer(ErrorsLayer::new(component_with_conflict_handler()));

        let response = app
            .oneshot(Request::builder().uri("/items").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.extensions().get::<Handled>().is_some());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"handled 409 on /items");
    }

    #[tokio::test]
    async fn test_nested_component_sees_full_path() {
        let api = Router::new()
            .route("/items", get(conflict))
            .layer(ErrorsLayer::new(component_with_conflict_handler()));
        let app = Router::new().nest("/api", api);

        let response = app
            .oneshot(Request::builder().uri("/api/items").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"handled 409 on /api/items");
    }

    #[tokio::test]
    async fn test_unregistered_status_bubbles() {
        let app = Router::new()
            .route("/items", get(gone))
            .layer(ErrorsLayer::new(component_with_conflict_handler()));

        let response = app
            .oneshot(Request::builder().uri("/items").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GONE);
        let slot = response.extensions().get::<RaisedException>().unwrap();
        assert_eq!(slot.take().unwrap().status(), StatusCode::GONE);
    }
}
