use axum::body::{Body, to_bytes};
use axum::http::{Request, header};
use axum::routing::get;
use errors_handler::dispatch::DispatchMiddleware;
use errors_handler::prelude::*;
use serde_json::Value;
use tower::ServiceExt;

const PROBLEM_JSON: &str = "application/problem+json";
const HTML: &str = "text/html; charset=utf-8";

type App = DispatchMiddleware<Router>;

async fn app_abort() -> Result<(), Exception> {
    Err(abort(StatusCode::INTERNAL_SERVER_ERROR, "Error from app"))
}

async fn app_error() -> Result<(), Exception> {
    Err(anyhow::anyhow!("exception from app").into())
}

async fn web_abort() -> Result<(), Exception> {
    Err(abort(StatusCode::INTERNAL_SERVER_ERROR, "Error from web component"))
}

async fn custom_abort() -> Result<(), Exception> {
    Err(abort(StatusCode::INTERNAL_SERVER_ERROR, "Error from custom component"))
}

async fn bad_request() -> Result<(), Exception> {
    Err(abort(StatusCode::BAD_REQUEST, "custom error"))
}

/// Application with an API root, a web component, a component with its own
/// plain text handler, and one without any handler.
fn application(config: ErrorsConfig) -> App {
    let errors = ErrorsHandler::new(config).unwrap();

    let mut app = Component::app();
    errors.api_register(&mut app, None).unwrap();

    let mut web = Component::new("web").with_url_prefix("/web");
    errors.web_register(&mut web, None).unwrap();

    let mut custom = Component::new("custom");
    ErrorsHandler::register(&mut custom, None, |exc: Exception, _: &RequestContext| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            exc.to_string(),
        )
            .into_response()
    })
    .unwrap();

    let registry = Arc::new(
        ComponentRegistry::new(app)
            .with_component(web)
            .unwrap()
            .with_component(custom)
            .unwrap()
            .with_component(Component::new("plain"))
            .unwrap(),
    );

    let web_routes = Router::new()
        .route("/web", get(web_abort))
        .layer(registry.layer("web").unwrap());
    let custom_routes = Router::new()
        .route("/custom", get(custom_abort))
        .layer(registry.layer("custom").unwrap());
    let plain_routes = Router::new()
        .route("/test", get(bad_request))
        .layer(registry.layer("plain").unwrap());

    let router = Router::new()
        .route("/api", get(app_abort))
        .route("/api/error", get(app_error))
        .merge(web_routes)
        .merge(custom_routes)
        .merge(plain_routes)
        .layer(registry.app_layer());

    errors.wrap(router, registry)
}

async fn get_path(app: App, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(response: &axum::response::Response) -> &str {
    response.headers()[header::CONTENT_TYPE].to_str().unwrap()
}

#[tokio::test]
async fn test_unknown_root_path_is_not_found() {
    let response = get_path(application(ErrorsConfig::default()), "/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), PROBLEM_JSON);
}

#[tokio::test]
async fn test_api_abort() {
    let response = get_path(application(ErrorsConfig::default()), "/api").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&response), PROBLEM_JSON);
    assert_eq!(body_json(response).await["detail"], "Error from app");
}

#[tokio::test]
async fn test_api_unhandled_error_hides_details() {
    let response = get_path(application(ErrorsConfig::default()), "/api/error").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&response), PROBLEM_JSON);

    let body = body_json(response).await;
    assert_eq!(body["status"], 500);
    assert_eq!(body["detail"], "Unhandled Exception");
}

#[tokio::test]
async fn test_api_unhandled_error_in_debug_shows_details() {
    let config = ErrorsConfig::default().with_debug(true);
    let response = get_path(application(config), "/api/error").await;

    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("exception from app"));
}

#[tokio::test]
async fn test_web_renders_page() {
    let response = get_path(application(ErrorsConfig::default()), "/web").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&response), HTML);
    assert!(body_text(response).await.contains("Error from web component"));
}

#[tokio::test]
async fn test_web_xhr_gets_problem_document() {
    let app = application(ErrorsConfig::default());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/web")
                .header("X-Requested-With", "XMLHttpRequest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&response), PROBLEM_JSON);
}

#[tokio::test]
async fn test_web_without_error_page() {
    let config = ErrorsConfig::default().with_error_page(None);
    let response = get_path(application(config), "/web").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Unhandled Exception");
}

#[tokio::test]
async fn test_custom_handler() {
    let response = get_path(application(ErrorsConfig::default()), "/custom").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&response), "text/plain");
    assert_eq!(
        body_text(response).await,
        "500 Internal Server Error: Error from custom component"
    );
}

#[tokio::test]
async fn test_component_without_handlers_bubbles_to_app() {
    let response = get_path(application(ErrorsConfig::default()), "/test").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content_type(&response), PROBLEM_JSON);
}

#[tokio::test]
async fn test_unmatched_path_outside_prefixes_gets_generic_problem() {
    let config = ErrorsConfig::default().with_dispatcher("urlprefix");
    let response = get_path(application(config), "/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), PROBLEM_JSON);
    let body = body_json(response).await;
    assert_eq!(body["type"], "https://httpstatuses.com/404");
    assert_eq!(body["title"], "Not Found");
}

#[tokio::test]
async fn test_unmatched_path_under_prefix_goes_to_component() {
    let config = ErrorsConfig::default().with_dispatcher("urlprefix");
    let response = get_path(application(config), "/web/missing").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), HTML);
}

#[tokio::test]
async fn test_wrong_method_lists_allowed_methods() {
    let app = application(ErrorsConfig::default());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");

    let body = body_json(response).await;
    assert!(body["type"].as_str().unwrap().ends_with("/405"));
    assert_eq!(body["status"], 405);
    assert_eq!(body["response"]["Allow"], serde_json::json!(["GET", "HEAD"]));
}

#[tokio::test]
async fn test_first_registered_prefix_wins() {
    let errors = ErrorsHandler::new(ErrorsConfig::default().with_dispatcher("urlprefix")).unwrap();

    let tagged = |name: &'static str, prefix: &str| {
        let mut component = Component::new(name).with_url_prefix(prefix);
        component
            .register(
                Some(StatusCode::NOT_FOUND),
                move |_: Exception, _: &RequestContext| {
                    (StatusCode::NOT_FOUND, name).into_response()
                },
            )
            .unwrap();
        component
    };

    let registry = Arc::new(
        ComponentRegistry::new(Component::app())
            .with_component(tagged("api", "/api"))
            .unwrap()
            .with_component(tagged("api_v2", "/api/v2"))
            .unwrap(),
    );
    let app = errors.wrap(Router::new().route("/", get(|| async { "home" })), registry);

    let response = get_path(app, "/api/v2/x").await;
    assert_eq!(body_text(response).await, "api");
}

#[tokio::test]
async fn test_subdomain_dispatch_without_server_name_is_default() {
    let errors = ErrorsHandler::new(ErrorsConfig::default().with_dispatcher("subdomain")).unwrap();

    let mut api = Component::new("api").with_subdomain("api");
    ErrorsHandler::register(
        &mut api,
        Some(StatusCode::NOT_FOUND),
        |_: Exception, _: &RequestContext| (StatusCode::NOT_FOUND, "api").into_response(),
    )
    .unwrap();
    let registry = Arc::new(ComponentRegistry::new(Component::app()).with_component(api).unwrap());

    let app = errors.wrap(Router::new().route("/", get(|| async { "home" })), registry);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/missing")
                .header(header::HOST, "api.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), PROBLEM_JSON);
}

#[tokio::test]
async fn test_subdomain_dispatch_with_server_name() {
    let config = ErrorsConfig::default()
        .with_dispatcher("subdomain")
        .with_server_name("example.com");
    let errors = ErrorsHandler::new(config).unwrap();

    let mut api = Component::new("api").with_subdomain("api");
    ErrorsHandler::register(
        &mut api,
        Some(StatusCode::NOT_FOUND),
        |_: Exception, _: &RequestContext| (StatusCode::NOT_FOUND, "api").into_response(),
    )
    .unwrap();
    let registry = Arc::new(ComponentRegistry::new(Component::app()).with_component(api).unwrap());

    let app = errors.wrap(Router::new().route("/", get(|| async { "home" })), registry);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/missing")
                .header(header::HOST, "api.example.com:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(body_text(response).await, "api");
}
