use axum::ServiceExt;
use axum::extract::Request;
use axum::routing::get;
use errors_handler::prelude::*;
use tower_http::trace::TraceLayer;

async fn api_index() -> Result<&'static str, Exception> {
    Err(abort(StatusCode::INTERNAL_SERVER_ERROR, "Error from app"))
}

async fn api_crash() -> Result<&'static str, Exception> {
    Err(anyhow::anyhow!("database connection refused").into())
}

async fn web_index() -> Result<&'static str, Exception> {
    Err(abort(StatusCode::INTERNAL_SERVER_ERROR, "Error from web component"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("Starting errors demo...");

    let store = ConfigStore::from_env();
    store.set_default("ERROR_DISPATCHER", "urlprefix");
    let config = ErrorsConfig::from_store(&store)?;
    let errors = ErrorsHandler::new(config)?;

    let mut app = Component::app();
    errors.api_register(&mut app, None)?;

    let mut web = Component::new("web").with_url_prefix("/web");
    errors.web_register(&mut web, None)?;

    let registry = Arc::new(ComponentRegistry::new(app).with_component(web)?);

    let web_routes = Router::new()
        .route("/web", get(web_index))
        .layer(registry.layer("web").ok_or_else(|| anyhow::anyhow!("web component missing"))?);

    let router = Router::new()
        .route("/api", get(api_index))
        .route("/api/crash", get(api_crash))
        .merge(web_routes)
        .layer(registry.app_layer())
        .layer(TraceLayer::new_for_http());
    let service = errors.wrap(router, registry);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server running on http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Initiating graceful shutdown...");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
