use crate::handlers::{get_product, search_products, submit_nutriments};
use axum::{
    Router,
    routing::{get, post},
};
use dotenvy::dotenv;
use errors::{AppError, Result};
use off_client::{OffClient, load_config};
use state::AppState;
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod errors;
mod handlers;
mod models;
mod state;

const DEFAULT_PORT: u16 = 8004;

async fn health_check() -> &'static str {
    "Food Facts Service OK"
}

fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/search", get(search_products))
        .route("/barcode/{code}", get(get_product))
        .route("/{code}/nutriments", post(submit_nutriments));

    Router::new()
        .nest("/api/v1/products", api_routes)
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .init();

    info!("Starting Food Facts Service...");

    let config = load_config().map_err(|e| {
        error!("Config loading failed: {}", e);
        AppError::Config(e)
    })?;
    info!("Remote API: {}", config.base_url);
    info!("User-Agent: {}", config.user_agent);

    let off_client = OffClient::new(&config)?;
    info!("Reqwest HTTP client created.");

    let app_state = Arc::new(AppState { off_client });
    let app = build_router(app_state);
    info!("Axum router configured.");

    let port = match env::var("FOOD_FACTS_SERVICE_PORT") {
        Ok(port_str) => port_str.parse::<u16>().unwrap_or_else(|e| {
            error!(
                "Invalid port '{}': {}. Defaulting to {}",
                port_str, e, DEFAULT_PORT
            );
            DEFAULT_PORT
        }),
        Err(_) => {
            info!(
                "FOOD_FACTS_SERVICE_PORT not set, defaulting to {}",
                DEFAULT_PORT
            );
            DEFAULT_PORT
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    warn!("Credentials for data submission are forwarded as received; serve over TLS only.");
    info!(
        "Food Facts Service successfully started, listening on {}",
        addr
    );

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
