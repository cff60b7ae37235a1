mod api_docs;
mod config;
mod controllers;
mod models;
mod routes;
mod services;
mod shared_state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{response::Html, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::routes::prediction_routes::api_routes;
use crate::services::prediction_service::Predictor;
use crate::shared_state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    // 1. Load configuration
    let config = match Config::load("config.json") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config.json: {}", e);
            return;
        }
    };
    println!("Prediction service: {}", config.predictor.base_url);

    // 2. Initialize session state and the prediction client
    let state = AppState::new();
    let predictor = match Predictor::new(&config.predictor) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("Failed to build prediction client: {}", e);
            return;
        }
    };

    let shared = SharedState {
        app: state,
        predictor,
    };

    // 3. Start the HTTP server
    let server_port = config.server.port;
    let app = Router::new()
        .nest("/api", api_routes(shared))
        .route(
            "/scalar",
            get(|| async { Html(Scalar::new(ApiDoc::openapi()).to_html()) }),
        )
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    println!("API Server listening on http://{}", addr);
    println!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
        eprintln!("Server error: {}", e);
    }
}
