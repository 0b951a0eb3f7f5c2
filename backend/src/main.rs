use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use backend::api;
use llmchess_arbiter::Arbiter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let arbiter = Arc::new(Arbiter::gemini_from_env());

    let addr: SocketAddr = std::env::var("LLMCHESS_BACKEND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()
        .expect("Invalid LLMCHESS_BACKEND_ADDR");

    let app = api::router(arbiter);
    tracing::info!("API listening on {}", addr);
    let listener = TcpListener::bind(addr).await.expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
