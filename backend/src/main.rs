use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

use budgetwise_backend::domain::threshold_notifier::LogSink;
use budgetwise_backend::domain::tips::CannedTipsProvider;
use budgetwise_backend::domain::{
    BudgetService, ExpenseService, SavingsGoalService, SavingsRecordService, ThresholdNotifier,
};
use budgetwise_backend::rest::{api_router, AppState};
use budgetwise_backend::storage::memory::{MemoryBlobStore, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Setting up storage");
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());

    // The notifier watches aggregate updates for threshold crossings; it
    // stays subscribed for the lifetime of the process.
    let notifier = Arc::new(ThresholdNotifier::new(Arc::new(LogSink)));
    notifier.watch(store.as_ref());

    let state = AppState {
        budgets: Arc::new(BudgetService::new(store.clone(), blobs.clone())),
        expenses: Arc::new(ExpenseService::new(store.clone(), blobs.clone())),
        goals: Arc::new(SavingsGoalService::new(store.clone(), blobs.clone())),
        savings: Arc::new(SavingsRecordService::new(store.clone(), blobs.clone())),
        tips: Arc::new(CannedTipsProvider),
    };

    // CORS setup to allow the web frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", api_router(state))
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
