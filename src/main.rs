//! MyRatingIs API server

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use myratingis_api::{
    config::Args,
    db::{FeedbackStore, InMemoryStore, MongoClient, MongoStore},
    server::{self, AppState},
};

fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("myratingis_api={},info", args.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connect to MongoDB, falling back to the in-memory store in dev mode
async fn connect_store(args: &Args) -> anyhow::Result<(Arc<dyn FeedbackStore>, &'static str)> {
    match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully (database: {})", client.db_name());
            let store = MongoStore::new(&client).await?;
            Ok((Arc::new(store), "mongodb"))
        }
        Err(e) if args.dev_mode => {
            warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
            Ok((Arc::new(InMemoryStore::new()), "memory"))
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  MyRatingIs API {}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Site: {}", args.site_origin());
    info!("Identity provider: {}", args.auth_url.as_deref().unwrap_or("(not configured)"));
    info!("Preview service: {}", args.og_service_url);
    info!("======================================");

    let (store, backend) = match connect_store(&args).await {
        Ok(connected) => connected,
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(args, store, backend)?);
    server::run(state).await?;

    info!("MyRatingIs API stopped");
    Ok(())
}
