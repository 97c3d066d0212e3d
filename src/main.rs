use gears_dashboard::{
    config::Config,
    customer_cache::MokaCustomerCache,
    db::Database,
    directory::CustomerDirectory,
    handlers::AppState,
    mailer::HttpMailer,
    qbo_client::QboClient,
    routes::build_router,
    store::RecordStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the database pool and schema, the
/// customer cache, the QBO and mail clients, then serves the router with
/// per-IP rate limiting.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gears_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let cache = Arc::new(MokaCustomerCache::new(config.customer_cache_ttl()));
    tracing::info!(
        "Customer cache initialized ({}s TTL)",
        config.customer_cache_ttl_secs
    );

    let qbo = QboClient::from_config(&config)?;
    tracing::info!("✓ QBO client initialized: {}", config.qbo_base_url);

    let mailer = HttpMailer::from_config(&config)?;
    tracing::info!("✓ Mail client initialized: {}", config.mail_api_url);

    let directory = CustomerDirectory::new(
        cache,
        Arc::new(qbo.clone()),
        config.company_name_grammar(),
    );

    let app_state = Arc::new(AppState {
        store: RecordStore::new(db.pool.clone()),
        config: config.clone(),
        directory,
        qbo,
        mailer: Arc::new(mailer),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let app = build_router(app_state).layer(GovernorLayer {
        config: governor_conf,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
