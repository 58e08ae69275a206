use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cf_recommender::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PgCatalogRepository},
    services::{providers::CodeforcesClient, CatalogStore, RefreshScheduler},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cf_recommender=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let mut client = CodeforcesClient::new(config.codeforces_api_url.clone(), config.http_timeout())?;

    let cache_writer = match &config.redis_url {
        Some(redis_url) => {
            let (cache, writer) = Cache::new(create_redis_client(redis_url)?);
            client = client.with_cache(cache, config.user_cache_ttl_secs);
            tracing::info!("User history caching enabled");
            Some(writer)
        }
        None => {
            tracing::info!("REDIS_URL not set, user history caching disabled");
            None
        }
    };
    let client = Arc::new(client);

    let store = CatalogStore::new();
    let scheduler = RefreshScheduler::new(
        client.clone(),
        Arc::new(PgCatalogRepository::new(pool)),
        store.clone(),
        config.refresh_interval(),
    );
    let outcome = scheduler.bootstrap().await;
    tracing::info!(?outcome, "Catalog bootstrap finished");
    let refresh = scheduler.start();

    let state = AppState::new(store.reader(), client);
    let app = create_router(state, &config.cors_origins);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh.stop().await;
    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
