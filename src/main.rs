use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_discovery_api::{
    config::{Config, MovieSourceKind},
    db::{create_pool, create_redis_client, Cache, CacheWriterHandle},
    routes::{create_router, AppState},
    services::sources::{CachedMovieSource, MovieSource, PostgresMovieSource, SupabaseMovieSource},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_discovery_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (source, cache_writer) = build_movie_source(&config)?;
    tracing::info!(
        source = ?config.movie_source,
        table = %source.table_name(),
        cached = cache_writer.is_some(),
        "Movie source configured"
    );

    let state = AppState::new(source, config.discovery_settings());
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

/// Builds the configured data source, wrapped in the Redis cache when enabled
fn build_movie_source(
    config: &Config,
) -> anyhow::Result<(Arc<dyn MovieSource>, Option<CacheWriterHandle>)> {
    let source: Arc<dyn MovieSource> = match config.movie_source {
        MovieSourceKind::Postgres => {
            let pool = create_pool(&config.database_url, config.database_max_connections)?;
            Arc::new(PostgresMovieSource::new(pool, config.movie_table.clone())?)
        }
        MovieSourceKind::Supabase => {
            let url = config
                .supabase_url
                .clone()
                .context("SUPABASE_URL is not set")?;
            let key = config
                .supabase_anon_key
                .clone()
                .context("SUPABASE_ANON_KEY is not set")?;
            Arc::new(SupabaseMovieSource::new(url, key, config.movie_table.clone()))
        }
    };

    let Some(redis_url) = config.redis_url.as_deref() else {
        return Ok((source, None));
    };

    let client = create_redis_client(redis_url)?;
    let (cache, handle) = Cache::new(client, config.movie_table.clone());
    let cached: Arc<dyn MovieSource> =
        Arc::new(CachedMovieSource::new(source, cache, config.cache_ttl_secs));

    Ok((cached, Some(handle)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
