//! Stride API server binary.
//!
//! Serves the admin-session endpoints, backed by the Postgres user/role store.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use stride_core::auth::queries::PgPrivilegeLookup;
use stride_core::clock::{Clock, SystemClock};
use stride_core::session::{AdminSessionCache, AuthorizationGate};
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "stride_api_server", about = "Stride admin-session API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/stride"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Seconds between sweeps of expired admin sessions.
    #[arg(long, default_value_t = 60)]
    session_sweep_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new("info,stride_api=debug,stride_core=debug")
    })?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let args = Args::parse();

    let mut config = stride_api::config::ApiConfig::from_env()?;
    config.bind_addr = args.bind_addr;
    config.pg_connection_url = args.database_url;

    info!(
        bind_addr = %config.bind_addr,
        max_token_age_secs = config.gate.max_token_age.num_seconds(),
        session_ttl_secs = config.gate.session_ttl.num_seconds(),
        "starting stride_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_lazy(&config.pg_connection_url)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(AdminSessionCache::new(clock.clone()));
    let sweeper = cache.spawn_cleanup_task(Duration::from_secs(args.session_sweep_secs.max(1)));

    let gate = AuthorizationGate::new(
        config.gate,
        cache,
        Arc::new(PgPrivilegeLookup::new(pool)),
        clock,
    );

    let state = stride_api::AppState {
        config: config.clone(),
        gate: Arc::new(gate),
    };

    let app = stride_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    sweeper.abort();
    Ok(())
}
