//! `estacion-meteo`: HTTP API that stores weather station readings in
//! PostgreSQL and serves history, search and statistics over them.
//!
//! Startup order: logging, `.env` and configuration, connection pool,
//! table creation, then the router from [`routes`] bound on `HTTP_PORT`.
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `HTTP_PORT` (optional) – listening port (default: 3000)
//! - `QUERY_LIMIT_MAX` (optional) – cap on the `limit` query parameter
//! - `ESTACION_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `ESTACION_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{env, net::SocketAddr};

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::PgPoolOptions;
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

mod config;
mod error;
mod models;
mod query;
mod routes;
mod schema;
mod sensor;
mod store;
mod validation;

pub use config::Config;

// Re-exported for routes/*.rs, which only know about their parent module
pub use error::ApiError;
pub use models::{Alerts, LatestView, RawReading, SensorRow, SensorStats};
pub use query::{ListParams, ReadingFilter, SearchParams};
pub use sensor::Sensor;
pub use store::{PgStore, ReadingStore};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database: {}", cfg.masked_db_url());

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to connect to database '{}': {}",
                cfg.masked_db_url(),
                e
            )
        })?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    let app: Router = routes::router(PgStore::new(pool), cfg);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Install the global `tracing` subscriber. Call once, before anything logs.
///
/// - `RUST_LOG` wins when set; otherwise `ESTACION_LOG_LEVEL` (default `info`)
///   applies to the service, with SQL statement logging held at `warn`.
/// - `ESTACION_SPAN_EVENTS=full|enter_exit` adds span events beyond `CLOSE`.
/// - `FORCE_COLOR` overrides TTY detection for ANSI output.
fn init_tracing() {
    // ---
    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events(env::var("ESTACION_SPAN_EVENTS").ok().as_deref()))
        .with_env_filter(log_filter())
        .with_ansi(use_color(env::var("FORCE_COLOR").ok().as_deref()))
        .compact()
        .init();
}

fn log_filter() -> EnvFilter {
    // ---
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let level = env::var("ESTACION_LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    EnvFilter::new(filter_directives(level))
}

fn filter_directives(level: Level) -> String {
    format!("{level},sqlx::query=warn,tower_http=info").to_lowercase()
}

fn span_events(mode: Option<&str>) -> FmtSpan {
    // ---
    match mode {
        Some("full") => FmtSpan::FULL,
        Some("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    }
}

fn use_color(force: Option<&str>) -> bool {
    // ---
    match force.map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes") => true,
        Some("0" | "false" | "no") => false,
        _ => std::io::stdout().is_terminal(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_filter_directives() {
        // ---
        assert_eq!(
            filter_directives(Level::DEBUG),
            "debug,sqlx::query=warn,tower_http=info"
        );
    }

    #[test]
    fn test_span_events_default_to_close() {
        // ---
        assert_eq!(span_events(None), FmtSpan::CLOSE);
        assert_eq!(span_events(Some("bogus")), FmtSpan::CLOSE);
        assert_eq!(span_events(Some("full")), FmtSpan::FULL);
    }

    #[test]
    fn test_forced_color() {
        // ---
        assert!(use_color(Some("YES")));
        assert!(!use_color(Some("0")));
    }
}
