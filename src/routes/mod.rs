//! Route gateway: every endpoint group lives in its own sibling module and
//! exports a subrouter, merged here with the shared state.
//!
//! Cross-origin requests are allowed from anywhere so that the station
//! dashboard can be served from a different origin.

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::{Config, ReadingStore};

mod health;
mod readings;
mod search;
mod sensors;
mod stats;


// ---

/// Shared state of every handler: the injected storage handle and the
/// loaded configuration.
pub type AppState<S> = (S, Config);

pub fn router<S: ReadingStore>(store: S, config: Config) -> Router {
    // ---
    Router::new()
        .merge(readings::router::<S>())
        .merge(sensors::router::<S>())
        .merge(search::router::<S>())
        .merge(stats::router::<S>())
        .merge(health::router())
        .with_state((store, config))
        .layer(CorsLayer::permissive())
}
