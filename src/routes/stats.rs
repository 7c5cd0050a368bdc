//! Aggregate statistics of one sensor.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::{ApiError, ReadingStore, Sensor, SensorStats};

// ---

pub fn router<S: ReadingStore>() -> Router<AppState<S>> {
    // ---
    Router::new().route("/api/estadisticas/{sensor}", get(statistics::<S>))
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    sensor: &'static str,
    estadisticas: SensorStats,
}

/// `GET /api/estadisticas/{sensor}`: aggregates over the full table.
///
/// Only sensors with a numeric column qualify; rain is rejected like an
/// unknown sensor, before any query runs.
async fn statistics<S: ReadingStore>(
    Path(slug): Path<String>,
    State((store, _)): State<AppState<S>>,
) -> Result<Json<StatsResponse>, ApiError> {
    // ---
    info!("GET /api/estadisticas/{}", slug);

    let sensor = match slug.parse::<Sensor>() {
        Ok(sensor) if sensor.is_numeric() => sensor,
        _ => return Err(ApiError::NoStatistics(slug)),
    };

    let estadisticas = store
        .stats(sensor)
        .await
        .map_err(ApiError::storage("Error al calcular estadísticas"))?
        .ok_or(ApiError::NoStatistics(slug))?;

    Ok(Json(StatsResponse {
        sensor: sensor.slug(),
        estadisticas,
    }))
}
