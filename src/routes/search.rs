//! Filtered search over one sensor table.
//!
//! `GET /api/buscar/{sensor}` accepts a value range (`rango`, numeric sensors
//! only), a date interval and a `limit`, and echoes the filters it received.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::{ApiError, ReadingFilter, ReadingStore, SearchParams, Sensor, SensorRow};

// ---

pub fn router<S: ReadingStore>() -> Router<AppState<S>> {
    // ---
    Router::new().route("/api/buscar/{sensor}", get(search::<S>))
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    sensor: &'static str,
    total: usize,
    /// Filters as received, echoed back to the caller.
    filtros: SearchParams,
    datos: Vec<SensorRow>,
}

/// `GET /api/buscar/{sensor}?rango&fecha_inicio&fecha_fin&limit`
async fn search<S: ReadingStore>(
    Path(sensor): Path<String>,
    Query(params): Query<SearchParams>,
    State((store, config)): State<AppState<S>>,
) -> Result<Json<SearchResponse>, ApiError> {
    // ---
    info!("GET /api/buscar/{} {:?}", sensor, params);

    let sensor = sensor
        .parse::<Sensor>()
        .map_err(|unknown| ApiError::UnknownSensor(unknown.0))?;

    let filter = ReadingFilter::from_search(sensor, &params, config.query_limit_max)
        .map_err(ApiError::InvalidParams)?;

    let datos = store
        .list(sensor, &filter)
        .await
        .map_err(ApiError::storage("Error en la búsqueda"))?;

    info!("Search on {} matched {} rows", sensor, datos.len());
    Ok(Json(SearchResponse {
        sensor: sensor.slug(),
        total: datos.len(),
        filtros: params,
        datos,
    }))
}
