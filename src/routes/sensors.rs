//! Per-sensor history endpoints.
//!
//! One route per sensor (`/api/temperatura`, `/api/humedad`, ...), all served
//! by the same handler with the sensor fixed at registration. Each accepts
//! `limit`, `fecha_inicio` and `fecha_fin`.

use axum::{
    extract::{Query, State},
    routing::{get, MethodRouter},
    Json, Router,
};
use tracing::info;

use super::AppState;
use crate::{ApiError, ListParams, ReadingFilter, ReadingStore, Sensor, SensorRow};

// ---

pub fn router<S: ReadingStore>() -> Router<AppState<S>> {
    // ---
    Sensor::ALL.into_iter().fold(Router::new(), |router, sensor| {
        router.route(&format!("/api/{}", sensor.slug()), history_route::<S>(sensor))
    })
}

fn history_route<S: ReadingStore>(sensor: Sensor) -> MethodRouter<AppState<S>> {
    // ---
    get(move |query: Query<ListParams>, state: State<AppState<S>>| history(sensor, query, state))
}

async fn history<S: ReadingStore>(
    sensor: Sensor,
    Query(params): Query<ListParams>,
    State((store, config)): State<AppState<S>>,
) -> Result<Json<Vec<SensorRow>>, ApiError> {
    // ---
    info!("GET /api/{} {:?}", sensor, params);

    let filter = ReadingFilter::from_list(&params, config.query_limit_max)
        .map_err(ApiError::InvalidParams)?;

    let rows = store
        .list(sensor, &filter)
        .await
        .map_err(ApiError::storage("Error en la consulta"))?;

    info!("Returning {} {} rows", rows.len(), sensor);
    Ok(Json(rows))
}
