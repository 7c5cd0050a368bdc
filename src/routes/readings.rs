//! Ingestion of station readings and the consolidated latest view.
//!
//! - `POST /api/lecturas` validates one composite reading and writes it as
//!   six independent rows, one per sensor table.
//! - `GET /api/lecturas/ultima` returns the newest row of every table.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info};

use super::AppState;
use crate::models::NewReading;
use crate::validation;
use crate::{Alerts, ApiError, LatestView, RawReading, ReadingStore, Sensor};

// ---

pub fn router<S: ReadingStore>() -> Router<AppState<S>> {
    // ---
    Router::new()
        .route("/api/lecturas", post(create_reading::<S>))
        .route("/api/lecturas/ultima", get(latest::<S>))
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    status: &'static str,
    mensaje: &'static str,
    alertas: Alerts,
}

async fn create_reading<S: ReadingStore>(
    State((store, _)): State<AppState<S>>,
    body: Result<Json<RawReading>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    // ---
    info!("POST /api/lecturas");

    // A body that is not a JSON object counts as an empty reading
    let raw = match body {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            debug!("Unreadable reading body: {}", rejection.body_text());
            RawReading::default()
        }
    };

    if !validation::is_complete(&raw) {
        return Err(ApiError::Incomplete);
    }

    let reading = validation::parse_reading(&raw).map_err(ApiError::InvalidReading)?;
    let alerts = reading.alerts();
    debug!("Validated reading: {:?}, alerts: {:?}", reading, alerts);

    // The six inserts are independent: no transaction, rows that succeed
    // stay even if a sibling insert fails.
    let rows = reading.to_rows();
    let [temperature, humidity, pressure, rain, soil_moisture, gas] = &rows;
    let (t, h, p, r, s, g) = tokio::join!(
        store.insert(temperature),
        store.insert(humidity),
        store.insert(pressure),
        store.insert(rain),
        store.insert(soil_moisture),
        store.insert(gas),
    );

    let failures: Vec<String> = rows
        .iter()
        .map(NewReading::sensor)
        .zip([t, h, p, r, s, g])
        .filter_map(|(sensor, outcome)| {
            let e = outcome.err()?;
            error!("Failed to insert {} reading: {}", sensor, e);
            Some(format!("Error en {}", sensor.descriptor().label))
        })
        .collect();

    if !failures.is_empty() {
        return Err(ApiError::PartialInsert(failures));
    }

    info!("Reading stored, alerts: {:?}", alerts);
    Ok(Json(IngestResponse {
        status: "OK",
        mensaje: "Lecturas guardadas correctamente",
        alertas: alerts,
    }))
}

async fn latest<S: ReadingStore>(
    State((store, _)): State<AppState<S>>,
) -> Result<Json<LatestView>, ApiError> {
    // ---
    info!("GET /api/lecturas/ultima");

    let mut view = LatestView::default();
    for sensor in Sensor::ALL {
        let row = store
            .latest(sensor)
            .await
            .map_err(ApiError::storage("Error en la consulta"))?;
        view.set(sensor, row.as_ref());
    }

    Ok(Json(view))
}
