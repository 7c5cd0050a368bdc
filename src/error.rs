//! Error types returned by the storage layer and the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::sensor::Sensor;

// ---

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Every way a request can fail, mapped to a status code and JSON body by
/// [`IntoResponse`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("reading is missing required fields")]
    Incomplete,

    #[error("reading failed validation: {0:?}")]
    InvalidReading(Vec<String>),

    #[error("invalid query parameters: {0:?}")]
    InvalidParams(Vec<String>),

    #[error("unknown sensor: {0}")]
    UnknownSensor(String),

    #[error("sensor has no statistics: {0}")]
    NoStatistics(String),

    /// Storage failure. `message` is what the caller sees, `source` is only
    /// logged.
    #[error("{message}: {source}")]
    Storage {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{} of the inserts failed", .0.len())]
    PartialInsert(Vec<String>),
}

impl ApiError {
    /// Wrap a storage error with the message shown to the caller.
    pub fn storage(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| ApiError::Storage { message, source }
    }

    fn status_and_body(&self) -> (StatusCode, Value) {
        // ---
        match self {
            ApiError::Incomplete => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Datos incompletos",
                    "mensaje": "Todos los campos son requeridos: temperatura, humedad, presion, lluvia, humedadSuelo, gas",
                }),
            ),
            ApiError::InvalidReading(detalles) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Datos inválidos", "detalles": detalles }),
            ),
            ApiError::InvalidParams(detalles) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Parámetros inválidos", "detalles": detalles }),
            ),
            ApiError::UnknownSensor(_) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Sensor inválido",
                    "sensores_validos": Sensor::valid_slugs(),
                }),
            ),
            ApiError::NoStatistics(_) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Sensor inválido para estadísticas",
                    "sensores_validos": Sensor::numeric_slugs(),
                }),
            ),
            ApiError::Storage { message, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
            ApiError::PartialInsert(detalles) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Error parcial al guardar datos", "detalles": detalles }),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        match &self {
            ApiError::Storage { .. } | ApiError::PartialInsert(_) => tracing::error!("{}", self),
            _ => tracing::debug!("Rejected request: {}", self),
        }

        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_storage_error_is_not_leaked() {
        // ---
        let err = ApiError::storage("Error en la consulta")(StoreError::Sql(sqlx::Error::PoolClosed));
        let (status, body) = err.status_and_body();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Error en la consulta" }));
    }

    #[test]
    fn test_unknown_sensor_lists_valid_sensors() {
        // ---
        let (status, body) = ApiError::UnknownSensor("viento".into()).status_and_body();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["sensores_validos"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_partial_insert_lists_failures() {
        // ---
        let err = ApiError::PartialInsert(vec!["Error en gas".into()]);
        let (status, body) = err.status_and_body();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detalles"], json!(["Error en gas"]));
    }
}
