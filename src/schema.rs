//! Database schema management for `estacion-meteo`.
//!
//! Ensures the six sensor tables and their indexes exist before serving
//! requests. Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

use crate::sensor::Sensor;

// ---

/// Value columns of each sensor table, after `id`.
fn value_columns(sensor: Sensor) -> &'static str {
    // ---
    match sensor {
        Sensor::Temperature => "valor DOUBLE PRECISION NOT NULL, alerta BOOLEAN NOT NULL DEFAULT FALSE",
        Sensor::Humidity | Sensor::Pressure => "valor DOUBLE PRECISION NOT NULL",
        Sensor::Rain => "detectada BOOLEAN NOT NULL, alerta BOOLEAN NOT NULL DEFAULT FALSE",
        Sensor::SoilMoisture => "valor_raw INTEGER NOT NULL, valor_porcentaje DOUBLE PRECISION NOT NULL",
        Sensor::Gas => "valor_raw INTEGER NOT NULL, alerta BOOLEAN NOT NULL DEFAULT FALSE",
    }
}

/// Create the database schema (idempotent).
///
/// Creates one append-only table per sensor plus an index on the
/// registration timestamp, which every read endpoint orders by. Safe to call
/// on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    for sensor in Sensor::ALL {
        let table = sensor.descriptor().table;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id             SERIAL PRIMARY KEY,
                {columns},
                fecha_registro TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            "#,
            columns = value_columns(sensor),
        ))
        .execute(&mut *tx)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE INDEX IF NOT EXISTS idx_{table}_fecha_registro
                ON {table} (fecha_registro);
            "#
        ))
        .execute(&mut *tx)
        .await?;

        tracing::debug!("Table {} ready", table);
    }

    tx.commit().await?;
    Ok(())
}
