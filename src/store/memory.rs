//! In-memory [`ReadingStore`] used by the router tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::ReadingStore;
use crate::error::StoreError;
use crate::models::{
    GasRow, LevelRow, NewReading, RainRow, SensorRow, SensorStats, SoilMoistureRow, TemperatureRow,
};
use crate::query::ReadingFilter;
use crate::sensor::Sensor;

// ---

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<Sensor, Vec<SensorRow>>,
    next_id: i32,
    inserts: usize,
    failing: HashSet<Sensor>,
    calls: usize,
}

fn numeric_value(row: &SensorRow) -> Option<f64> {
    // ---
    match row {
        SensorRow::Temperature(r) => Some(r.valor),
        SensorRow::Level(r) => Some(r.valor),
        SensorRow::Rain(_) => None,
        SensorRow::SoilMoisture(r) => Some(f64::from(r.valor_raw)),
        SensorRow::Gas(r) => Some(f64::from(r.valor_raw)),
    }
}

impl MemoryStore {
    /// Base of the synthetic clock used by [`ReadingStore::insert`]; every
    /// insert advances it by one minute.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap()
    }

    /// Make every operation on `sensor` fail.
    pub fn fail(&self, sensor: Sensor) {
        self.inner.lock().unwrap().failing.insert(sensor);
    }

    /// Number of store operations served so far.
    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().calls
    }

    pub fn row_count(&self, sensor: Sensor) -> usize {
        // ---
        let inner = self.inner.lock().unwrap();
        inner.tables.get(&sensor).map_or(0, Vec::len)
    }

    /// Insert a row with an explicit registration timestamp.
    pub fn insert_at(&self, row: &NewReading, fecha_registro: DateTime<Utc>) {
        // ---
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;

        let stored = match *row {
            NewReading::Temperature { valor, alerta } => SensorRow::Temperature(TemperatureRow {
                id,
                valor,
                alerta,
                fecha_registro,
            }),
            NewReading::Humidity { valor } | NewReading::Pressure { valor } => {
                SensorRow::Level(LevelRow {
                    id,
                    valor,
                    fecha_registro,
                })
            }
            NewReading::Rain { detectada, alerta } => SensorRow::Rain(RainRow {
                id,
                detectada,
                alerta,
                fecha_registro,
            }),
            NewReading::SoilMoisture {
                valor_raw,
                valor_porcentaje,
            } => SensorRow::SoilMoisture(SoilMoistureRow {
                id,
                valor_raw,
                valor_porcentaje,
                fecha_registro,
            }),
            NewReading::Gas { valor_raw, alerta } => SensorRow::Gas(GasRow {
                id,
                valor_raw,
                alerta,
                fecha_registro,
            }),
        };

        inner.tables.entry(row.sensor()).or_default().push(stored);
    }

    fn begin(&self, sensor: Sensor) -> Result<(), StoreError> {
        // ---
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if inner.failing.contains(&sensor) {
            return Err(StoreError::Sql(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

impl ReadingStore for MemoryStore {
    async fn insert(&self, row: &NewReading) -> Result<(), StoreError> {
        // ---
        self.begin(row.sensor())?;

        let at = {
            let mut inner = self.inner.lock().unwrap();
            inner.inserts += 1;
            Self::epoch() + Duration::minutes(inner.inserts as i64)
        };
        self.insert_at(row, at);
        Ok(())
    }

    async fn list(&self, sensor: Sensor, filter: &ReadingFilter) -> Result<Vec<SensorRow>, StoreError> {
        // ---
        self.begin(sensor)?;

        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<SensorRow> = inner
            .tables
            .get(&sensor)
            .into_iter()
            .flatten()
            .filter(|row| match (filter.range, numeric_value(row)) {
                (Some((min, max)), Some(value)) => value >= min && value <= max,
                _ => true,
            })
            .filter(|row| filter.from.map_or(true, |from| row.fecha_registro() >= from))
            .filter(|row| filter.until.map_or(true, |until| row.fecha_registro() <= until))
            .cloned()
            .collect();

        // Newest first; ties keep the highest id first
        rows.reverse();
        rows.sort_by_key(|row| std::cmp::Reverse(row.fecha_registro()));
        rows.truncate(filter.limit as usize);
        Ok(rows)
    }

    async fn stats(&self, sensor: Sensor) -> Result<Option<SensorStats>, StoreError> {
        // ---
        self.begin(sensor)?;
        if !sensor.is_numeric() {
            return Ok(None);
        }

        let inner = self.inner.lock().unwrap();
        let rows = inner.tables.get(&sensor).map(Vec::as_slice).unwrap_or_default();
        let values: Vec<f64> = rows.iter().filter_map(numeric_value).collect();

        if values.is_empty() {
            return Ok(Some(SensorStats::default()));
        }

        Ok(Some(SensorStats {
            total_registros: values.len() as i64,
            minimo: values.iter().copied().reduce(f64::min),
            maximo: values.iter().copied().reduce(f64::max),
            promedio: Some(values.iter().sum::<f64>() / values.len() as f64),
            primera_lectura: rows.iter().map(SensorRow::fecha_registro).min(),
            ultima_lectura: rows.iter().map(SensorRow::fecha_registro).max(),
        }))
    }
}
