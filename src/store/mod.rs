//! Storage handle for the sensor tables.
//!
//! Handlers only see the [`ReadingStore`] trait; the application injects a
//! [`PgStore`] wrapping the connection pool, tests inject an in-memory store.

use std::future::Future;

use crate::error::StoreError;
use crate::models::{NewReading, SensorRow, SensorStats};
use crate::query::ReadingFilter;
use crate::sensor::Sensor;

mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

// ---

/// Persistence operations needed by the API.
pub trait ReadingStore: Clone + Send + Sync + 'static {
    /// Append one row to its sensor table.
    fn insert(&self, row: &NewReading) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Rows of `sensor` matching `filter`, newest first.
    fn list(
        &self,
        sensor: Sensor,
        filter: &ReadingFilter,
    ) -> impl Future<Output = Result<Vec<SensorRow>, StoreError>> + Send;

    /// Aggregates over the whole table of `sensor`, or `None` when the sensor
    /// has no numeric column.
    fn stats(
        &self,
        sensor: Sensor,
    ) -> impl Future<Output = Result<Option<SensorStats>, StoreError>> + Send;

    /// Most recent row of `sensor`, if the table has any.
    fn latest(
        &self,
        sensor: Sensor,
    ) -> impl Future<Output = Result<Option<SensorRow>, StoreError>> + Send {
        async move {
            let rows = self.list(sensor, &ReadingFilter::latest()).await;
            rows.map(|rows| rows.into_iter().next())
        }
    }
}
