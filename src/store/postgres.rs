use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::ReadingStore;
use crate::error::StoreError;
use crate::models::{
    GasRow, LevelRow, NewReading, RainRow, SensorRow, SensorStats, SoilMoistureRow, TemperatureRow,
};
use crate::query::{self, ReadingFilter};
use crate::sensor::Sensor;

// ---

/// [`ReadingStore`] backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch<T>(&self, qb: &mut QueryBuilder<'static, Postgres>) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        // ---
        let rows = qb.build_query_as::<T>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

impl ReadingStore for PgStore {
    async fn insert(&self, row: &NewReading) -> Result<(), StoreError> {
        // ---
        query::insert_row(row).build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self, sensor: Sensor, filter: &ReadingFilter) -> Result<Vec<SensorRow>, StoreError> {
        // ---
        let mut qb = query::select_rows(sensor, filter);
        tracing::debug!("Query for {}: {}", sensor, qb.sql());

        let rows = match sensor {
            Sensor::Temperature => self
                .fetch::<TemperatureRow>(&mut qb)
                .await?
                .into_iter()
                .map(SensorRow::Temperature)
                .collect(),
            Sensor::Humidity | Sensor::Pressure => self
                .fetch::<LevelRow>(&mut qb)
                .await?
                .into_iter()
                .map(SensorRow::Level)
                .collect(),
            Sensor::Rain => self
                .fetch::<RainRow>(&mut qb)
                .await?
                .into_iter()
                .map(SensorRow::Rain)
                .collect(),
            Sensor::SoilMoisture => self
                .fetch::<SoilMoistureRow>(&mut qb)
                .await?
                .into_iter()
                .map(SensorRow::SoilMoisture)
                .collect(),
            Sensor::Gas => self
                .fetch::<GasRow>(&mut qb)
                .await?
                .into_iter()
                .map(SensorRow::Gas)
                .collect(),
        };

        Ok(rows)
    }

    async fn stats(&self, sensor: Sensor) -> Result<Option<SensorStats>, StoreError> {
        // ---
        let Some(sql) = query::select_stats(sensor) else {
            return Ok(None);
        };

        let stats = sqlx::query_as::<_, SensorStats>(&sql)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(stats))
    }
}
