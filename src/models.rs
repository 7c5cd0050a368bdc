//! Data models for the weather station API.
//!
//! Three families of types live here:
//! - the submitted reading as it arrives over HTTP ([`RawReading`]) and its
//!   validated, typed form ([`Reading`]);
//! - the per-table rows written on ingestion ([`NewReading`]) and read back
//!   by the query endpoints ([`SensorRow`]);
//! - aggregated views ([`LatestView`], [`SensorStats`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sensor::Sensor;

// ---

/// Alert threshold for temperature, in °C (strictly greater triggers).
pub const TEMPERATURE_ALERT_C: f64 = 35.0;

/// Alert threshold for the raw gas reading (strictly greater triggers).
pub const GAS_ALERT_RAW: i32 = 600;

/// Full scale of the station's analog inputs.
pub const ANALOG_FULL_SCALE: i32 = 1023;

/// Reading as submitted by the station.
///
/// Fields are kept as loose JSON so that presence, format and range can be
/// reported separately; the station may send numbers or strings.
#[derive(Debug, Default, Deserialize)]
pub struct RawReading {
    // ---
    pub temperatura: Option<Value>,
    pub humedad: Option<Value>,
    pub presion: Option<Value>,
    pub lluvia: Option<Value>,
    #[serde(rename = "humedadSuelo")]
    pub humedad_suelo: Option<Value>,
    pub gas: Option<Value>,
}

/// A reading that passed format and range validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    // ---
    pub temperature_c: f64,
    pub humidity: f64,
    pub pressure_hpa: f64,
    pub rain_detected: bool,
    pub soil_moisture_raw: i32,
    pub gas_raw: i32,
}

/// Alert flags reported back to the station after ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Alerts {
    pub temperatura: bool,
    pub gas: bool,
    pub lluvia: bool,
}

/// One row to be inserted, tagged by the table it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum NewReading {
    Temperature { valor: f64, alerta: bool },
    Humidity { valor: f64 },
    Pressure { valor: f64 },
    Rain { detectada: bool, alerta: bool },
    SoilMoisture { valor_raw: i32, valor_porcentaje: f64 },
    Gas { valor_raw: i32, alerta: bool },
}

impl NewReading {
    pub fn sensor(&self) -> Sensor {
        // ---
        match self {
            NewReading::Temperature { .. } => Sensor::Temperature,
            NewReading::Humidity { .. } => Sensor::Humidity,
            NewReading::Pressure { .. } => Sensor::Pressure,
            NewReading::Rain { .. } => Sensor::Rain,
            NewReading::SoilMoisture { .. } => Sensor::SoilMoisture,
            NewReading::Gas { .. } => Sensor::Gas,
        }
    }
}

/// Convert a raw analog soil-moisture value into a percentage rounded to two
/// decimals.
pub fn soil_moisture_percentage(raw: i32) -> f64 {
    // ---
    let percentage = f64::from(raw) / f64::from(ANALOG_FULL_SCALE) * 100.0;
    (percentage * 100.0).round() / 100.0
}

impl Reading {
    // ---
    pub fn alerts(&self) -> Alerts {
        // ---
        Alerts {
            temperatura: self.temperature_c > TEMPERATURE_ALERT_C,
            gas: self.gas_raw > GAS_ALERT_RAW,
            lluvia: self.rain_detected,
        }
    }

    /// Split the reading into the six rows persisted per submission, with
    /// derived fields already computed.
    pub fn to_rows(&self) -> [NewReading; 6] {
        // ---
        let alerts = self.alerts();

        [
            NewReading::Temperature {
                valor: self.temperature_c,
                alerta: alerts.temperatura,
            },
            NewReading::Humidity {
                valor: self.humidity,
            },
            NewReading::Pressure {
                valor: self.pressure_hpa,
            },
            NewReading::Rain {
                detectada: self.rain_detected,
                alerta: alerts.lluvia,
            },
            NewReading::SoilMoisture {
                valor_raw: self.soil_moisture_raw,
                valor_porcentaje: soil_moisture_percentage(self.soil_moisture_raw),
            },
            NewReading::Gas {
                valor_raw: self.gas_raw,
                alerta: alerts.gas,
            },
        ]
    }
}

// ---

/// Row of `lecturas_temperatura`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TemperatureRow {
    pub id: i32,
    pub valor: f64,
    pub alerta: bool,
    pub fecha_registro: DateTime<Utc>,
}

/// Row of `lecturas_humedad` and `lecturas_presion`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct LevelRow {
    pub id: i32,
    pub valor: f64,
    pub fecha_registro: DateTime<Utc>,
}

/// Row of `lecturas_lluvia`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RainRow {
    pub id: i32,
    pub detectada: bool,
    pub alerta: bool,
    pub fecha_registro: DateTime<Utc>,
}

/// Row of `lecturas_humedad_suelo`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SoilMoistureRow {
    pub id: i32,
    pub valor_raw: i32,
    pub valor_porcentaje: f64,
    pub fecha_registro: DateTime<Utc>,
}

/// Row of `lecturas_gas`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct GasRow {
    pub id: i32,
    pub valor_raw: i32,
    pub alerta: bool,
    pub fecha_registro: DateTime<Utc>,
}

/// A stored row of any sensor table, serialized with that table's columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorRow {
    Temperature(TemperatureRow),
    Level(LevelRow),
    Rain(RainRow),
    SoilMoisture(SoilMoistureRow),
    Gas(GasRow),
}

impl SensorRow {
    pub fn fecha_registro(&self) -> DateTime<Utc> {
        // ---
        match self {
            SensorRow::Temperature(r) => r.fecha_registro,
            SensorRow::Level(r) => r.fecha_registro,
            SensorRow::Rain(r) => r.fecha_registro,
            SensorRow::SoilMoisture(r) => r.fecha_registro,
            SensorRow::Gas(r) => r.fecha_registro,
        }
    }

    /// Value shown for this row in the consolidated latest view.
    pub fn latest_value(&self) -> Value {
        // ---
        match self {
            SensorRow::Temperature(r) => Value::from(r.valor),
            SensorRow::Level(r) => Value::from(r.valor),
            SensorRow::Rain(r) => Value::from(r.detectada),
            SensorRow::SoilMoisture(r) => Value::from(r.valor_porcentaje),
            SensorRow::Gas(r) => Value::from(r.valor_raw),
        }
    }
}

/// Most recent value of every sensor, each taken from its own table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestView {
    pub temperatura: Option<Value>,
    pub temp_fecha: Option<DateTime<Utc>>,
    pub humedad: Option<Value>,
    pub hum_fecha: Option<DateTime<Utc>>,
    pub presion: Option<Value>,
    pub pres_fecha: Option<DateTime<Utc>>,
    pub lluvia: Option<Value>,
    pub lluvia_fecha: Option<DateTime<Utc>>,
    pub humedad_suelo: Option<Value>,
    pub suelo_fecha: Option<DateTime<Utc>>,
    pub gas: Option<Value>,
    pub gas_fecha: Option<DateTime<Utc>>,
}

impl LatestView {
    /// Fill in the fields belonging to `sensor` from its latest row, if any.
    pub fn set(&mut self, sensor: Sensor, row: Option<&SensorRow>) {
        // ---
        let value = row.map(SensorRow::latest_value);
        let fecha = row.map(SensorRow::fecha_registro);

        let (value_slot, fecha_slot) = match sensor {
            Sensor::Temperature => (&mut self.temperatura, &mut self.temp_fecha),
            Sensor::Humidity => (&mut self.humedad, &mut self.hum_fecha),
            Sensor::Pressure => (&mut self.presion, &mut self.pres_fecha),
            Sensor::Rain => (&mut self.lluvia, &mut self.lluvia_fecha),
            Sensor::SoilMoisture => (&mut self.humedad_suelo, &mut self.suelo_fecha),
            Sensor::Gas => (&mut self.gas, &mut self.gas_fecha),
        };
        *value_slot = value;
        *fecha_slot = fecha;
    }
}

/// Aggregates over the numeric column of one sensor table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct SensorStats {
    pub total_registros: i64,
    pub minimo: Option<f64>,
    pub maximo: Option<f64>,
    pub promedio: Option<f64>,
    pub primera_lectura: Option<DateTime<Utc>>,
    pub ultima_lectura: Option<DateTime<Utc>>,
}
