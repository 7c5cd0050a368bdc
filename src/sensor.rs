//! Sensor selector and per-table descriptors.
//!
//! Every sensor of the station lives in its own append-only table. The shape
//! of those tables differs only in the value columns, so everything that
//! needs a table or column name goes through [`Sensor::descriptor`] instead
//! of hard-coding SQL identifiers. Identifiers never come from user input:
//! a request names a sensor by slug, the slug is parsed into [`Sensor`], and
//! only then is the descriptor consulted.

use std::fmt;
use std::str::FromStr;

// ---

/// One of the six physical sensors of the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Temperature,
    Humidity,
    Pressure,
    Rain,
    SoilMoisture,
    Gas,
}

/// Static description of the table backing a sensor.
#[derive(Debug)]
pub struct SensorDescriptor {
    /// URL slug, also echoed back in search and statistics responses.
    pub slug: &'static str,

    /// Name used when reporting a failed insert.
    pub label: &'static str,

    pub table: &'static str,

    /// Column filtered by the `rango` search parameter and aggregated by the
    /// statistics endpoint. `None` for sensors without a numeric column.
    pub value_column: Option<&'static str>,

    /// Columns written on ingestion, in bind order.
    pub insert_columns: &'static [&'static str],
}

const TEMPERATURE: SensorDescriptor = SensorDescriptor {
    slug: "temperatura",
    label: "temperatura",
    table: "lecturas_temperatura",
    value_column: Some("valor"),
    insert_columns: &["valor", "alerta"],
};

const HUMIDITY: SensorDescriptor = SensorDescriptor {
    slug: "humedad",
    label: "humedad",
    table: "lecturas_humedad",
    value_column: Some("valor"),
    insert_columns: &["valor"],
};

const PRESSURE: SensorDescriptor = SensorDescriptor {
    slug: "presion",
    label: "presión",
    table: "lecturas_presion",
    value_column: Some("valor"),
    insert_columns: &["valor"],
};

const RAIN: SensorDescriptor = SensorDescriptor {
    slug: "lluvia",
    label: "lluvia",
    table: "lecturas_lluvia",
    value_column: None,
    insert_columns: &["detectada", "alerta"],
};

const SOIL_MOISTURE: SensorDescriptor = SensorDescriptor {
    slug: "humedad-suelo",
    label: "humedad_suelo",
    table: "lecturas_humedad_suelo",
    value_column: Some("valor_raw"),
    insert_columns: &["valor_raw", "valor_porcentaje"],
};

const GAS: SensorDescriptor = SensorDescriptor {
    slug: "gas",
    label: "gas",
    table: "lecturas_gas",
    value_column: Some("valor_raw"),
    insert_columns: &["valor_raw", "alerta"],
};

impl Sensor {
    /// All sensors, in the order readings are submitted and reported.
    pub const ALL: [Sensor; 6] = [
        Sensor::Temperature,
        Sensor::Humidity,
        Sensor::Pressure,
        Sensor::Rain,
        Sensor::SoilMoisture,
        Sensor::Gas,
    ];

    pub fn descriptor(self) -> &'static SensorDescriptor {
        // ---
        match self {
            Sensor::Temperature => &TEMPERATURE,
            Sensor::Humidity => &HUMIDITY,
            Sensor::Pressure => &PRESSURE,
            Sensor::Rain => &RAIN,
            Sensor::SoilMoisture => &SOIL_MOISTURE,
            Sensor::Gas => &GAS,
        }
    }

    pub fn slug(self) -> &'static str {
        self.descriptor().slug
    }

    /// Whether the sensor has a numeric column that can be range-filtered
    /// and aggregated.
    pub fn is_numeric(self) -> bool {
        self.descriptor().value_column.is_some()
    }

    /// Slugs accepted by the search endpoint.
    pub fn valid_slugs() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.slug()).collect()
    }

    /// Slugs accepted by the statistics endpoint.
    pub fn numeric_slugs() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|s| s.is_numeric())
            .map(|s| s.slug())
            .collect()
    }
}

/// Returned when a path segment does not name a known sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSensor(pub String);

impl FromStr for Sensor {
    type Err = UnknownSensor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sensor| sensor.slug() == s)
            .ok_or_else(|| UnknownSensor(s.to_string()))
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
