//! Query parameters and SQL assembly for the read endpoints.
//!
//! Query strings are parsed into a [`ReadingFilter`] first. SQL is then
//! built with [`sqlx::QueryBuilder`]: table and column names come from the
//! sensor descriptor, every user supplied value is a bound parameter.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::models::NewReading;
use crate::sensor::Sensor;
use crate::validation::compile;

// ---

/// Default page size of the per-sensor endpoints.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Default page size of the search endpoint.
pub const DEFAULT_SEARCH_LIMIT: u32 = 100;

static DATE: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}(T[0-9]{2}:[0-9]{2}:[0-9]{2})?$"));
static RANGE: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9]+(\.[0-9]+)?-[0-9]+(\.[0-9]+)?$"));
static LIMIT: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9]+$"));

const START_DATE_ERROR: &str = "Fecha inicio inválida (formato: YYYY-MM-DD)";
const END_DATE_ERROR: &str = "Fecha fin inválida (formato: YYYY-MM-DD)";
const RANGE_ERROR: &str = "Rango inválido (formato: min-max, ej: 20-30)";
const LIMIT_ERROR: &str = "Límite inválido (debe ser un entero no negativo)";

/// Query string of the per-sensor endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

/// Query string of the search endpoint. Serialized back to the caller with
/// absent filters left out.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rango: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<String>,
    #[serde(skip_serializing)]
    pub limit: Option<String>,
}

/// Validated filter applied to one sensor table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingFilter {
    /// Inclusive bounds on the sensor's numeric column.
    pub range: Option<(f64, f64)>,
    /// Inclusive lower bound on `fecha_registro`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `fecha_registro`.
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
}

/// Which end of a date interval a parameter describes.
#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

impl ReadingFilter {
    /// Filter selecting only the most recent row.
    pub fn latest() -> Self {
        // ---
        ReadingFilter {
            range: None,
            from: None,
            until: None,
            limit: 1,
        }
    }

    /// Parse the query string of a per-sensor endpoint.
    pub fn from_list(params: &ListParams, max_limit: u32) -> Result<Self, Vec<String>> {
        // ---
        let mut errors = Vec::new();

        let from = parse_date(params.fecha_inicio.as_deref(), Bound::Start, &mut errors);
        let until = parse_date(params.fecha_fin.as_deref(), Bound::End, &mut errors);
        let limit = parse_limit(
            params.limit.as_deref(),
            DEFAULT_LIST_LIMIT,
            max_limit,
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ReadingFilter {
            range: None,
            from,
            until,
            limit,
        })
    }

    /// Parse the query string of the search endpoint for `sensor`.
    pub fn from_search(
        sensor: Sensor,
        params: &SearchParams,
        max_limit: u32,
    ) -> Result<Self, Vec<String>> {
        // ---
        let mut errors = Vec::new();

        let range = parse_range(params.rango.as_deref(), &mut errors);
        if range.is_some() && !sensor.is_numeric() {
            errors.push(format!("Rango no aplicable al sensor {sensor}"));
        }

        let from = parse_date(params.fecha_inicio.as_deref(), Bound::Start, &mut errors);
        let until = parse_date(params.fecha_fin.as_deref(), Bound::End, &mut errors);
        let limit = parse_limit(
            params.limit.as_deref(),
            DEFAULT_SEARCH_LIMIT,
            max_limit,
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ReadingFilter {
            range,
            from,
            until,
            limit,
        })
    }
}

/// Empty query parameters are treated as absent.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn parse_date(value: Option<&str>, bound: Bound, errors: &mut Vec<String>) -> Option<DateTime<Utc>> {
    // ---
    let value = non_empty(value)?;
    let message = match bound {
        Bound::Start => START_DATE_ERROR,
        Bound::End => END_DATE_ERROR,
    };

    if !DATE.is_match(value) {
        errors.push(message.to_string());
        return None;
    }

    // The pattern does not reject impossible dates such as 2025-02-30
    let parsed = if value.len() == 10 {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(|date| {
            let time = match bound {
                Bound::Start => NaiveTime::MIN,
                Bound::End => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
            };
            date.and_time(time)
        })
    } else {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok()
    };

    match parsed {
        Some(naive) => Some(naive.and_utc()),
        None => {
            errors.push(message.to_string());
            None
        }
    }
}

fn parse_range(value: Option<&str>, errors: &mut Vec<String>) -> Option<(f64, f64)> {
    // ---
    let value = non_empty(value)?;
    if !RANGE.is_match(value) {
        errors.push(RANGE_ERROR.to_string());
        return None;
    }

    let (min, max) = value.split_once('-')?;
    match (min.parse::<f64>(), max.parse::<f64>()) {
        (Ok(min), Ok(max)) => Some((min, max)),
        _ => {
            errors.push(RANGE_ERROR.to_string());
            None
        }
    }
}

fn parse_limit(value: Option<&str>, default: u32, max: u32, errors: &mut Vec<String>) -> i64 {
    // ---
    let Some(value) = non_empty(value) else {
        return i64::from(default.min(max));
    };

    if !LIMIT.is_match(value) {
        errors.push(LIMIT_ERROR.to_string());
        return 0;
    }

    // ASCII digits only, so a parse failure means the number overflowed
    let limit = value.parse::<u64>().unwrap_or(u64::MAX);
    i64::from(max).min(limit.min(i64::MAX as u64) as i64)
}

// ---

/// `SELECT` over the sensor's table, newest first.
pub fn select_rows(sensor: Sensor, filter: &ReadingFilter) -> QueryBuilder<'static, Postgres> {
    // ---
    let descriptor = sensor.descriptor();
    let mut qb = QueryBuilder::new(format!("SELECT * FROM {} WHERE 1=1", descriptor.table));

    if let (Some((min, max)), Some(column)) = (filter.range, descriptor.value_column) {
        qb.push(format!(" AND {column} BETWEEN "))
            .push_bind(min)
            .push(" AND ")
            .push_bind(max);
    }

    if let Some(from) = filter.from {
        qb.push(" AND fecha_registro >= ").push_bind(from);
    }

    if let Some(until) = filter.until {
        qb.push(" AND fecha_registro <= ").push_bind(until);
    }

    qb.push(" ORDER BY fecha_registro DESC, id DESC LIMIT ")
        .push_bind(filter.limit);

    qb
}

/// Aggregate query over the sensor's numeric column, or `None` when the
/// sensor has no numeric column.
pub fn select_stats(sensor: Sensor) -> Option<String> {
    // ---
    let descriptor = sensor.descriptor();
    let column = descriptor.value_column?;

    Some(format!(
        "SELECT \
            COUNT(*) AS total_registros, \
            MIN({column})::DOUBLE PRECISION AS minimo, \
            MAX({column})::DOUBLE PRECISION AS maximo, \
            AVG({column})::DOUBLE PRECISION AS promedio, \
            MIN(fecha_registro) AS primera_lectura, \
            MAX(fecha_registro) AS ultima_lectura \
        FROM {}",
        descriptor.table
    ))
}

/// `INSERT` of one row into its sensor table.
pub fn insert_row(row: &NewReading) -> QueryBuilder<'static, Postgres> {
    // ---
    let descriptor = row.sensor().descriptor();
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        descriptor.table,
        descriptor.insert_columns.join(", ")
    ));

    {
        let mut values = qb.separated(", ");
        match *row {
            NewReading::Temperature { valor, alerta } => {
                values.push_bind(valor).push_bind(alerta);
            }
            NewReading::Humidity { valor } | NewReading::Pressure { valor } => {
                values.push_bind(valor);
            }
            NewReading::Rain { detectada, alerta } => {
                values.push_bind(detectada).push_bind(alerta);
            }
            NewReading::SoilMoisture {
                valor_raw,
                valor_porcentaje,
            } => {
                values.push_bind(valor_raw).push_bind(valor_porcentaje);
            }
            NewReading::Gas { valor_raw, alerta } => {
                values.push_bind(valor_raw).push_bind(alerta);
            }
        }
        values.push_unseparated(")");
    }

    qb
}
