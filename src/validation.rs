//! Input validation for submitted readings.
//!
//! Each field is checked against a format pattern first and, only when the
//! format matched, against its numeric bounds. All fields are checked and
//! every violation is collected so that the station gets the complete list
//! in a single response.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{RawReading, Reading};

// ---

static TEMPERATURE: Lazy<Regex> = Lazy::new(|| compile(r"^-?[0-9]{1,2}(\.[0-9]{1,2})?$"));
static HUMIDITY: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9]{1,3}(\.[0-9]{1,2})?$"));
static PRESSURE: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9]{3,4}(\.[0-9]{1,2})?$"));
static RAIN: Lazy<Regex> = Lazy::new(|| compile(r"(?i)^(SI|NO)$"));
static ANALOG: Lazy<Regex> = Lazy::new(|| compile(r"^[0-9]{1,4}$"));

/// Compile one of the built-in patterns.
///
/// The patterns are literals in this file, so a failure here is a
/// programming error caught by the tests below.
pub(crate) fn compile(pattern: &str) -> Regex {
    // ---
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("invalid built-in pattern {pattern:?}: {e}"),
    }
}

/// Format pattern, bounds and messages for one decimal field.
struct NumericRule {
    pattern: &'static Lazy<Regex>,
    min: f64,
    max: f64,
    format_error: &'static str,
    range_error: &'static str,
}

static TEMPERATURE_RULE: NumericRule = NumericRule {
    pattern: &TEMPERATURE,
    min: -50.0,
    max: 70.0,
    format_error: "Temperatura inválida (formato esperado: -50 a 70, ej: 23.5)",
    range_error: "Temperatura fuera de rango (-50 a 70°C)",
};

static HUMIDITY_RULE: NumericRule = NumericRule {
    pattern: &HUMIDITY,
    min: 0.0,
    max: 100.0,
    format_error: "Humedad inválida (formato esperado: 0-100, ej: 65.5)",
    range_error: "Humedad fuera de rango (0-100%)",
};

static PRESSURE_RULE: NumericRule = NumericRule {
    pattern: &PRESSURE,
    min: 800.0,
    max: 1200.0,
    format_error: "Presión inválida (formato esperado: 800-1200, ej: 1013.25)",
    range_error: "Presión fuera de rango (800-1200 hPa)",
};

static SOIL_MOISTURE_RULE: NumericRule = NumericRule {
    pattern: &ANALOG,
    min: 0.0,
    max: 1023.0,
    format_error: "Humedad del suelo inválida (formato esperado: 0-1023)",
    range_error: "Humedad del suelo fuera de rango (0-1023)",
};

static GAS_RULE: NumericRule = NumericRule {
    pattern: &ANALOG,
    min: 0.0,
    max: 1023.0,
    format_error: "Gas inválido (formato esperado: 0-1023)",
    range_error: "Gas fuera de rango (0-1023)",
};

const RAIN_ERROR: &str = "Lluvia inválida (valores permitidos: SI o NO)";

impl NumericRule {
    /// Check `value`, pushing at most one error. Returns the parsed number
    /// when the value is well formed and in range.
    fn check(&self, value: Option<&Value>, errors: &mut Vec<String>) -> Option<f64> {
        // ---
        let text = match value.and_then(field_text) {
            Some(text) if self.pattern.is_match(&text) => text,
            _ => {
                errors.push(self.format_error.to_string());
                return None;
            }
        };

        match text.parse::<f64>() {
            Ok(num) if num >= self.min && num <= self.max => Some(num),
            _ => {
                errors.push(self.range_error.to_string());
                None
            }
        }
    }
}

/// Text form of a JSON field as matched by the format patterns.
///
/// Numbers are rendered the way the station firmware writes them: integral
/// values without a fractional part. Anything but a string or a number has
/// no text form and fails the format check.
fn field_text(value: &Value) -> Option<String> {
    // ---
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            _ => Some(n.to_string()),
        },
        _ => None,
    }
}

/// JavaScript-style truthiness, used for the rain presence check.
fn is_truthy(value: &Value) -> bool {
    // ---
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Presence check run before any format validation.
///
/// Numeric fields only need to be present and non-null. The rain field must
/// be truthy, so `""`, `false` and `0` count as missing while `"NO"` does not.
pub fn is_complete(raw: &RawReading) -> bool {
    // ---
    let present = |v: &Option<Value>| !matches!(v, None | Some(Value::Null));

    present(&raw.temperatura)
        && present(&raw.humedad)
        && present(&raw.presion)
        && raw.lluvia.as_ref().is_some_and(is_truthy)
        && present(&raw.humedad_suelo)
        && present(&raw.gas)
}

/// Validate every field, returning the parsed reading or all violations.
pub fn parse_reading(raw: &RawReading) -> Result<Reading, Vec<String>> {
    // ---
    let mut errors = Vec::new();

    let temperature = TEMPERATURE_RULE.check(raw.temperatura.as_ref(), &mut errors);
    let humidity = HUMIDITY_RULE.check(raw.humedad.as_ref(), &mut errors);
    let pressure = PRESSURE_RULE.check(raw.presion.as_ref(), &mut errors);

    let rain = match raw.lluvia.as_ref().and_then(field_text) {
        Some(text) if RAIN.is_match(&text) => Some(text.eq_ignore_ascii_case("SI")),
        _ => {
            errors.push(RAIN_ERROR.to_string());
            None
        }
    };

    let soil_moisture = SOIL_MOISTURE_RULE.check(raw.humedad_suelo.as_ref(), &mut errors);
    let gas = GAS_RULE.check(raw.gas.as_ref(), &mut errors);

    match (temperature, humidity, pressure, rain, soil_moisture, gas) {
        (Some(t), Some(h), Some(p), Some(r), Some(s), Some(g)) if errors.is_empty() => {
            Ok(Reading {
                temperature_c: t,
                humidity: h,
                pressure_hpa: p,
                rain_detected: r,
                // Four digits at most and range checked, so these are exact
                soil_moisture_raw: s as i32,
                gas_raw: g as i32,
            })
        }
        _ => Err(errors),
    }
}
