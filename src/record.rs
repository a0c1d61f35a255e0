// Firestore Sync - Records
//
// A Record is one value written to one collection in one pass. Records are
// always fresh creates; nothing here updates or merges.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Number, Value};

/// Value + timestamps persisted for one variable in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Collection identifier (the variable name)
    pub variable: String,
    pub value: f64,
    /// Write instant; the creation timestamp carries the same instant
    pub written_at: DateTime<Utc>,
}

impl Record {
    /// Build a record stamped with the current instant.
    pub fn new(variable: impl Into<String>, value: f64) -> Self {
        Self::at(variable, value, Utc::now())
    }

    pub fn at(variable: impl Into<String>, value: f64, written_at: DateTime<Utc>) -> Self {
        Self {
            variable: variable.into(),
            value,
            written_at,
        }
    }

    /// ISO-8601 with millisecond precision and a `Z` suffix.
    pub fn timestamp(&self) -> String {
        self.written_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Firestore REST document body.
    ///
    /// `value` is a doubleValue, `timestamp` a timestampValue and
    /// `created_at` the same instant as a plain string.
    pub fn to_document(&self) -> Value {
        let timestamp = self.timestamp();
        json!({
            "fields": {
                "value": { "doubleValue": double_value(self.value) },
                "timestamp": { "timestampValue": timestamp },
                "created_at": { "stringValue": timestamp },
            }
        })
    }
}

/// Finite doubles are JSON numbers; NaN and infinities use the proto3 JSON
/// string forms.
fn double_value(value: f64) -> Value {
    match Number::from_f64(value) {
        Some(number) => Value::Number(number),
        None if value.is_nan() => Value::String("NaN".to_string()),
        None if value > 0.0 => Value::String("Infinity".to_string()),
        None => Value::String("-Infinity".to_string()),
    }
}

// ============================================================================
// NUMERIC COERCION
// ============================================================================

/// Convert a snapshot value to a number without ever failing.
///
/// Mirrors loose number conversion: booleans become 1/0, numeric strings are
/// parsed, empty strings become 0 and anything unparseable becomes NaN.
pub fn coerce_to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_numeric_str(s),
        Value::Array(_) => parse_numeric_str(&loose_string(value)),
        Value::Object(_) => f64::NAN,
    }
}

/// String form used when an array is converted to a number.
fn loose_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(loose_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn parse_numeric_str(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let (Some(prefix), Some(digits)) = (s.get(..2), s.get(2..)) {
        let radix = match prefix {
            "0x" | "0X" => Some(16),
            "0o" | "0O" => Some(8),
            "0b" | "0B" => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            if digits.is_empty() {
                return f64::NAN;
            }
            return parse_radix(digits, radix);
        }
    }

    // f64::from_str also accepts "inf"/"nan" spellings, which must stay NaN
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }

    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
        })
        .unwrap_or(f64::NAN)
}
