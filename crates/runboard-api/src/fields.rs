//! Lenient numeric field parsing.
//!
//! The mini-app client forwards values it read from the Telegram launch
//! parameters, so numbers arrive either as JSON numbers or as numeric
//! strings. Anything else is a 400.

use serde_json::Value;

use crate::error::ApiError;

fn invalid(field: &str, value: &Value) -> ApiError {
  ApiError::BadRequest(format!("{field} must be a number, got {value}"))
}

/// An integer field. Floats with no fractional part are accepted.
pub fn int_field(field: &str, value: &Value) -> Result<i64, ApiError> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| {
        n.as_f64()
          .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
          .map(|f| f as i64)
      })
      .ok_or_else(|| invalid(field, value)),
    Value::String(s) => s.trim().parse().map_err(|_| invalid(field, value)),
    _ => Err(invalid(field, value)),
  }
}

/// A fractional field.
pub fn number_field(field: &str, value: &Value) -> Result<f64, ApiError> {
  match value {
    Value::Number(n) => n.as_f64().ok_or_else(|| invalid(field, value)),
    Value::String(s) => s
      .trim()
      .parse::<f64>()
      .ok()
      .filter(|f| f.is_finite())
      .ok_or_else(|| invalid(field, value)),
    _ => Err(invalid(field, value)),
  }
}

/// An optional integer field. `null`, a missing key and `""` all mean
/// absent.
pub fn optional_int_field(
  field: &str,
  value: Option<&Value>,
) -> Result<Option<i64>, ApiError> {
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
    Some(v) => int_field(field, v).map(Some),
  }
}
