//! Scoring input coercion
//!
//! Clients send signals as numbers, numeric strings or booleans. Each is
//! coerced to its typed form here; anything missing or unparseable is a
//! validation error before the Event Store is touched.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::{LeadError, LeadResult};
use crate::storage::Signals;

/// Signals as received, before coercion
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSignals {
    #[serde(default)]
    pub time_on_site: Option<Value>,
    #[serde(default)]
    pub pages_visited: Option<Value>,
    #[serde(default)]
    pub clicked_price: Option<Value>,
}

impl RawSignals {
    pub fn parse(&self) -> LeadResult<Signals> {
        let time_on_site = number("time_on_site", required("time_on_site", &self.time_on_site)?)?;
        let pages_visited = count("pages_visited", required("pages_visited", &self.pages_visited)?)?;
        let clicked_price = flag("clicked_price", required("clicked_price", &self.clicked_price)?)?;
        Signals::new(time_on_site, pages_visited, clicked_price)
    }
}

fn required<'a>(field: &str, value: &'a Option<Value>) -> LeadResult<&'a Value> {
    match value {
        None | Some(Value::Null) => Err(LeadError::validation(format!("{} is required", field))),
        Some(v) => Ok(v),
    }
}

fn invalid(field: &str, expected: &str, value: &Value) -> LeadError {
    LeadError::validation(format!("{} must be {}, got {}", field, expected, value))
}

fn number(field: &str, value: &Value) -> LeadResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(invalid(field, "a non-negative number", value)),
    }
}

fn count(field: &str, value: &Value) -> LeadResult<u32> {
    let as_float = number(field, value).map_err(|_| invalid(field, "a non-negative integer", value))?;
    if as_float.fract() != 0.0 || as_float > u32::MAX as f64 {
        return Err(invalid(field, "a non-negative integer", value));
    }
    Ok(as_float as u32)
}

fn flag(field: &str, value: &Value) -> LeadResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 0.0 => Ok(false),
            Some(v) if v == 1.0 => Ok(true),
            _ => Err(invalid(field, "0, 1, true or false", value)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(invalid(field, "0, 1, true or false", value)),
        },
        _ => Err(invalid(field, "0, 1, true or false", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawSignals {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parses_native_types() {
        let signals = raw(json!({"time_on_site": 12.5, "pages_visited": 3, "clicked_price": true}))
            .parse()
            .unwrap();
        assert_eq!(signals.time_on_site, 12.5);
        assert_eq!(signals.pages_visited, 3);
        assert!(signals.clicked_price);
    }

    #[test]
    fn test_coerces_strings_and_flags() {
        let signals = raw(json!({"time_on_site": "20", "pages_visited": "5", "clicked_price": 0}))
            .parse()
            .unwrap();
        assert_eq!(signals.time_on_site, 20.0);
        assert_eq!(signals.pages_visited, 5);
        assert!(!signals.clicked_price);

        let signals = raw(json!({"time_on_site": 1, "pages_visited": 2.0, "clicked_price": "TRUE"}))
            .parse()
            .unwrap();
        assert!(signals.clicked_price);
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let err = raw(json!({"time_on_site": 5, "clicked_price": 1})).parse().unwrap_err();
        assert!(matches!(err, LeadError::Validation(ref m) if m.contains("pages_visited")));

        let err = raw(json!({"time_on_site": null, "pages_visited": 1, "clicked_price": 1}))
            .parse()
            .unwrap_err();
        assert!(matches!(err, LeadError::Validation(ref m) if m.contains("time_on_site")));
    }

    #[test]
    fn test_rejects_malformed_values() {
        for body in [
            json!({"time_on_site": "abc", "pages_visited": 1, "clicked_price": 1}),
            json!({"time_on_site": -1, "pages_visited": 1, "clicked_price": 1}),
            json!({"time_on_site": 5, "pages_visited": 1.5, "clicked_price": 1}),
            json!({"time_on_site": 5, "pages_visited": -2, "clicked_price": 1}),
            json!({"time_on_site": 5, "pages_visited": 1, "clicked_price": 2}),
            json!({"time_on_site": 5, "pages_visited": 1, "clicked_price": "maybe"}),
            json!({"time_on_site": [5], "pages_visited": 1, "clicked_price": 1}),
        ] {
            assert!(raw(body.clone()).parse().is_err(), "accepted {}", body);
        }
    }
}
