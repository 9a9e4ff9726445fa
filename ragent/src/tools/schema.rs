//! Argument validation against the JSON-schema subset tools declare.
//!
//! Supported keywords: `type` (object, string, integer, number, boolean, array), `properties`,
//! `required`, `additionalProperties: false`, `items`, `enum`, and `format: "date-time"`.
//! Scalars are coerced where the model commonly sends the wrong JSON type: numeric and
//! boolean strings become numbers and booleans, numbers and booleans become strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use super::ToolError;

/// Validates `args` against `schema` and returns the coerced arguments.
///
/// `null` arguments are treated as an empty object. A schema without `type` accepts anything.
pub fn validate_arguments(schema: &Value, args: Value) -> Result<Value, ToolError> {
    let args = if args.is_null() && schema_type(schema) == Some("object") {
        Value::Object(Map::new())
    } else {
        args
    };
    coerce("arguments", schema, args)
}

fn schema_type(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

fn invalid(path: &str, expected: &str, got: &Value) -> ToolError {
    ToolError::InvalidArguments(format!(
        "`{}`: expected {}, got {}",
        path,
        expected,
        type_name(got)
    ))
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce(path: &str, schema: &Value, value: Value) -> Result<Value, ToolError> {
    let value = match schema_type(schema) {
        None => value,
        Some("object") => coerce_object(path, schema, value)?,
        Some("string") => coerce_string(path, schema, value)?,
        Some("integer") => coerce_integer(path, value)?,
        Some("number") => coerce_number(path, value)?,
        Some("boolean") => coerce_boolean(path, value)?,
        Some("array") => coerce_array(path, schema, value)?,
        Some(_) => value,
    };
    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(&value) {
            return Err(ToolError::InvalidArguments(format!(
                "`{}`: {} is not one of {}",
                path,
                value,
                Value::Array(allowed.clone())
            )));
        }
    }
    Ok(value)
}

fn coerce_object(path: &str, schema: &Value, value: Value) -> Result<Value, ToolError> {
    let Value::Object(mut map) = value else {
        return Err(invalid(path, "object", &value));
    };
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if map.get(key).map_or(true, Value::is_null) {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required argument `{}`",
                    key
                )));
            }
        }
    }
    let properties = schema.get("properties").and_then(Value::as_object);
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));
    let keys: Vec<String> = map.keys().cloned().collect();
    for key in keys {
        let prop = properties.and_then(|p| p.get(&key));
        match prop {
            Some(prop_schema) => {
                let Some(v) = map.remove(&key) else { continue };
                if v.is_null() {
                    // Optional argument sent as null: drop it.
                    continue;
                }
                let coerced = coerce(&key, prop_schema, v)?;
                map.insert(key, coerced);
            }
            None if closed => {
                return Err(ToolError::InvalidArguments(format!(
                    "unexpected argument `{}`",
                    key
                )));
            }
            None => {}
        }
    }
    Ok(Value::Object(map))
}

fn coerce_string(path: &str, schema: &Value, value: Value) -> Result<Value, ToolError> {
    let s = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(invalid(path, "string", &other)),
    };
    if schema.get("format").and_then(Value::as_str) == Some("date-time")
        && parse_date_time(&s).is_none()
    {
        return Err(ToolError::InvalidArguments(format!(
            "`{}`: '{}' is not a date-time (expected e.g. 2025-10-18T14:00:00)",
            path, s
        )));
    }
    Ok(Value::String(s))
}

fn coerce_integer(path: &str, value: Value) -> Result<Value, ToolError> {
    match &value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::from(f as i64)),
            _ => Err(invalid(path, "integer", &value)),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid(path, "integer", &value)),
        _ => Err(invalid(path, "integer", &value)),
    }
}

fn coerce_number(path: &str, value: Value) -> Result<Value, ToolError> {
    match &value {
        Value::Number(_) => Ok(value),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid(path, "number", &value)),
        _ => Err(invalid(path, "number", &value)),
    }
}

fn coerce_boolean(path: &str, value: Value) -> Result<Value, ToolError> {
    match &value {
        Value::Bool(_) => Ok(value),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid(path, "boolean", &value)),
        },
        _ => Err(invalid(path, "boolean", &value)),
    }
}

fn coerce_array(path: &str, schema: &Value, value: Value) -> Result<Value, ToolError> {
    let Value::Array(items) = value else {
        return Err(invalid(path, "array", &value));
    };
    let Some(item_schema) = schema.get("items") else {
        return Ok(Value::Array(items));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| coerce(&format!("{}[{}]", path, i), item_schema, v))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Parses the date-time forms tools accept: RFC 3339 (offset dropped, local wall time kept),
/// `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM`, or a bare date
/// (midnight).
pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": { "type": "string" },
                "date": { "type": "string", "format": "date-time" },
                "limit": { "type": "integer" },
                "exact": { "type": "boolean" }
            },
            "required": ["city", "date"]
        })
    }

    #[test]
    fn missing_required_is_rejected() {
        let err = validate_arguments(&weather_schema(), json!({"city": "Paris"})).unwrap_err();
        assert_eq!(
            err,
            ToolError::InvalidArguments("missing required argument `date`".into())
        );
    }

    #[test]
    fn scalars_are_coerced() {
        let out = validate_arguments(
            &weather_schema(),
            json!({"city": 75001, "date": "2025-10-18", "limit": "3", "exact": "TRUE"}),
        )
        .unwrap();
        assert_eq!(out["city"], "75001");
        assert_eq!(out["limit"], 3);
        assert_eq!(out["exact"], true);
    }

    #[test]
    fn bad_date_time_is_rejected() {
        let err = validate_arguments(
            &weather_schema(),
            json!({"city": "Paris", "date": "next tuesday"}),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(m) if m.contains("date-time")));
    }

    #[test]
    fn null_args_become_empty_object() {
        let schema = json!({"type": "object", "properties": {}});
        assert_eq!(validate_arguments(&schema, Value::Null).unwrap(), json!({}));
    }

    #[test]
    fn closed_object_rejects_unknown_keys() {
        let schema = json!({"type": "object", "properties": {}, "additionalProperties": false});
        assert!(validate_arguments(&schema, json!({"x": 1})).is_err());
    }

    #[test]
    fn enum_and_array_items_checked() {
        let schema = json!({
            "type": "array",
            "items": { "type": "string", "enum": ["a", "b"] }
        });
        assert!(validate_arguments(&schema, json!(["a", "b"])).is_ok());
        assert!(validate_arguments(&schema, json!(["c"])).is_err());
    }

    #[test]
    fn parses_accepted_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 18)
            .and_then(|d| d.and_hms_opt(14, 0, 0))
            .unwrap();
        assert_eq!(parse_date_time("2025-10-18T14:00:00"), Some(expected));
        assert_eq!(parse_date_time("2025-10-18T14:00:00+02:00"), Some(expected));
        assert_eq!(parse_date_time("2025-10-18 14:00"), Some(expected));
        assert_eq!(
            parse_date_time("2025-10-18").map(|d| d.to_string()),
            Some("2025-10-18 00:00:00".to_string())
        );
        assert_eq!(parse_date_time("18/10/2025"), None);
    }
}
