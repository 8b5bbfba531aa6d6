//! Structural checks for movie payloads: which keys may appear, and what
//! primitive type each value must have.

use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

pub type Payload = Map<String, Value>;

const REQUIRED_KEYS: [&str; 3] = ["name", "duration", "price"];
/// Also the order in which field types are checked.
const UPDATE_KEYS: [&str; 4] = ["name", "description", "duration", "price"];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Kind {
    Text,
    Number,
}

impl Kind {
    fn of(field: &str) -> Self {
        match field {
            "duration" | "price" => Kind::Number,
            _ => Kind::Text,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::Text => value.is_string(),
            Kind::Number => value.is_number(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Kind::Text => "string",
            Kind::Number => "number",
        }
    }
}

pub fn validate_for_create(payload: Payload) -> AppResult<Payload> {
    let sent: Vec<&str> = payload.keys().map(String::as_str).collect();

    if !REQUIRED_KEYS.iter().all(|key| payload.contains_key(*key)) {
        return Err(AppError::validation(format!(
            r#"Required keys are "{}". You sent "{}""#,
            REQUIRED_KEYS.join(","),
            sent.join(",")
        )));
    }

    let extra: Vec<&str> = sent
        .iter()
        .copied()
        .filter(|key| *key != "description" && !REQUIRED_KEYS.contains(key))
        .collect();
    if !extra.is_empty() {
        return Err(unsolicited(&extra, &format!("{},description", REQUIRED_KEYS.join(","))));
    }

    for field in UPDATE_KEYS {
        match payload.get(field) {
            // Only `description` can be absent at this point.
            None | Some(Value::Null) if field == "description" => {},
            value => check_type(field, value.unwrap_or(&Value::Null))?,
        }
    }

    Ok(payload)
}

/// Every key is optional here. A falsy value (`0`, `""`, `false`, `null`)
/// is accepted without a type check.
pub fn validate_for_update(payload: Payload) -> AppResult<Payload> {
    let extra: Vec<&str> = payload
        .keys()
        .map(String::as_str)
        .filter(|key| !UPDATE_KEYS.contains(key))
        .collect();
    if !extra.is_empty() {
        return Err(unsolicited(&extra, &UPDATE_KEYS.join(",")));
    }

    for field in UPDATE_KEYS {
        match payload.get(field) {
            Some(value) if is_truthy(value) => check_type(field, value)?,
            _ => {},
        }
    }

    Ok(payload)
}

fn check_type(field: &str, value: &Value) -> AppResult<()> {
    let kind = Kind::of(field);
    if kind.matches(value) {
        Ok(())
    } else {
        Err(AppError::validation(format!(r#"Type of "{field}" must be {}"#, kind.name())))
    }
}

fn unsolicited(extra: &[&str], accepted: &str) -> AppError {
    AppError::validation(format!(
        r#"Your request has an unsolicited key "{}". We only accept "{accepted}"."#,
        extra.join(",")
    ))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
