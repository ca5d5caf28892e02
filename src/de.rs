//! Deserialization helpers for discriminating Slack's `ok` flag within
//! untagged enums.
//!
//! Slack documents `ok` as a boolean, but we judge it the way a loosely typed
//! client would: any truthy value is success and any falsy value is failure.

use serde::de::{Deserialize, Deserializer, Error};
use serde_json::Value;

/// Accept only a truthy value, yielding `true`.
pub fn only_truthy<'a, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    exactly(deserializer, true)
}

/// Accept only a falsy value, yielding `false`.
pub fn only_falsy<'a, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    exactly(deserializer, false)
}

fn exactly<'a, D>(deserializer: D, want: bool) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    let v = Value::deserialize(deserializer)?;

    if is_truthy(&v) == want {
        Ok(want)
    } else {
        Err(Error::custom(format!("unexpected truthiness: {}", v)))
    }
}

/// `null`, `false`, zero, and the empty string are falsy. All else is truthy.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
