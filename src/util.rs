//! Small helpers shared by the registry, components and orchestrators.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::error;
use uuid::Uuid;

/// Clamp `value` into `[min, max]`.
///
/// If the bounds are inverted, `min` wins.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value > max {
        if min > max { min } else { max }
    } else if value < min {
        min
    } else {
        value
    }
}

/// Read an attribute-style boolean.
///
/// A present-but-empty attribute counts as `true`.
pub fn coerce_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "" | "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Read an attribute-style number.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Turn an attribute string into the most specific JSON value it spells.
///
/// `"true"`/`"false"` become booleans, numerals become numbers, `"null"`
/// becomes null, `{...}`/`[...]` are parsed as JSON; everything else stays
/// a string.
pub fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if let Some(n) = coerce_number(trimmed) {
        if let Some(number) = serde_json::Number::from_f64(n) {
            // Keep integers integral.
            if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                return Value::from(n as i64);
            }
            return Value::Number(number);
        }
    }

    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
    {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return value;
        }
    }

    Value::String(raw.to_string())
}

/// `data-foo-bar` style suffix to `fooBar`.
pub fn kebab_to_camel(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut upper = false;
    for ch in raw.chars() {
        if ch == '-' {
            upper = !out.is_empty();
            continue;
        }
        if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Random lowercase hex id of exactly `len` characters.
pub fn generate_id(len: usize) -> String {
    let mut id = String::with_capacity(len);
    while id.len() < len {
        let chunk = Uuid::new_v4().simple().to_string();
        let take = (len - id.len()).min(chunk.len());
        id.push_str(&chunk[..take]);
    }
    id
}

/// Best-effort message out of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `f`, absorbing both returned errors and panics. Returns whether it
/// completed cleanly.
pub(crate) fn run_guarded<F>(development: bool, context: &str, label: &str, f: F) -> bool
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            if development {
                error!(context, label, error = %err, "handler failed");
            }
            false
        }
        Err(payload) => {
            if development {
                error!(context, label, panic = %panic_message(payload.as_ref()), "handler panicked");
            }
            false
        }
    }
}
