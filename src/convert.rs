use crate::value::{PropertyValue, ScalarValue};
use serde_json::{Map, Number, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch with fractional part, as used in the GELF `timestamp` field.
/// Times before the epoch are negative.
pub(crate) fn time_to_unix_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs_f64(),
        Err(err) => -err.duration().as_secs_f64(),
    }
}

/// Turn one top-level property into flat GELF additional fields.
///
/// The property name is normalized once: `id` (any case) becomes `id_`, and a leading underscore
/// is added if missing. Nested members append `.member` to the normalized name.
pub(crate) fn flatten_property(
    name: &str,
    value: &PropertyValue,
    explode_array_values: bool,
) -> Vec<(String, Value)> {
    let mut fields = Vec::new();
    flatten_into(
        &mut fields,
        normalize_field_name(name),
        value,
        explode_array_values,
    );
    fields
}

fn flatten_into(
    fields: &mut Vec<(String, Value)>,
    path: String,
    value: &PropertyValue,
    explode_array_values: bool,
) {
    match value {
        PropertyValue::Scalar(scalar) => fields.push((path, scalar_to_json(scalar))),
        PropertyValue::Sequence(elements) => {
            fields.push((path.clone(), Value::String(value.render_unquoted())));
            if explode_array_values {
                for (index, element) in elements.iter().enumerate() {
                    flatten_into(
                        fields,
                        format!("{}.{}", path, index),
                        element,
                        explode_array_values,
                    );
                }
            }
        }
        PropertyValue::Structure { properties, .. } => {
            for property in properties {
                flatten_into(
                    fields,
                    format!("{}.{}", path, property.name),
                    &property.value,
                    explode_array_values,
                );
            }
        }
        PropertyValue::Dictionary(elements) => {
            if explode_array_values {
                for (key, element) in elements {
                    let key = PropertyValue::Scalar(key.clone()).render_unquoted();
                    flatten_into(
                        fields,
                        format!("{}.{}", path, key),
                        element,
                        explode_array_values,
                    );
                }
            } else {
                let map: Map<String, Value> = elements
                    .iter()
                    .map(|(key, element)| {
                        (
                            key.to_raw_string().unwrap_or_default(),
                            Value::String(element.render_unquoted()),
                        )
                    })
                    .collect();
                fields.push((path, Value::Object(map)));
            }
        }
    }
}

fn normalize_field_name(name: &str) -> String {
    let name = if name.eq_ignore_ascii_case("id") {
        "id_"
    } else {
        name
    };
    if name.starts_with('_') {
        name.to_string()
    } else {
        format!("_{}", name)
    }
}

/// Integer if the text form parses as one, else float, else the text itself.
///
/// This means a property can change its JSON type between events, e.g. `"007"` is sent as `7`
/// while `"abc"` is sent as a string.
fn scalar_to_json(scalar: &ScalarValue) -> Value {
    let text = match scalar.to_raw_string() {
        Some(text) => text,
        None => return Value::Null,
    };
    if let Ok(int) = text.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(float) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(float);
    }
    Value::String(text)
}
