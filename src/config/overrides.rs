use serde::Serialize;
use serde_json::Value;

/// Serialize command-line overrides, dropping every unset (`null`) value so
/// it cannot shadow a lower configuration layer.
pub fn without_unset<T: Serialize>(input: T) -> Value {
    let mut value = serde_json::to_value(input).unwrap_or(Value::Null);
    strip_nulls(&mut value);
    value
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for v in map.values_mut() {
                strip_nulls(v);
            }
            // Sections left empty by the pass above carry nothing either.
            map.retain(|_, v| !matches!(v, Value::Object(inner) if inner.is_empty()));
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                strip_nulls(item);
            }
        }
        _ => {}
    }
}
