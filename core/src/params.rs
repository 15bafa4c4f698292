use serde_json::Value;
use std::collections::BTreeMap;

/// Parameter set of a single segment (e.g. `post_id -> "7"`).
pub type Params = BTreeMap<String, String>;

/// Parameter sets of a whole chain, keyed by segment name.
pub type ParamsMap = BTreeMap<String, Params>;

/// Derives URL params for `names` from a context object.
///
/// With a single name, a `*_id` name is filled from the object's `id` field
/// and any other name takes the whole context when the context is a scalar.
/// Params are strings, so a non-scalar context falls back to the field of
/// the same name. With several names, each one is looked up as a field of
/// the same name. Strings are taken as-is, other scalars use their JSON
/// rendering, and missing fields are skipped.
pub fn params_from_object(context: &Value, names: &[String]) -> Params {
    let mut params = Params::new();

    if let [name] = names {
        let value = if name.ends_with("_id") {
            context.get("id").and_then(scalar)
        } else {
            scalar(context).or_else(|| context.get(name).and_then(scalar))
        };
        if let Some(value) = value {
            params.insert(name.clone(), value);
        }
        return params;
    }

    for name in names {
        if let Some(value) = context.get(name).and_then(scalar) {
            params.insert(name.clone(), value);
        }
    }
    params
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
