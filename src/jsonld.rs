//! Helpers for reading schema.org `Product` data out of JSON-LD

use serde_json::Value;
use tracing::debug;

/// Parse a JSON-LD script, returning None (and logging) on malformed JSON
pub fn parse_script(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(json) => Some(json),
        Err(e) => {
            debug!(error = %e, "skipping malformed JSON-LD script");
            None
        }
    }
}

/// Collect every `Product`-typed object, walking arrays and `@graph` containers
pub fn product_nodes(json: &Value) -> Vec<&Value> {
    let mut nodes = Vec::new();
    collect_products(json, &mut nodes);
    nodes
}

fn collect_products<'a>(json: &'a Value, out: &mut Vec<&'a Value>) {
    match json {
        Value::Array(items) => {
            for item in items {
                collect_products(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect_products(graph, out);
            }
            if is_product(json) {
                out.push(json);
            }
        }
        _ => {}
    }
}

/// Check `@type` for Product, handling arrays and namespaced types ("schema:Product")
pub fn is_product(json: &Value) -> bool {
    match json.get("@type") {
        Some(Value::String(s)) => type_is_product(s),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(|t| t.as_str())
            .any(type_is_product),
        _ => false,
    }
}

fn type_is_product(type_str: &str) -> bool {
    let clean = type_str
        .rsplit_once(|c: char| c == ':' || c == '/')
        .map(|(_, t)| t)
        .unwrap_or(type_str);
    clean.eq_ignore_ascii_case("product")
}

/// The first offer of a product: `offers[0]` for arrays, the object itself otherwise
pub fn first_offer(product: &Value) -> Option<&Value> {
    match product.get("offers")? {
        Value::Array(offers) => offers.first(),
        offer @ Value::Object(_) => Some(offer),
        _ => None,
    }
}

/// Extract name from a field that may be a string or a nested object (e.g. brand.name)
pub fn nested_name(json: &Value, field: &str) -> Option<String> {
    let value = json.get(field)?;
    let name = match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => value.get("name").and_then(|n| n.as_str().map(String::from)),
        Value::Array(arr) => arr.first().and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => v.get("name").and_then(|n| n.as_str().map(String::from)),
            _ => None,
        }),
        _ => None,
    };
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Render a scalar as text: strings as-is, numbers without quotes
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a scalar as f64, stripping thousands separators from strings
pub fn scalar_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Read a scalar as a non-negative integer
pub fn scalar_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }
}
