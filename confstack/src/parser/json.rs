//! JSON parser and object-graph flattening.

use serde_json::Value;

use crate::flat_map::FlatMap;
use crate::key::ConfigKey;

use super::{ConfigParser, ParseError};

const NAME: &str = "json";

/// Parser for JSON documents whose root is an object.
///
/// Nested objects become sections and array elements become numbered
/// children, so `{"Hosts": ["a", "b"]}` yields `Hosts:0` and `Hosts:1`.
///
/// # Examples
///
/// ```
/// use confstack::parser::{ConfigParser, JsonParser};
///
/// let map = JsonParser.parse(r#"{"Retry": {"Count": 42, "Enabled": true}}"#).unwrap();
/// assert_eq!(map.get("Retry:Count"), Some("42"));
/// assert_eq!(map.get("retry:enabled"), Some("true"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ConfigParser for JsonParser {
    fn name(&self) -> &str {
        NAME
    }

    fn parse(&self, content: &str) -> Result<FlatMap, ParseError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ParseError::at_line(NAME, e.line(), e.to_string()))?;

        if !value.is_object() {
            return Err(ParseError::new(NAME, "document root must be an object"));
        }

        let mut map = FlatMap::new();
        flatten_json(&ConfigKey::root(), &value, &mut map);
        Ok(map)
    }
}

/// Flatten a JSON value into `map` under `prefix`.
///
/// Scalars become leaves (`null` becomes the empty string); empty objects and
/// arrays contribute nothing.
pub(crate) fn flatten_json(prefix: &ConfigKey, value: &Value, map: &mut FlatMap) {
    match value {
        Value::Object(fields) => {
            for (name, child) in fields {
                flatten_json(&prefix.join(name), child, map);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_json(&prefix.join(&index.to_string()), child, map);
            }
        }
        Value::Null => {
            map.insert(prefix.clone(), String::new());
        }
        Value::Bool(b) => {
            map.insert(prefix.clone(), b.to_string());
        }
        Value::Number(n) => {
            map.insert(prefix.clone(), n.to_string());
        }
        Value::String(s) => {
            map.insert(prefix.clone(), s.clone());
        }
    }
}
