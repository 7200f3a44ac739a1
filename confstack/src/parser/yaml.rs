//! YAML parser.

use serde_yaml::Value;

use crate::flat_map::FlatMap;
use crate::key::ConfigKey;

use super::{ConfigParser, ParseError};

const NAME: &str = "yaml";

/// Parser for YAML documents whose root is a mapping.
///
/// Flattening follows [`JsonParser`](super::JsonParser): mappings become
/// sections, sequences become numbered children, `~` becomes the empty
/// string. Tagged values are flattened as their inner value.
///
/// # Examples
///
/// ```
/// use confstack::parser::{ConfigParser, YamlParser};
///
/// let map = YamlParser.parse("logging:\n  level: debug\nhosts:\n  - a\n  - b\n").unwrap();
/// assert_eq!(map.get("Logging:Level"), Some("debug"));
/// assert_eq!(map.get("hosts:1"), Some("b"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl ConfigParser for YamlParser {
    fn name(&self) -> &str {
        NAME
    }

    fn parse(&self, content: &str) -> Result<FlatMap, ParseError> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| match e.location() {
            Some(location) => ParseError::at_line(NAME, location.line(), e.to_string()),
            None => ParseError::new(NAME, e.to_string()),
        })?;

        let mut map = FlatMap::new();
        match value {
            Value::Mapping(_) => flatten_yaml(&ConfigKey::root(), &value, &mut map)?,
            // An empty document deserializes as null.
            Value::Null => {}
            _ => return Err(ParseError::new(NAME, "document root must be a mapping")),
        }
        Ok(map)
    }
}

fn flatten_yaml(prefix: &ConfigKey, value: &Value, map: &mut FlatMap) -> Result<(), ParseError> {
    match value {
        Value::Mapping(fields) => {
            for (name, child) in fields {
                let name = scalar_key(name)?;
                flatten_yaml(&prefix.join(&name), child, map)?;
            }
        }
        Value::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_yaml(&prefix.join(&index.to_string()), child, map)?;
            }
        }
        Value::Tagged(tagged) => flatten_yaml(prefix, &tagged.value, map)?,
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
    Ok(())
}

fn scalar_key(key: &Value) -> Result<String, ParseError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ParseError::new(
            NAME,
            format!("mapping keys must be scalars, found {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_mapping() {
        let map = YamlParser
            .parse("AdBlock:\n  House: Contoso\n  Retry: 3\n")
            .unwrap();
        assert_eq!(map.get("AdBlock:House"), Some("Contoso"));
        assert_eq!(map.get("AdBlock:Retry"), Some("3"));
    }

    #[test]
    fn test_sequence_of_mappings() {
        let map = YamlParser
            .parse("servers:\n  - name: a\n    port: 1\n  - name: b\n")
            .unwrap();
        assert_eq!(map.get("servers:0:name"), Some("a"));
        assert_eq!(map.get("servers:0:port"), Some("1"));
        assert_eq!(map.get("servers:1:name"), Some("b"));
    }

    #[test]
    fn test_null_and_bool() {
        let map = YamlParser.parse("a: ~\nb: true\n").unwrap();
        assert_eq!(map.get("a"), Some(""));
        assert_eq!(map.get("b"), Some("true"));
    }

    #[test]
    fn test_empty_document() {
        assert!(YamlParser.parse("").unwrap().is_empty());
    }

    #[test]
    fn test_root_must_be_mapping() {
        let err = YamlParser.parse("- a\n- b\n").unwrap_err();
        assert!(err.message.contains("root must be a mapping"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(YamlParser.parse("invalid: yaml: syntax:").is_err());
    }

    #[test]
    fn test_non_scalar_key_rejected() {
        let err = YamlParser.parse("? [a, b]\n: value\n").unwrap_err();
        assert!(err.message.contains("mapping keys must be scalars"));
    }
}
