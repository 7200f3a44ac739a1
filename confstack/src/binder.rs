//! Binding sections to typed settings objects.
//!
//! A [`Section`] is exposed to serde as a self-describing document:
//!
//! - a section whose children are all named `0`, `1`, ... reads as a
//!   sequence, ordered by index
//! - any other section with children reads as a map (struct fields match
//!   keys ignoring case, `_` and `-`, so `ad_block` binds `AdBlock`)
//! - a leaf reads as its string value; numbers and booleans are parsed from
//!   that string on demand
//! - enums bind unit variants from a string value, or a single child named
//!   after the variant

use std::fmt;
use std::str::FromStr;

use serde::de::value::{
    BorrowedStrDeserializer, MapAccessDeserializer, MapDeserializer, SeqDeserializer,
};
use serde::de::{self, Deserialize, IntoDeserializer, Visitor};
use thiserror::Error;

use crate::tree::Section;

/// Failure while binding a section to a type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BindError(String);

impl de::Error for BindError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

pub(crate) fn bind<'a, T: Deserialize<'a>>(section: Section<'a>) -> Result<T, BindError> {
    T::deserialize(SectionDeserializer { section })
}

struct SectionDeserializer<'a> {
    section: Section<'a>,
}

impl<'a> SectionDeserializer<'a> {
    fn value(&self) -> Result<&'a str, BindError> {
        self.section.value().ok_or_else(|| {
            BindError(format!("expected a value at '{}'", self.section.path()))
        })
    }

    fn parse<T>(&self, expected: &str) -> Result<T, BindError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.value()?;
        value.trim().parse().map_err(|e| {
            BindError(format!(
                "invalid {expected} '{value}' at '{}': {e}",
                self.section.path()
            ))
        })
    }

    fn is_sequence(&self) -> bool {
        self.section.has_children()
            && self
                .section
                .children()
                .all(|child| list_index(child.key()).is_some())
    }

    fn sequence(&self) -> Vec<SectionDeserializer<'a>> {
        let mut items: Vec<(usize, Section<'a>)> = self
            .section
            .children()
            .map(|child| (list_index(child.key()).unwrap_or(usize::MAX), child))
            .collect();
        items.sort_by_key(|(index, _)| *index);
        items
            .into_iter()
            .map(|(_, section)| SectionDeserializer { section })
            .collect()
    }

    fn entries(&self, fields: &[&str]) -> Vec<(String, SectionDeserializer<'a>)> {
        self.section
            .children()
            .map(|child| {
                let key = fields
                    .iter()
                    .find(|field| same_name(field, child.key()))
                    .map_or_else(|| child.key().to_string(), |field| (*field).to_string());
                (key, SectionDeserializer { section: child })
            })
            .collect()
    }
}

/// Parse a key written in canonical decimal form (`0`, `1`, `12`, but not
/// `+1` or `01`) as a list index.
fn list_index(key: &str) -> Option<usize> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'));
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

/// Compare a field name with a key ignoring case and word separators.
fn same_name(field: &str, key: &str) -> bool {
    let strip = |s: &str| {
        s.chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    strip(field) == strip(key)
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for SectionDeserializer<'de> {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if self.is_sequence() {
            self.deserialize_seq(visitor)
        } else if self.section.has_children() {
            self.deserialize_map(visitor)
        } else {
            match self.section.value() {
                Some(value) => visitor.visit_borrowed_str(value),
                None => visitor.visit_unit(),
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let value = self.value()?;
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => visitor.visit_bool(true),
            "false" => visitor.visit_bool(false),
            _ => Err(BindError(format!(
                "invalid bool '{value}' at '{}'",
                self.section.path()
            ))),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_borrowed_str(self.value()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_borrowed_bytes(self.value()?.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if self.section.exists() {
            visitor.visit_some(self)
        } else {
            visitor.visit_none()
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if self.section.value().is_some() && !self.section.has_children() {
            return Err(BindError(format!(
                "expected a sequence at '{}', found a value",
                self.section.path()
            )));
        }
        if let Some(child) = self
            .section
            .children()
            .find(|child| list_index(child.key()).is_none())
        {
            return Err(BindError(format!(
                "expected a sequence at '{}', found key '{}'",
                self.section.path(),
                child.key()
            )));
        }
        visitor.visit_seq(SeqDeserializer::new(self.sequence().into_iter()))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_map(MapDeserializer::new(self.entries(&[]).into_iter()))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_map(MapDeserializer::new(self.entries(fields).into_iter()))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        if self.section.has_children() {
            let map = MapDeserializer::new(self.entries(variants).into_iter());
            return visitor.visit_enum(MapAccessDeserializer::new(map));
        }
        let value = self.value()?.trim();
        let variant = variants
            .iter()
            .find(|variant| same_name(variant, value))
            .copied()
            .unwrap_or(value);
        visitor.visit_enum(BorrowedStrDeserializer::<BindError>::new(variant))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }
}

impl<'de> IntoDeserializer<'de, BindError> for SectionDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use crate::{ConfigurationBuilder, ConfigurationTree, Error};

    fn tree(pairs: &[(&str, &str)]) -> ConfigurationTree {
        ConfigurationBuilder::new()
            .add_in_memory(pairs.iter().copied())
            .build()
            .unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct AdBlock {
        house: String,
        slots: Vec<u32>,
        enabled: bool,
        #[serde(default)]
        fallback: Option<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Mode {
        Fast,
        Safe,
    }

    #[test]
    fn test_bind_struct_case_insensitively() {
        let tree = tree(&[
            ("AdBlock:House", "Contoso"),
            ("AdBlock:Slots:1", "20"),
            ("AdBlock:Slots:0", "10"),
            ("AdBlock:Enabled", "True"),
        ]);
        let bound: AdBlock = tree.bind("adblock").unwrap();
        assert_eq!(
            bound,
            AdBlock {
                house: "Contoso".to_string(),
                slots: vec![10, 20],
                enabled: true,
                fallback: None,
            }
        );
    }

    #[test]
    fn test_snake_case_fields_match_pascal_case_keys() {
        #[derive(Deserialize)]
        struct Settings {
            ad_block: HashMap<String, String>,
        }

        let tree = tree(&[("AdBlock:House", "Contoso")]);
        let settings: Settings = tree.root().bind().unwrap();
        assert_eq!(settings.ad_block.get("House").map(String::as_str), Some("Contoso"));
    }

    #[test]
    fn test_bind_numeric_error_reports_path() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Retry {
            count: u32,
        }

        let tree = tree(&[("Retry:Count", "many")]);
        let err = tree.bind::<Retry>("Retry").unwrap_err();
        assert!(matches!(err, Error::Bind { ref path, .. } if path == "Retry"));
        assert!(err.to_string().contains("Retry:Count"));
    }

    #[test]
    fn test_bind_unit_enum() {
        let tree = tree(&[("Mode", "safe")]);
        assert_eq!(tree.bind::<Mode>("Mode").unwrap(), Mode::Safe);
        assert!(tree.bind::<Mode>("Missing").is_err());
    }

    #[test]
    fn test_bind_map() {
        let tree = tree(&[("Hosts:Primary", "a"), ("Hosts:Backup", "b")]);
        let hosts: HashMap<String, String> = tree.bind("Hosts").unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts["Backup"], "b");
    }

    #[test]
    fn test_bind_borrowed_str() {
        let tree = tree(&[("Name", "svc")]);
        let name: &str = tree.bind("Name").unwrap();
        assert_eq!(name, "svc");
    }

    #[test]
    fn test_bind_missing_required_field() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            value: String,
        }

        let tree = tree(&[("Other", "1")]);
        assert!(tree.bind::<Needs>("Section").is_err());
    }

    #[test]
    fn test_sequence_rejects_scalar() {
        let tree = tree(&[("List", "a,b")]);
        assert!(tree.bind::<Vec<String>>("List").is_err());
    }

    #[test]
    fn test_deserialize_any_to_json() {
        let tree = tree(&[("A:0", "x"), ("A:1", "y"), ("B:C", "z")]);
        let value: serde_json::Value = tree.root().bind().unwrap();
        assert_eq!(value, serde_json::json!({ "A": ["x", "y"], "B": { "C": "z" } }));
    }

    #[test]
    fn test_only_canonical_indices_form_sequences() {
        let tree = tree(&[("L:0", "a"), ("L:+1", "b"), ("M:1", "x"), ("M:01", "y")]);

        assert!(tree.bind::<Vec<String>>("L").is_err());
        let map: HashMap<String, String> = tree.bind("L").unwrap();
        assert_eq!(map["+1"], "b");

        let value: serde_json::Value = tree.root().bind().unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "L": { "0": "a", "+1": "b" }, "M": { "1": "x", "01": "y" } })
        );
    }

    #[test]
    fn test_sequence_orders_by_index() {
        let tree = tree(&[("L:10", "c"), ("L:2", "b"), ("L:0", "a")]);
        let list: Vec<String> = tree.bind("L").unwrap();
        assert_eq!(list, vec!["a", "b", "c"]);
    }
}
