//! INI-style parser.

use crate::flat_map::FlatMap;
use crate::key::{ConfigKey, KEY_DELIMITER};

use super::{ConfigParser, DuplicateKeys, ParseError};

const NAME: &str = "ini";

/// Parser for INI-like content.
///
/// - Blank lines and lines starting with `;`, `#` or `/` are ignored
/// - `[Section]` prefixes following keys with `Section:`; nested sections
///   may be written as `[Outer:Inner]`
/// - `key=value` pairs; key and value are trimmed and a value wrapped in
///   double quotes is unquoted
///
/// # Examples
///
/// ```
/// use confstack::parser::{ConfigParser, IniParser};
///
/// let map = IniParser::new()
///     .parse("Name=svc\n[Retry]\nCount = 42\n")
///     .unwrap();
/// assert_eq!(map.get("Name"), Some("svc"));
/// assert_eq!(map.get("Retry:Count"), Some("42"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IniParser {
    duplicates: DuplicateKeys,
}

impl IniParser {
    /// Create a parser where repeated keys overwrite earlier ones.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser that rejects repeated keys.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            duplicates: DuplicateKeys::Reject,
        }
    }

    /// Set the duplicate key policy.
    #[must_use]
    pub fn with_duplicates(mut self, duplicates: DuplicateKeys) -> Self {
        self.duplicates = duplicates;
        self
    }
}

impl ConfigParser for IniParser {
    fn name(&self) -> &str {
        NAME
    }

    fn parse(&self, content: &str) -> Result<FlatMap, ParseError> {
        let mut map = FlatMap::new();
        let mut section = String::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with([';', '#', '/']) {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| {
                    ParseError::at_line(NAME, line_no, "unterminated section header")
                })?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(ParseError::at_line(NAME, line_no, "empty section name"));
                }
                section = format!("{name}{KEY_DELIMITER}");
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                ParseError::at_line(NAME, line_no, format!("expected key=value, found '{line}'"))
            })?;

            let key = key.trim();
            if key.is_empty() {
                return Err(ParseError::at_line(NAME, line_no, "empty key"));
            }

            let value = unquote(value.trim());
            self.duplicates.insert(
                &mut map,
                NAME,
                line_no,
                ConfigKey::parse(&format!("{section}{key}")),
                value.to_string(),
            )?;
        }

        Ok(map)
    }
}

fn unquote(value: &str) -> &str {
    if value.len() > 1 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_prefix_keys() {
        let map = IniParser::new()
            .parse("[AdBlock]\nHouse=Contoso\n")
            .unwrap();
        assert_eq!(map.get("AdBlock:House"), Some("Contoso"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_keys_before_any_section() {
        let map = IniParser::new().parse("a=1\n[s]\nb=2").unwrap();
        assert_eq!(map.get("a"), Some("1"));
        assert_eq!(map.get("s:b"), Some("2"));
    }

    #[test]
    fn test_nested_section_header() {
        let map = IniParser::new().parse("[Data:Primary]\nHost=db\n").unwrap();
        assert_eq!(map.get("Data:Primary:Host"), Some("db"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let content = "; comment\n# another\n/ slash comment\n\n  \nkey=value\n";
        let map = IniParser::new().parse(content).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_quoted_values_and_whitespace() {
        let map = IniParser::new()
            .parse("  name  =  \"  padded  \"  \nempty=\nquote=\"\n")
            .unwrap();
        assert_eq!(map.get("name"), Some("  padded  "));
        assert_eq!(map.get("empty"), Some(""));
        assert_eq!(map.get("quote"), Some("\""));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let map = IniParser::new().parse("conn=a=b;c=d").unwrap();
        assert_eq!(map.get("conn"), Some("a=b;c=d"));
    }

    #[test]
    fn test_unterminated_section_header() {
        let err = IniParser::new().parse("ok=1\n[Broken\nx=1").unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.contains("unterminated section header"));
    }

    #[test]
    fn test_malformed_line() {
        let err = IniParser::new().parse("[s]\njust text\n").unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.contains("expected key=value"));
    }

    #[test]
    fn test_empty_key() {
        let err = IniParser::new().parse("=value").unwrap_err();
        assert!(err.message.contains("empty key"));
    }

    #[test]
    fn test_duplicate_last_wins_by_default() {
        let map = IniParser::new().parse("[s]\na=1\nA=2\n").unwrap();
        assert_eq!(map.get("s:a"), Some("2"));
    }

    #[test]
    fn test_strict_rejects_duplicates() {
        let err = IniParser::strict().parse("[s]\na=1\n[S]\nA=2\n").unwrap_err();
        assert_eq!(err.line, Some(4));
        assert!(err.message.contains("duplicate key"));
    }

    #[test]
    fn test_deterministic() {
        let content = "[x]\nb=2\na=1\n";
        let first = IniParser::new().parse(content).unwrap();
        let second = IniParser::new().parse(content).unwrap();
        assert_eq!(first, second);
    }
}
