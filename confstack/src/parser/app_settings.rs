//! Parser for `*.config` application-settings files.
//!
//! Only the subset of XML these files use is recognized: elements,
//! attributes with quoted values, comments, processing instructions and
//! declarations. Text between elements is ignored.

use crate::flat_map::FlatMap;
use crate::key::ConfigKey;

use super::{ConfigParser, DuplicateKeys, ParseError};

const NAME: &str = "config";
const CONNECTION_STRINGS: &str = "ConnectionStrings";

/// Parser for `*.config` files.
///
/// - `<add key="K" value="V"/>` inside `<appSettings>` yields `K`
/// - `<add name="N" connectionString="C" providerName="P"/>` inside
///   `<connectionStrings>` yields `ConnectionStrings:N` and
///   `ConnectionStrings:N:ProviderName`
/// - `<add key="K" value="V"/>` inside any other element `E` yields `E:K`
/// - `<remove key="K"/>` (or `name=` for connection strings) drops a key
///   and `<clear/>` drops everything the enclosing element added
///
/// # Examples
///
/// ```
/// use confstack::parser::{AppSettingsParser, ConfigParser};
///
/// let content = r#"<configuration>
///   <appSettings>
///     <add key="Retry:Count" value="42" />
///   </appSettings>
///   <connectionStrings>
///     <add name="Main" connectionString="Server=db" providerName="System.Data.SqlClient" />
///   </connectionStrings>
/// </configuration>"#;
///
/// let map = AppSettingsParser::new().parse(content).unwrap();
/// assert_eq!(map.get("Retry:Count"), Some("42"));
/// assert_eq!(map.get("ConnectionStrings:Main"), Some("Server=db"));
/// assert_eq!(map.get("ConnectionStrings:Main:ProviderName"), Some("System.Data.SqlClient"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AppSettingsParser {
    duplicates: DuplicateKeys,
}

impl AppSettingsParser {
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
}

impl ConfigParser for AppSettingsParser {
    fn name(&self) -> &str {
        NAME
    }

    fn parse(&self, content: &str) -> Result<FlatMap, ParseError> {
        Scanner::new(content, self.duplicates).run()
    }
}

/// An open element and the keys added while it was open.
struct Frame {
    name: String,
    added: Vec<ConfigKey>,
}

struct Tag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

impl Tag {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct Scanner<'a> {
    content: &'a str,
    pos: usize,
    duplicates: DuplicateKeys,
    stack: Vec<Frame>,
    map: FlatMap,
    seen_element: bool,
}

impl<'a> Scanner<'a> {
    fn new(content: &'a str, duplicates: DuplicateKeys) -> Self {
        Self {
            content,
            pos: 0,
            duplicates,
            stack: Vec::new(),
            map: FlatMap::new(),
            seen_element: false,
        }
    }

    fn line(&self, pos: usize) -> usize {
        self.content[..pos].matches('\n').count() + 1
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> ParseError {
        ParseError::at_line(NAME, self.line(pos), message)
    }

    fn rest(&self) -> &'a str {
        &self.content[self.pos..]
    }

    fn run(mut self) -> Result<FlatMap, ParseError> {
        loop {
            let Some(offset) = self.rest().find('<') else {
                break;
            };

            if !self.seen_element && !self.rest()[..offset].trim().is_empty() {
                return Err(self.error(self.pos, "expected an element"));
            }

            self.pos += offset;
            let start = self.pos;
            let rest = self.rest();

            if rest.starts_with("<!--") {
                self.skip_past(start, "-->", "unterminated comment")?;
            } else if rest.starts_with("<?") {
                self.skip_past(start, "?>", "unterminated declaration")?;
            } else if rest.starts_with("<![CDATA[") {
                self.skip_past(start, "]]>", "unterminated CDATA section")?;
            } else if rest.starts_with("<!") {
                self.skip_declaration(start)?;
            } else if rest.starts_with("</") {
                self.close_element(start)?;
            } else {
                let tag = self.read_tag(start)?;
                self.seen_element = true;
                self.open_element(start, tag)?;
            }
        }

        if !self.seen_element {
            return Err(self.error(self.pos, "expected an element"));
        }

        if let Some(frame) = self.stack.last() {
            return Err(self.error(
                self.content.len(),
                format!("unclosed element <{}>", frame.name),
            ));
        }

        Ok(self.map)
    }

    fn skip_past(&mut self, start: usize, terminator: &str, message: &str) -> Result<(), ParseError> {
        match self.rest().find(terminator) {
            Some(offset) => {
                self.pos += offset + terminator.len();
                Ok(())
            }
            None => Err(self.error(start, message)),
        }
    }

    /// Skip a `<!DOCTYPE ...>`-style declaration, including a bracketed
    /// internal subset.
    fn skip_declaration(&mut self, start: usize) -> Result<(), ParseError> {
        let rest = self.rest();
        let unterminated = || self.error(start, "unterminated declaration");
        let close = rest.find('>').ok_or_else(unterminated)?;

        match rest.find('[') {
            Some(open) if open < close => {
                let subset_end = rest[open..].find(']').ok_or_else(unterminated)? + open;
                let after = &rest[subset_end + 1..];
                let trailing = after.len() - after.trim_start().len();
                if !after[trailing..].starts_with('>') {
                    return Err(unterminated());
                }
                self.pos += subset_end + 1 + trailing + 1;
            }
            _ => self.pos += close + 1,
        }
        Ok(())
    }

    fn close_element(&mut self, start: usize) -> Result<(), ParseError> {
        let end = self
            .rest()
            .find('>')
            .ok_or_else(|| self.error(start, "unterminated closing tag"))?;
        let name = self.rest()[2..end].trim().to_string();
        self.pos += end + 1;

        match self.stack.pop() {
            Some(frame) if frame.name == name => Ok(()),
            Some(frame) => Err(self.error(
                start,
                format!("expected </{}>, found </{name}>", frame.name),
            )),
            None => Err(self.error(start, format!("unexpected closing tag </{name}>"))),
        }
    }

    fn read_tag(&mut self, start: usize) -> Result<Tag, ParseError> {
        let bytes = self.content.as_bytes();
        let mut i = self.pos + 1;

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'/' && bytes[i] != b'>' {
            i += 1;
        }
        let name = self.content[name_start..i].to_string();
        if name.is_empty() {
            return Err(self.error(start, "missing element name"));
        }

        let mut attributes = Vec::new();
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(self.error(start, format!("unterminated tag <{name}")));
            }
            match bytes[i] {
                b'>' => {
                    self.pos = i + 1;
                    return Ok(Tag {
                        name,
                        attributes,
                        self_closing: false,
                    });
                }
                b'/' => {
                    if bytes.get(i + 1) != Some(&b'>') {
                        return Err(self.error(start, format!("malformed tag <{name}")));
                    }
                    self.pos = i + 2;
                    return Ok(Tag {
                        name,
                        attributes,
                        self_closing: true,
                    });
                }
                _ => {
                    let (attribute, next) = self.read_attribute(start, &name, i)?;
                    attributes.push(attribute);
                    i = next;
                }
            }
        }
    }

    fn read_attribute(
        &self,
        start: usize,
        tag: &str,
        mut i: usize,
    ) -> Result<((String, String), usize), ParseError> {
        let bytes = self.content.as_bytes();
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
            i += 1;
        }
        let name = self.content[name_start..i].to_string();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            return Err(self.error(
                start,
                format!("attribute '{name}' of <{tag}> has no value"),
            ));
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let quote = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(self.error(
                    start,
                    format!("value of attribute '{name}' must be quoted"),
                ))
            }
        };
        i += 1;
        let value_start = i;
        while i < bytes.len() && bytes[i] != quote {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(self.error(start, format!("unterminated value for attribute '{name}'")));
        }
        let value = decode_entities(&self.content[value_start..i])
            .map_err(|message| self.error(start, message))?;
        Ok(((name, value), i + 1))
    }

    fn open_element(&mut self, start: usize, tag: Tag) -> Result<(), ParseError> {
        let parent = self.stack.last().map(|f| f.name.clone());

        if tag.name.eq_ignore_ascii_case("add") {
            self.add(start, parent.as_deref(), &tag)?;
        } else if tag.name.eq_ignore_ascii_case("remove") {
            self.remove(start, parent.as_deref(), &tag)?;
        } else if tag.name.eq_ignore_ascii_case("clear") {
            if let Some(frame) = self.stack.last_mut() {
                for key in frame.added.drain(..) {
                    self.map.remove(key.as_str());
                }
            }
        }

        if !tag.self_closing {
            self.stack.push(Frame {
                name: tag.name,
                added: Vec::new(),
            });
        }
        Ok(())
    }

    fn add(&mut self, start: usize, parent: Option<&str>, tag: &Tag) -> Result<(), ParseError> {
        let line = self.line(start);

        if is_connection_strings(parent) {
            let name = tag
                .attribute("name")
                .ok_or_else(|| self.error(start, "<add> in <connectionStrings> requires a name"))?;
            let key = ConfigKey::from_segments([CONNECTION_STRINGS, name]);
            let value = tag.attribute("connectionString").unwrap_or_default();
            self.record(line, key.clone(), value)?;
            if let Some(provider) = tag.attribute("providerName") {
                self.record(line, key.join("ProviderName"), provider)?;
            }
            return Ok(());
        }

        let name = tag
            .attribute("key")
            .ok_or_else(|| self.error(start, "<add> requires a key"))?;
        let value = tag.attribute("value").unwrap_or_default();
        self.record(line, setting_key(parent, name), value)
    }

    fn remove(&mut self, start: usize, parent: Option<&str>, tag: &Tag) -> Result<(), ParseError> {
        if is_connection_strings(parent) {
            let name = tag
                .attribute("name")
                .ok_or_else(|| self.error(start, "<remove> in <connectionStrings> requires a name"))?;
            let key = ConfigKey::from_segments([CONNECTION_STRINGS, name]);
            self.map.remove(key.join("ProviderName").as_str());
            self.map.remove(key.as_str());
            return Ok(());
        }

        let name = tag
            .attribute("key")
            .ok_or_else(|| self.error(start, "<remove> requires a key"))?;
        self.map.remove(setting_key(parent, name).as_str());
        Ok(())
    }

    fn record(&mut self, line: usize, key: ConfigKey, value: &str) -> Result<(), ParseError> {
        self.duplicates
            .insert(&mut self.map, NAME, line, key.clone(), value.to_string())?;
        if let Some(frame) = self.stack.last_mut() {
            frame.added.push(key);
        }
        Ok(())
    }
}

fn is_connection_strings(parent: Option<&str>) -> bool {
    parent.is_some_and(|p| p.eq_ignore_ascii_case("connectionStrings"))
}

fn setting_key(parent: Option<&str>, name: &str) -> ConfigKey {
    match parent {
        Some(p) if !p.eq_ignore_ascii_case("appSettings") => ConfigKey::parse(p).join(name),
        _ => ConfigKey::parse(name),
    }
}

/// Decode the predefined entities and numeric character references.
///
/// Unknown named entities are kept verbatim.
fn decode_entities(raw: &str) -> Result<String, String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let Some(semi) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "amp" => Some('&'),
            _ => match entity.strip_prefix('#') {
                Some(reference) => Some(decode_char_reference(reference)?),
                None => None,
            },
        };

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn decode_char_reference(reference: &str) -> Result<char, String> {
    let (digits, radix) = match reference.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (reference, 10),
    };
    let valid_digits = !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
    valid_digits
        .then(|| u32::from_str_radix(digits, radix).ok())
        .flatten()
        .and_then(char::from_u32)
        .filter(|&c| c != '\0')
        .ok_or_else(|| format!("invalid character reference '&#{reference};'"))
}
