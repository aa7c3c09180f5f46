use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SdkError};
use crate::util::atomic_file::write_atomically;

/// An ordered key / value bag with the semantics of a Java `.properties` file.
///
/// Keys are kept sorted, which is also the order in which they are written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertySet {
    entries: BTreeMap<String, String>,
}

impl PropertySet {
    pub fn new() -> PropertySet {
        Default::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn retain(&mut self, f: impl FnMut(&String, &mut String) -> bool) {
        self.entries.retain(f)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load(path: &Path) -> Result<PropertySet> {
        debug!("loading properties from {}", path.display());
        let bytes = fs::read(path)
            .map_err(|e| SdkError::io(path, e))?;
        PropertySet::parse(&decode(bytes))
            .map_err(|e| match e {
                SdkError::Configuration(msg) => SdkError::config(format!("{}: {}", path.display(), msg)),
                other => other,
            })
    }

    /// Writes all properties to `path`, replacing whatever was there before.
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!("saving {} properties to {}", self.len(), path.display());
        write_atomically(path, self.to_properties_string().as_bytes())
    }

    pub fn parse(text: &str) -> Result<PropertySet> {
        let mut result = PropertySet::new();

        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            let trimmed = line.trim_start_matches(is_properties_whitespace);
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }

            let mut logical = trimmed.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start_matches(is_properties_whitespace)),
                    None => break,
                }
            }

            let (key, value) = split_key_value(&logical);
            result.set(unescape(key)?, unescape(value)?);
        }
        Ok(result)
    }

    pub fn to_properties_string(&self) -> String {
        let mut result = String::new();
        for (key, value) in &self.entries {
            result.push_str(&escape(key, true));
            result.push('=');
            result.push_str(&escape(value, false));
            result.push('\n');
        }
        result
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<T: IntoIterator<Item=(K, V)>>(iter: T) -> Self {
        PropertySet {
            entries: iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for PropertySet {
    fn from(entries: BTreeMap<String, String>) -> Self {
        PropertySet { entries }
    }
}

/// `.properties` files are traditionally ISO-8859-1; UTF-8 content is accepted as well
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|b| *b as char).collect(),
    }
}

fn is_properties_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing_backslashes = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing_backslashes % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if c == '=' || c == ':' || is_properties_whitespace(c) {
            key_end = idx;
            break;
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches(is_properties_whitespace);
    let rest = match rest.chars().next() {
        Some('=') | Some(':') => rest[1..].trim_start_matches(is_properties_whitespace),
        _ => rest,
    };
    (key, rest)
}

fn unescape(raw: &str) -> Result<String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => result.push('\t'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('f') => result.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .ok_or_else(|| SdkError::config(format!("malformed \\uxxxx encoding in {:?}", raw)))?;
                result.push(decode_utf16_unit(code, &mut chars, raw)?);
            }
            Some(other) => result.push(other),
            None => {}
        }
    }
    Ok(result)
}

/// surrogate pairs are written as two consecutive \u escapes
fn decode_utf16_unit(code: u32, chars: &mut std::str::Chars, raw: &str) -> Result<char> {
    if let Some(c) = char::from_u32(code) {
        return Ok(c);
    }
    let malformed = || SdkError::config(format!("malformed surrogate pair in {:?}", raw));

    if !(0xD800..0xDC00).contains(&code) {
        return Err(malformed());
    }
    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err(malformed());
    }
    let hex: String = chars.by_ref().take(4).collect();
    let low = u32::from_str_radix(&hex, 16).map_err(|_| malformed())?;
    if !(0xDC00..0xE000).contains(&low) {
        return Err(malformed());
    }
    char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00))
        .ok_or_else(malformed)
}

fn escape(s: &str, is_key: bool) -> String {
    let mut result = String::with_capacity(s.len());
    for (idx, c) in s.chars().enumerate() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\t' => result.push_str("\\t"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\x0c' => result.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                result.push('\\');
                result.push(c);
            }
            ' ' if is_key || idx == 0 => result.push_str("\\ "),
            c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    result.push_str(&format!("\\u{:04X}", unit));
                }
            }
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod test {
    use rstest::*;
    use super::*;

    #[rstest]
    #[case::equals("omod.appui=1.2", "omod.appui", "1.2")]
    #[case::colon("omod.appui:1.2", "omod.appui", "1.2")]
    #[case::whitespace_separator("omod.appui   1.2", "omod.appui", "1.2")]
    #[case::spaces_around_equals("  omod.appui = 1.2", "omod.appui", "1.2")]
    #[case::empty_value("version=", "version", "")]
    #[case::key_only("version", "version", "")]
    #[case::escaped_separator_in_key("a\\=b=c", "a=b", "c")]
    #[case::url_value("connection.url=jdbc\\:mysql\\://localhost\\:3308/@DBNAME@", "connection.url", "jdbc:mysql://localhost:3308/@DBNAME@")]
    #[case::unicode("name=Ref\\u00E9rence", "name", "Ref\u{e9}rence")]
    #[case::trailing_spaces_kept("name=x  ", "name", "x  ")]
    fn test_parse_single_line(#[case] line: &str, #[case] key: &str, #[case] value: &str) {
        let props = PropertySet::parse(line).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.get(key), Some(value));
    }

    #[test]
    fn test_parse_comments_and_continuations() {
        let text = "#Fri Jan 01 00:00:00 UTC 2016\n\
                    ! also a comment\n\
                    \n\
                    user_modules=org.openmrs.module/appui/1.2,\\\n\
                    \x20   org.openmrs.module/legacyui/1.5\n\
                    war.openmrs=2.5.9\n";
        let props = PropertySet::parse(text).unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("user_modules"), Some("org.openmrs.module/appui/1.2,org.openmrs.module/legacyui/1.5"));
        assert_eq!(props.get("war.openmrs"), Some("2.5.9"));
    }

    #[test]
    fn test_malformed_unicode_escape() {
        assert!(matches!(PropertySet::parse("a=\\u12"), Err(SdkError::Configuration(_))));
    }

    #[test]
    fn test_written_form_is_sorted_and_escaped() {
        let props: PropertySet = vec![
            ("war.openmrs", "2.5.9"),
            ("connection.url", "jdbc:h2:@APPLICATIONDATADIR@/database/@DBNAME@"),
            ("name", " leading space"),
        ].into_iter().collect();

        assert_eq!(
            props.to_properties_string(),
            "connection.url=jdbc\\:h2\\:@APPLICATIONDATADIR@/database/@DBNAME@\n\
             name=\\ leading space\n\
             war.openmrs=2.5.9\n"
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openmrs-distro.properties");

        let props: PropertySet = vec![
            ("omod.appui", "1.2"),
            ("omod.appui.groupId", "org.example"),
            ("key with spaces", "tab\there"),
            ("name", "R\u{e9}f \u{1F600}"),
        ].into_iter().collect();
        props.save(&path).unwrap();

        let loaded = PropertySet::load(&path).unwrap();
        assert_eq!(loaded, props);
    }

    #[test]
    fn test_load_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.properties");
        std::fs::write(&path, b"name=R\xe9f\n").unwrap();

        let loaded = PropertySet::load(&path).unwrap();
        assert_eq!(loaded.get("name"), Some("R\u{e9}f"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(PropertySet::load(&dir.path().join("nope.properties")), Err(SdkError::Io { .. })));
    }
}
