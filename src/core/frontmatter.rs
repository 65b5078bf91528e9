//! Frontmatter detection, merging, and encoding
//!
//! A note's header is a `---`-fenced YAML block at the top of the file.
//! [`merge`] installs an authoritative field set into a document while
//! preserving the body byte-for-byte; an empty set removes the header.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex_lite::Regex;
use serde_yaml::{Mapping, Value};

/// Header fence delimiter
const DELIMITER: &str = "---";

static SINGLE_QUOTED_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(\[\[[^']*\]\])'").expect("link regex"));

static DOUBLE_QUOTED_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(\[\[[^"]*\]\])""#).expect("link regex"));

/// A single frontmatter value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain string scalar
    Scalar(String),
    /// Numeric scalar
    Number(f64),
    /// Calendar date, rendered as `YYYY-MM-DD`
    Date(NaiveDate),
    /// Cross-reference to another note by title, rendered as `[[title]]`
    Reference(String),
    /// Any other YAML shape, passed through the merge untouched
    Other(Value),
    /// Delete this key on merge
    Absent,
}

impl FieldValue {
    /// Decode a YAML value into its tagged form
    ///
    /// The vault format writes links as bare `[[title]]` tokens, which the
    /// YAML parser sees as a single-element sequence of a single-element
    /// sequence. That shape, and the quoted string form, both decode to
    /// [`FieldValue::Reference`]. This is the only place shapes are sniffed.
    pub fn from_yaml(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Absent,
            Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => {
                if let Some(name) = strip_link(&s) {
                    FieldValue::Reference(name.to_string())
                } else if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                    FieldValue::Date(date)
                } else {
                    FieldValue::Scalar(s)
                }
            }
            Value::Sequence(ref seq) => {
                if let [Value::Sequence(inner)] = seq.as_slice() {
                    if let [Value::String(name)] = inner.as_slice() {
                        return FieldValue::Reference(name.clone());
                    }
                }
                FieldValue::Other(value)
            }
            other => FieldValue::Other(other),
        }
    }

    /// Encode as a YAML value, `None` for [`FieldValue::Absent`]
    fn to_yaml(&self) -> Option<Value> {
        match self {
            FieldValue::Scalar(s) => Some(Value::String(s.clone())),
            FieldValue::Number(n) => Some(Value::Number(yaml_number(*n))),
            FieldValue::Date(d) => Some(Value::String(d.format("%Y-%m-%d").to_string())),
            FieldValue::Reference(name) => Some(Value::String(format!("[[{name}]]"))),
            FieldValue::Other(v) => Some(v.clone()),
            FieldValue::Absent => None,
        }
    }

    /// Borrow the scalar string, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The referenced note title, if this is a link
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            FieldValue::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// The calendar date, if any
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// The numeric value, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Render scalar-like values as display text
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Scalar(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FieldValue::Reference(name) => Some(name.clone()),
            _ => None,
        }
    }
}

/// An insertion-ordered set of frontmatter fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    entries: Vec<(String, FieldValue)>,
}

impl FieldSet {
    /// Create an empty field set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the set has no fields
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Install a value, replacing any existing entry for the key
    ///
    /// [`FieldValue::Absent`] removes the key.
    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        if matches!(value, FieldValue::Absent) {
            self.entries.retain(|(k, _)| k != &key);
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| k == &key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a field by key
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Decode the header fields of a full document, empty when absent or malformed
    pub fn from_document(document: &str) -> Self {
        match detect(document) {
            Some(span) => {
                Self::from_yaml_str(&document[span.fields..span.close]).unwrap_or_default()
            }
            None => Self::default(),
        }
    }

    /// Decode a field set from YAML text, `None` when it is not a mapping
    pub fn from_yaml_str(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return Some(Self::default());
        }
        let mapping: Mapping = serde_yaml::from_str(text).ok()?;
        let mut fields = Self::new();
        for (key, value) in mapping {
            let Value::String(key) = key else { continue };
            match FieldValue::from_yaml(value) {
                FieldValue::Absent => {}
                value => fields.set(key, value),
            }
        }
        Some(fields)
    }

    fn to_mapping(&self) -> Mapping {
        let mut mapping = Mapping::new();
        for (key, value) in self.iter() {
            if let Some(value) = value.to_yaml() {
                mapping.insert(Value::String(key.to_string()), value);
            }
        }
        mapping
    }
}

/// Byte offsets of a detected header block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSpan {
    /// Start of the opening delimiter line
    pub open: usize,
    /// Start of the field block, just past the opening line
    pub fields: usize,
    /// Start of the closing delimiter line
    pub close: usize,
    /// Start of the body, just past the closing line
    pub body: usize,
}

/// Locate the frontmatter block
///
/// A header is opened only when the first non-blank line, trimmed, is
/// exactly the delimiter; it is present only when a later line closes it.
/// Anything else, including a lone opening delimiter, is "no header".
pub fn detect(document: &str) -> Option<HeaderSpan> {
    let mut open: Option<(usize, usize)> = None;
    let mut offset = 0;
    for line in document.split_inclusive('\n') {
        let next = offset + line.len();
        let trimmed = line.trim();
        match open {
            None => {
                if !trimmed.is_empty() {
                    if trimmed != DELIMITER {
                        return None;
                    }
                    open = Some((offset, next));
                }
            }
            Some((open_at, fields_at)) => {
                if trimmed == DELIMITER {
                    return Some(HeaderSpan {
                        open: open_at,
                        fields: fields_at,
                        close: offset,
                        body: next,
                    });
                }
            }
        }
        offset = next;
    }
    None
}

/// Install `fields` as the document's header, preserving the body
///
/// The field set is authoritative: an existing header is replaced wholesale
/// and an empty set removes the header. Pure and total; malformed delimiters
/// degrade to the no-header branch.
pub fn merge(document: &str, fields: &FieldSet) -> String {
    match (fields.is_empty(), detect(document)) {
        (false, Some(span)) => {
            let block = encode(fields);
            let mut out = String::with_capacity(document.len() + block.len());
            out.push_str(&document[..span.fields]);
            out.push_str(&block);
            out.push_str(&document[span.close..]);
            out
        }
        (false, None) => {
            format!("{DELIMITER}\n{}{DELIMITER}\n\n{document}", encode(fields))
        }
        (true, Some(span)) => {
            let mut out = String::with_capacity(document.len());
            out.push_str(&document[..span.open]);
            out.push_str(&document[span.body..]);
            out
        }
        (true, None) => document.to_string(),
    }
}

/// Encode a field set as a YAML block
fn encode(fields: &FieldSet) -> String {
    let encoded =
        serde_yaml::to_string(&fields.to_mapping()).expect("frontmatter mapping serializes");
    unquote_links(&encoded)
}

/// Re-expose quoted link tokens
///
/// The YAML emitter quotes bracket-initial scalars; the vault treats bare
/// `[[...]]` tokens as links, so the quotes come back off.
fn unquote_links(encoded: &str) -> String {
    let pass = SINGLE_QUOTED_LINK.replace_all(encoded, "$1");
    DOUBLE_QUOTED_LINK.replace_all(&pass, "$1").into_owned()
}

fn strip_link(s: &str) -> Option<&str> {
    s.strip_prefix("[[").and_then(|s| s.strip_suffix("]]"))
}

fn yaml_number(n: f64) -> serde_yaml::Number {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        serde_yaml::Number::from(n as i64)
    } else {
        serde_yaml::Number::from(n)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_fields_no_header_is_identity() {
        assert_eq!(merge("# Bob", &FieldSet::new()), "# Bob");
        assert_eq!(merge("", &FieldSet::new()), "");
    }

    #[test]
    fn fresh_header_preserves_document_as_suffix() {
        let mut fields = FieldSet::new();
        fields.set("birthday", FieldValue::Date(date("2020-01-01")));
        let merged = merge("# Bob", &fields);
        assert!(merged.starts_with("---\n"));
        assert!(merged.contains("birthday: 2020-01-01"));
        assert!(merged.ends_with("# Bob"));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut fields = FieldSet::new();
        fields.set("birthday", FieldValue::Date(date("2020-01-01")));
        fields.set("mother", FieldValue::Reference("Alice".to_string()));
        let once = merge("# Bob\n\nSome text.\n", &fields);
        let twice = merge(&once, &fields);
        assert_eq!(once, twice);
    }

    #[test]
    fn deletion_round_trip_removes_header() {
        let mut fields = FieldSet::new();
        fields.set("city", FieldValue::Scalar("Springfield".to_string()));
        let merged = merge("# Bob", &fields);
        let cleared = merge(&merged, &FieldSet::new());
        assert!(detect(&cleared).is_none());
        assert!(cleared.ends_with("# Bob"));
    }

    #[test]
    fn deletes_existing_header() {
        let cleared = merge("---\na: 1\n---\nbody\n", &FieldSet::new());
        assert_eq!(cleared, "body\n");
    }

    #[test]
    fn link_fields_are_never_quoted() {
        let mut fields = FieldSet::new();
        fields.set("father", FieldValue::Reference("Alice".to_string()));
        let merged = merge("", &fields);
        assert!(merged.contains("father: [[Alice]]"));
        assert!(!merged.contains("'[[Alice]]'"));
        assert!(!merged.contains("\"[[Alice]]\""));
    }

    #[test]
    fn replaces_existing_header_wholesale() {
        let document = "---\nbirthday: 2020-01-01\n---\n\n# Bob";
        let mut fields = FieldSet::new();
        fields.set("birthday", FieldValue::Date(date("2021-02-02")));
        fields.set("mother", FieldValue::Reference("Alice".to_string()));
        let merged = merge(document, &fields);
        assert!(merged.contains("birthday: 2021-02-02"));
        assert!(!merged.contains("2020-01-01"));
        assert!(merged.contains("mother: [[Alice]]"));
        assert!(merged.ends_with("---\n\n# Bob"));
    }

    #[test]
    fn lone_delimiter_is_not_a_header() {
        assert!(detect("---\nno closing fence").is_none());
        let merged = merge("---\nno closing fence", &FieldSet::new());
        assert_eq!(merged, "---\nno closing fence");
    }

    #[test]
    fn delimiter_past_first_line_is_not_a_header() {
        assert!(detect("# Bob\n---\n---\n").is_none());
    }

    #[test]
    fn leading_blank_lines_still_open_a_header() {
        let span = detect("\n\n---\na: 1\n---\nbody").unwrap();
        assert_eq!(span.open, 2);
        let fields = FieldSet::from_document("\n\n---\na: 1\n---\nbody");
        assert_eq!(fields.get("a").and_then(FieldValue::as_number), Some(1.0));
    }

    #[test]
    fn header_without_trailing_newline_is_spliced() {
        let mut fields = FieldSet::new();
        fields.set("a", FieldValue::Number(2.0));
        assert_eq!(merge("---\na: 1\n---", &fields), "---\na: 2\n---");
    }

    #[test]
    fn decodes_nested_sequence_as_reference() {
        let fields = FieldSet::from_document("---\nmother: [[Alice]]\n---\n");
        assert_eq!(
            fields.get("mother").and_then(FieldValue::as_reference),
            Some("Alice")
        );
        let quoted = FieldSet::from_document("---\nmother: \"[[Alice]]\"\n---\n");
        assert_eq!(
            quoted.get("mother").and_then(FieldValue::as_reference),
            Some("Alice")
        );
    }

    #[test]
    fn decodes_dates_and_numbers() {
        let fields = FieldSet::from_document("---\nbirthday: 1990-06-15\npost-code: 12345\n---\n");
        assert_eq!(
            fields.get("birthday").and_then(FieldValue::as_date),
            Some(date("1990-06-15"))
        );
        assert_eq!(
            fields.get("post-code").and_then(FieldValue::as_number),
            Some(12345.0)
        );
    }

    #[test]
    fn absent_removes_the_key() {
        let mut fields = FieldSet::new();
        fields.set("phone", FieldValue::Scalar("555-1234".to_string()));
        fields.set("phone", FieldValue::Absent);
        assert!(fields.is_empty());
        assert!(fields.get("phone").is_none());
    }

    #[test]
    fn set_replaces_in_place() {
        let mut fields = FieldSet::new();
        fields.set("a", FieldValue::Number(1.0));
        fields.set("b", FieldValue::Number(2.0));
        fields.set("a", FieldValue::Number(3.0));
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(fields.get("a").and_then(FieldValue::as_number), Some(3.0));
    }

    #[test]
    fn integers_encode_without_fraction() {
        let mut fields = FieldSet::new();
        fields.set("post-code", FieldValue::Number(12345.0));
        let merged = merge("", &fields);
        assert!(merged.contains("post-code: 12345\n"));
    }

    #[test]
    fn foreign_fields_survive_a_round_trip() {
        let document = "---\ntags:\n- family\n- friends\nmother: [[Alice]]\n---\nbody\n";
        let fields = FieldSet::from_document(document);
        let merged = merge(document, &fields);
        let reread = FieldSet::from_document(&merged);
        assert_eq!(fields, reread);
        assert!(merged.contains("- family"));
        assert!(merged.contains("mother: [[Alice]]"));
        assert!(merged.ends_with("body\n"));
    }
}
