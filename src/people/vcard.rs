//! Minimal vCard decoding for contact import
//!
//! Implements just the properties the person mapping depends on: FN, BDAY,
//! TEL, EMAIL, URL, and ADR. Folded physical lines are joined before
//! parsing; property names and parameters are case-insensitive.

use chrono::NaiveDate;
use thiserror::Error;

/// vCard parse failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VcardError {
    #[error("missing BEGIN:VCARD")]
    MissingBegin,
    #[error("missing END:VCARD")]
    MissingEnd,
    #[error("malformed content line: {0}")]
    MalformedLine(String),
}

/// One content line: `NAME;PARAM=VALUE;...:value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name, upper-cased
    pub name: String,
    /// Raw parameters, upper-cased
    pub params: Vec<String>,
    pub value: String,
}

impl Property {
    fn parse(line: &str) -> Result<Self, VcardError> {
        let (head, value) = line
            .split_once(':')
            .ok_or_else(|| VcardError::MalformedLine(line.to_string()))?;
        let mut parts = head.split(';');
        let name = parts
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();
        if name.is_empty() {
            return Err(VcardError::MalformedLine(line.to_string()));
        }
        let params = parts.map(|p| p.trim().to_ascii_uppercase()).collect();
        Ok(Self {
            name,
            params,
            value: value.trim().to_string(),
        })
    }

    /// Whether the property carries the given type tag
    ///
    /// Recognizes both `TYPE=cell` (3.0/4.0) and bare `;CELL` (2.1) forms.
    pub fn has_type(&self, tag: &str) -> bool {
        let tag = tag.to_ascii_uppercase();
        self.params.iter().any(|p| {
            p == &tag
                || p.strip_prefix("TYPE=")
                    .is_some_and(|v| v.split(',').any(|v| v == tag))
        })
    }
}

/// Address components in their positional ADR order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub post_code: Option<i64>,
    pub country: Option<String>,
}

/// A parsed contact card
#[derive(Debug, Clone, Default)]
pub struct Card {
    properties: Vec<Property>,
}

impl Card {
    /// Parse a vCard text
    pub fn parse(text: &str) -> Result<Self, VcardError> {
        let mut properties = Vec::new();
        let mut begun = false;
        let mut ended = false;
        for line in unfold(text) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !begun {
                if line.eq_ignore_ascii_case("BEGIN:VCARD") {
                    begun = true;
                    continue;
                }
                return Err(VcardError::MissingBegin);
            }
            if line.eq_ignore_ascii_case("END:VCARD") {
                ended = true;
                break;
            }
            properties.push(Property::parse(line)?);
        }
        if !begun {
            return Err(VcardError::MissingBegin);
        }
        if !ended {
            return Err(VcardError::MissingEnd);
        }
        Ok(Self { properties })
    }

    fn first(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// FN: display name
    pub fn full_name(&self) -> Option<String> {
        self.first("FN")
            .map(|p| p.value.clone())
            .filter(|v| !v.is_empty())
    }

    /// BDAY: compact `YYYYMMDD`, dashed form tolerated
    pub fn birthday(&self) -> Option<NaiveDate> {
        self.first("BDAY").and_then(|p| parse_birthday(&p.value))
    }

    /// TEL: the cell-typed number when several are present
    pub fn phone(&self) -> Option<String> {
        let tels: Vec<&Property> = self
            .properties
            .iter()
            .filter(|p| p.name == "TEL")
            .collect();
        match tels.as_slice() {
            [] => None,
            [tel] => Some(tel.value.clone()),
            many => many
                .iter()
                .find(|p| p.has_type("cell"))
                .map(|p| p.value.clone()),
        }
    }

    /// EMAIL
    pub fn email(&self) -> Option<String> {
        self.first("EMAIL")
            .map(|p| p.value.clone())
            .filter(|v| !v.is_empty())
    }

    /// URL
    pub fn url(&self) -> Option<String> {
        self.first("URL")
            .map(|p| p.value.clone())
            .filter(|v| !v.is_empty())
    }

    /// ADR: positional components, first instance wins
    ///
    /// Street at index 2, city at 3, postal code at 5, country at 6.
    pub fn address(&self) -> Option<Address> {
        let adr = self.first("ADR")?;
        let parts: Vec<&str> = adr.value.split(';').collect();
        let component = |i: usize| {
            parts
                .get(i)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Address {
            street: component(2),
            city: component(3),
            post_code: parts.get(5).and_then(|s| s.trim().parse().ok()),
            country: component(6),
        })
    }
}

/// Join folded physical lines (continuations start with space or tab)
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

fn parse_birthday(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    if v.len() == 8 && v.bytes().all(|b| b.is_ascii_digit()) {
        let year = v[0..4].parse().ok()?;
        let month = v[4..6].parse().ok()?;
        let day = v[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()
}
