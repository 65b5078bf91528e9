//! Person view model derived from a note's header

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};

use crate::core::frontmatter::{merge, FieldSet, FieldValue};
use crate::core::metadata::MetadataCache;
use crate::core::vault::Vault;
use crate::people::index::FamilyIndex;
use crate::people::vcard::Card;

/// A person, backed by one note
#[derive(Debug, Clone, Default)]
pub struct Person {
    /// Person name, the note's file stem
    pub name: String,
    /// Backing note, when one exists
    pub path: Option<PathBuf>,
    pub birthday: Option<NaiveDate>,
    /// Mother's name, a link in the header
    pub mother: Option<String>,
    /// Father's name, a link in the header
    pub father: Option<String>,
    /// Names of notes that reference this person as a parent
    pub children: Vec<String>,
    pub street: Option<String>,
    pub post_code: Option<i64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

impl Person {
    /// Start a person with no backing note yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a person from a note
    pub fn from_note(
        vault: &Vault,
        cache: &mut MetadataCache,
        index: &FamilyIndex,
        path: &Path,
    ) -> Result<Self> {
        let fields = cache.fields_for(vault, path)?;
        let name = Vault::note_stem(path);

        let mut person = Person::new(&name);
        person.path = Some(path.to_path_buf());
        person.birthday = fields.get("birthday").and_then(FieldValue::as_date);
        person.mother = reference_field(&fields, "mother");
        person.father = reference_field(&fields, "father");
        person.children = index.children_of(&name).to_vec();
        person.street = text_field(&fields, "street");
        person.post_code = number_field(&fields, "post-code");
        person.city = text_field(&fields, "city");
        person.country = text_field(&fields, "country");
        person.phone = text_field(&fields, "phone");
        person.email = text_field(&fields, "email");
        person.url = text_field(&fields, "url");
        Ok(person)
    }

    /// Load a person by name, `None` when there is no note
    pub fn load(
        vault: &Vault,
        cache: &mut MetadataCache,
        index: &FamilyIndex,
        name: &str,
    ) -> Result<Option<Self>> {
        let path = vault.note_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        Self::from_note(vault, cache, index, &path).map(Some)
    }

    /// Birthday as `YYYY-MM-DD`
    pub fn birthday_string(&self) -> Option<String> {
        self.birthday.map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// Whole years between the birthday and `date`
    pub fn age_on(&self, date: NaiveDate) -> Option<i32> {
        let birthday = self.birthday?;
        let mut age = date.year() - birthday.year();
        if (date.month(), date.day()) < (birthday.month(), birthday.day()) {
            age -= 1;
        }
        (age >= 0).then_some(age)
    }

    /// Current age in whole years
    pub fn age(&self) -> Option<i32> {
        self.age_on(Utc::now().date_naive())
    }

    /// Street, "post-code city", and country with empty parts dropped
    pub fn address_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(street) = self.street.as_deref().filter(|s| !s.is_empty()) {
            lines.push(street.to_string());
        }
        let locality: Vec<String> = [
            self.post_code.map(|c| c.to_string()),
            self.city.clone().filter(|c| !c.is_empty()),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !locality.is_empty() {
            lines.push(locality.join(" "));
        }
        if let Some(country) = self.country.as_deref().filter(|c| !c.is_empty()) {
            lines.push(country.to_string());
        }
        lines
    }

    /// Install the fields of a contact card
    pub fn apply_card(&mut self, card: &Card) {
        if let Some(name) = card.full_name() {
            self.name = name;
        }
        if let Some(birthday) = card.birthday() {
            self.birthday = Some(birthday);
        }
        if let Some(phone) = card.phone() {
            self.phone = Some(phone);
        }
        if let Some(email) = card.email() {
            self.email = Some(email);
        }
        if let Some(url) = card.url() {
            self.url = Some(url);
        }
        if let Some(address) = card.address() {
            self.street = address.street;
            self.city = address.city;
            self.post_code = address.post_code;
            self.country = address.country;
        }
    }

    /// Persist the person into the note's header, creating the note if needed
    ///
    /// The merged field set is seeded from the note's current header, so
    /// foreign keys survive; a `None` field removes its key.
    pub fn save(&mut self, vault: &Vault, cache: &mut MetadataCache) -> Result<PathBuf> {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| vault.note_path(&self.name));
        let exists = path.is_file();

        let mut fields = if exists {
            cache.fields_for(vault, &path)?
        } else {
            FieldSet::new()
        };

        fields.set("birthday", date(self.birthday));
        fields.set("father", reference(self.father.as_deref()));
        fields.set("mother", reference(self.mother.as_deref()));
        fields.set("street", scalar(self.street.as_deref()));
        fields.set("post-code", number(self.post_code));
        fields.set("city", scalar(self.city.as_deref()));
        fields.set("country", scalar(self.country.as_deref()));
        fields.set("phone", scalar(self.phone.as_deref()));
        fields.set("email", scalar(self.email.as_deref()));
        fields.set("url", scalar(self.url.as_deref()));

        let content = if exists {
            vault.read(&path)?
        } else {
            format!("# {}\n", self.name)
        };
        let updated = merge(&content, &fields);

        if exists {
            vault.write(&path, &updated)?;
        } else {
            vault.create(&self.name, &updated)?;
        }
        cache.invalidate(&path);
        self.path = Some(path.clone());
        Ok(path)
    }
}

fn scalar(value: Option<&str>) -> FieldValue {
    match value {
        Some(s) if !s.is_empty() => FieldValue::Scalar(s.to_string()),
        _ => FieldValue::Absent,
    }
}

fn reference(value: Option<&str>) -> FieldValue {
    match value {
        Some(name) if !name.is_empty() => FieldValue::Reference(name.to_string()),
        _ => FieldValue::Absent,
    }
}

fn date(value: Option<NaiveDate>) -> FieldValue {
    value.map(FieldValue::Date).unwrap_or(FieldValue::Absent)
}

fn number(value: Option<i64>) -> FieldValue {
    value
        .map(|n| FieldValue::Number(n as f64))
        .unwrap_or(FieldValue::Absent)
}

fn reference_field(fields: &FieldSet, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(FieldValue::as_reference)
        .map(str::to_string)
}

fn text_field(fields: &FieldSet, key: &str) -> Option<String> {
    fields.get(key).and_then(FieldValue::as_text)
}

fn number_field(fields: &FieldSet, key: &str) -> Option<i64> {
    let value = fields.get(key)?;
    match value.as_number() {
        Some(n) => Some(n as i64),
        None => value.as_str()?.trim().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fixture() -> (tempfile::TempDir, Vault, MetadataCache) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path(), "People").unwrap();
        (dir, vault, MetadataCache::new())
    }

    #[test]
    fn test_from_note_maps_header_fields() {
        let (_dir, vault, mut cache) = fixture();
        vault
            .create(
                "Bob",
                "---\nbirthday: 1990-06-15\nmother: [[Alice]]\nstreet: 1 Main St\npost-code: 12345\ncity: Springfield\n---\n\n# Bob\n",
            )
            .unwrap();

        let index = FamilyIndex::build(&vault, &mut cache).unwrap();
        let person = Person::load(&vault, &mut cache, &index, "Bob")
            .unwrap()
            .unwrap();

        assert_eq!(person.name, "Bob");
        assert_eq!(person.birthday, Some(naive("1990-06-15")));
        assert_eq!(person.mother.as_deref(), Some("Alice"));
        assert_eq!(person.father, None);
        assert_eq!(person.street.as_deref(), Some("1 Main St"));
        assert_eq!(person.post_code, Some(12345));
        assert_eq!(person.city.as_deref(), Some("Springfield"));
    }

    #[test]
    fn test_load_missing_person_is_none() {
        let (_dir, vault, mut cache) = fixture();
        let index = FamilyIndex::default();
        assert!(Person::load(&vault, &mut cache, &index, "Nobody")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_age_on_counts_whole_years() {
        let mut person = Person::new("Bob");
        person.birthday = Some(naive("1990-06-15"));
        assert_eq!(person.age_on(naive("2020-06-14")), Some(29));
        assert_eq!(person.age_on(naive("2020-06-15")), Some(30));
        assert_eq!(person.age_on(naive("1989-01-01")), None);
        assert_eq!(Person::new("Eve").age_on(naive("2020-01-01")), None);
    }

    #[test]
    fn test_address_lines_drop_empty_parts() {
        let mut person = Person::new("Bob");
        assert!(person.address_lines().is_empty());

        person.street = Some("1 Main St".to_string());
        person.post_code = Some(12345);
        person.city = Some("Springfield".to_string());
        person.country = Some("USA".to_string());
        assert_eq!(
            person.address_lines(),
            vec!["1 Main St", "12345 Springfield", "USA"]
        );

        person.post_code = None;
        assert_eq!(person.address_lines()[1], "Springfield");
    }

    #[test]
    fn test_save_creates_note_with_header_and_heading() {
        let (_dir, vault, mut cache) = fixture();
        let mut person = Person::new("Carol");
        person.birthday = Some(naive("1960-03-02"));
        person.mother = Some("Grandma".to_string());

        let path = person.save(&vault, &mut cache).unwrap();
        let content = vault.read(&path).unwrap();
        assert!(content.starts_with("---\n"));
        assert!(content.contains("birthday: 1960-03-02"));
        assert!(content.contains("mother: [[Grandma]]"));
        assert!(content.ends_with("# Carol\n"));
    }

    #[test]
    fn test_save_round_trips_and_preserves_foreign_keys() {
        let (_dir, vault, mut cache) = fixture();
        vault
            .create(
                "Bob",
                "---\ntags:\n- family\nbirthday: 1990-06-15\nphone: 555-1234\n---\n\n# Bob\n\nBody text.\n",
            )
            .unwrap();

        let index = FamilyIndex::build(&vault, &mut cache).unwrap();
        let mut person = Person::load(&vault, &mut cache, &index, "Bob")
            .unwrap()
            .unwrap();
        person.phone = None;
        person.father = Some("Dave".to_string());
        person.save(&vault, &mut cache).unwrap();

        let content = vault.read(&vault.note_path("Bob")).unwrap();
        assert!(content.contains("- family"));
        assert!(content.contains("father: [[Dave]]"));
        assert!(!content.contains("phone"));
        assert!(content.ends_with("# Bob\n\nBody text.\n"));

        let reloaded = Person::load(&vault, &mut cache, &index, "Bob")
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.father.as_deref(), Some("Dave"));
        assert_eq!(reloaded.phone, None);
        assert_eq!(reloaded.birthday, Some(naive("1990-06-15")));
    }
}
