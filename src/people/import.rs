//! Contact-card import into the vault

use anyhow::{Context, Result};

use crate::core::metadata::MetadataCache;
use crate::core::vault::Vault;
use crate::people::index::FamilyIndex;
use crate::people::person::Person;
use crate::people::vcard::Card;

/// Import one contact card, updating or creating the person's note
pub fn import_contact(vault: &Vault, cache: &mut MetadataCache, text: &str) -> Result<Person> {
    let card = Card::parse(text).context("Failed to parse contact card")?;
    let name = card
        .full_name()
        .context("Contact card has no FN property")?;

    let index = FamilyIndex::build(vault, cache)?;
    let mut person =
        Person::load(vault, cache, &index, &name)?.unwrap_or_else(|| Person::new(&name));
    person.apply_card(&card);
    person.save(vault, cache)?;

    tracing::info!("Imported contact: {}", person.name);
    Ok(person)
}
