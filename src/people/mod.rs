//! People domain: person model, family inference, and contact import

pub mod import;
pub mod index;
pub mod person;
pub mod vcard;
