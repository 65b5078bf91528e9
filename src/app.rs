//! Application state and command execution

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{bail, Context, Result};
use notify::{RecursiveMode, Watcher};

use crate::cli::{Commands, SetArgs};
use crate::core::config::AppConfig;
use crate::core::document::Document;
use crate::core::metadata::MetadataCache;
use crate::core::vault::Vault;
use crate::people::import::import_contact;
use crate::people::index::FamilyIndex;
use crate::people::person::Person;

/// Application state: the open vault and its metadata cache
pub struct App {
    vault: Vault,
    cache: MetadataCache,
}

impl App {
    /// Open the vault and load config; an explicit path wins over the config
    pub fn new(vault_override: Option<PathBuf>) -> Result<Self> {
        let mut config = AppConfig::load().unwrap_or_default();

        let root = match vault_override.or_else(|| config.last_vault.clone()) {
            Some(path) => path,
            None => std::env::current_dir().context("Could not determine current directory")?,
        };
        let vault = Vault::open(&root, &config.people.folder)?;
        tracing::debug!("Opened vault: {}", root.display());

        config.last_vault = Some(root.clone());
        config.add_recent_vault(root);
        if let Err(e) = config.save() {
            tracing::warn!("Failed to save config: {e}");
        }

        Ok(Self {
            vault,
            cache: MetadataCache::new(),
        })
    }

    /// Execute one CLI command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Show { name, open } => self.show(&name, open),
            Commands::List => self.list(),
            Commands::Set(args) => self.set(args),
            Commands::Import { file } => self.import(&file),
            Commands::Watch => self.watch(),
        }
    }

    fn show(&mut self, name: &str, open_note: bool) -> Result<()> {
        let index = FamilyIndex::build(&self.vault, &mut self.cache)?;
        let Some(person) = Person::load(&self.vault, &mut self.cache, &index, name)? else {
            bail!(
                "No note for {name} under {}",
                self.vault.people_root().display()
            );
        };

        let summary = match &person.path {
            Some(path) => Document::open(path)?.plain_summary(),
            None => None,
        };
        print!("{}", render_person(&person, summary.as_deref()));

        if open_note {
            if let Some(path) = &person.path {
                open::that(path)
                    .with_context(|| format!("Failed to open note: {}", path.display()))?;
            }
        }
        Ok(())
    }

    fn list(&mut self) -> Result<()> {
        let index = FamilyIndex::build(&self.vault, &mut self.cache)?;
        for path in self.vault.people_files() {
            let person = Person::from_note(&self.vault, &mut self.cache, &index, &path)?;
            let birthday = person.birthday_string().unwrap_or_default();
            let age = person
                .age()
                .map(|a| a.to_string())
                .unwrap_or_default();
            println!("{:<28} {:<12} {}", person.name, birthday, age);
        }
        Ok(())
    }

    fn set(&mut self, args: SetArgs) -> Result<()> {
        let index = FamilyIndex::build(&self.vault, &mut self.cache)?;
        let mut person = Person::load(&self.vault, &mut self.cache, &index, &args.name)?
            .unwrap_or_else(|| Person::new(&args.name));

        if let Some(birthday) = args.birthday {
            person.birthday = Some(birthday);
        }
        if let Some(mother) = args.mother {
            person.mother = Some(mother);
        }
        if let Some(father) = args.father {
            person.father = Some(father);
        }
        if let Some(street) = args.street {
            person.street = Some(street);
        }
        if let Some(post_code) = args.post_code {
            person.post_code = Some(post_code);
        }
        if let Some(city) = args.city {
            person.city = Some(city);
        }
        if let Some(country) = args.country {
            person.country = Some(country);
        }
        if let Some(phone) = args.phone {
            person.phone = Some(phone);
        }
        if let Some(email) = args.email {
            person.email = Some(email);
        }
        if let Some(url) = args.url {
            person.url = Some(url);
        }

        for field in &args.clear {
            match field.as_str() {
                "birthday" => person.birthday = None,
                "mother" => person.mother = None,
                "father" => person.father = None,
                "street" => person.street = None,
                "post-code" => person.post_code = None,
                "city" => person.city = None,
                "country" => person.country = None,
                "phone" => person.phone = None,
                "email" => person.email = None,
                "url" => person.url = None,
                other => bail!("Unknown field: {other}"),
            }
        }

        let path = person.save(&self.vault, &mut self.cache)?;
        println!("Updated {}", path.display());
        Ok(())
    }

    fn import(&mut self, file: &Path) -> Result<()> {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read contact card: {}", file.display()))?;
        let person = import_contact(&self.vault, &mut self.cache, &text)?;
        match &person.path {
            Some(path) => println!("Imported {} -> {}", person.name, path.display()),
            None => println!("Imported {}", person.name),
        }
        Ok(())
    }

    fn watch(&mut self) -> Result<()> {
        let mut index = FamilyIndex::build(&self.vault, &mut self.cache)?;
        tracing::info!(
            "Watching {} ({} linked parents)",
            self.vault.root().display(),
            index.parent_count()
        );

        let (tx, rx) = mpsc::channel();
        let mut watcher =
            notify::recommended_watcher(tx).context("Failed to create file watcher")?;
        watcher
            .watch(self.vault.root(), RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch: {}", self.vault.root().display()))?;

        for event in rx {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("Watch error: {e}");
                    continue;
                }
            };
            if event.need_rescan() {
                self.cache.clear();
                index = FamilyIndex::build(&self.vault, &mut self.cache)?;
                tracing::info!(
                    "Family index rebuilt after rescan: {} linked parents",
                    index.parent_count()
                );
                continue;
            }
            // Deleted paths no longer exist, so match on extension alone
            let changed: Vec<&PathBuf> = event
                .paths
                .iter()
                .filter(|p| {
                    p.extension()
                        .map(|ext| ext == "md" || ext == "markdown")
                        .unwrap_or(false)
                })
                .collect();
            if changed.is_empty() {
                continue;
            }
            for path in changed {
                self.cache.invalidate(path);
                tracing::debug!("Header cache invalidated: {}", path.display());
            }
            index = FamilyIndex::build(&self.vault, &mut self.cache)?;
            tracing::info!("Family index rebuilt: {} linked parents", index.parent_count());
        }
        Ok(())
    }
}

/// Render a person's details for the terminal
fn render_person(person: &Person, summary: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&person.name);
    out.push('\n');

    if let Some(birthday) = person.birthday_string() {
        match person.age() {
            Some(age) => push_field(&mut out, "Birthday", &format!("{birthday} (age {age})")),
            None => push_field(&mut out, "Birthday", &birthday),
        }
    }
    if let Some(mother) = &person.mother {
        push_field(&mut out, "Mother", mother);
    }
    if let Some(father) = &person.father {
        push_field(&mut out, "Father", father);
    }
    if !person.children.is_empty() {
        push_field(&mut out, "Children", &person.children.join(", "));
    }
    let address = person.address_lines();
    if !address.is_empty() {
        push_field(&mut out, "Address", &address.join(", "));
    }
    if let Some(phone) = &person.phone {
        push_field(&mut out, "Phone", phone);
    }
    if let Some(email) = &person.email {
        push_field(&mut out, "Email", email);
    }
    if let Some(url) = &person.url {
        push_field(&mut out, "Url", url);
    }
    if let Some(summary) = summary {
        out.push('\n');
        out.push_str(summary);
        out.push('\n');
    }
    out
}

fn push_field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("  {label:<9} {value}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_render_person_lists_present_fields_only() {
        let mut person = Person::new("Bob");
        person.mother = Some("Alice".to_string());
        person.children = vec!["Carol".to_string(), "Dave".to_string()];
        person.city = Some("Springfield".to_string());

        let rendered = render_person(&person, Some("Likes fishing."));
        assert!(rendered.starts_with("Bob\n"));
        assert!(rendered.contains("Mother    Alice"));
        assert!(rendered.contains("Children  Carol, Dave"));
        assert!(rendered.contains("Address   Springfield"));
        assert!(!rendered.contains("Father"));
        assert!(!rendered.contains("Birthday"));
        assert!(rendered.ends_with("Likes fishing.\n"));
    }

    #[test]
    fn test_render_person_includes_age() {
        let mut person = Person::new("Bob");
        person.birthday = NaiveDate::from_ymd_opt(1990, 6, 15);
        let rendered = render_person(&person, None);
        assert!(rendered.contains("Birthday  1990-06-15 (age "));
    }
}
