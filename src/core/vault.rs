//! Vault access: the on-disk document store

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

/// A vault rooted at a directory, with person notes under one folder
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    people_folder: String,
}

impl Vault {
    /// Open a vault rooted at `root`
    pub fn open(root: impl Into<PathBuf>, people_folder: impl Into<String>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("Vault root is not a directory: {}", root.display());
        }
        Ok(Self {
            root,
            people_folder: people_folder.into(),
        })
    }

    /// Vault root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds person notes
    pub fn people_root(&self) -> PathBuf {
        self.root.join(&self.people_folder)
    }

    /// Note path for a person name
    pub fn note_path(&self, name: &str) -> PathBuf {
        self.people_root().join(format!("{name}.md"))
    }

    /// Person name for a note path
    pub fn note_stem(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string())
    }

    /// Read the full text of a note
    pub fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read note: {}", path.display()))
    }

    /// Overwrite a note
    pub fn write(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content)
            .with_context(|| format!("Failed to write note: {}", path.display()))?;
        tracing::debug!("Wrote note: {}", path.display());
        Ok(())
    }

    /// Create a new person note; fails if it already exists
    pub fn create(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.note_path(name);
        if path.exists() {
            bail!("Note already exists: {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to create note: {}", path.display()))?;
        tracing::info!("Created note: {}", path.display());
        Ok(path)
    }

    /// All markdown files in the vault
    pub fn markdown_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| !is_skipped(e))
            .filter_map(|e| e.ok())
            .filter(|e| is_markdown(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    /// Markdown files under the people folder, sorted by name
    pub fn people_files(&self) -> Vec<PathBuf> {
        let people_root = self.people_root();
        let mut files: Vec<PathBuf> = self
            .markdown_files()
            .into_iter()
            .filter(|p| p.starts_with(&people_root))
            .collect();
        files.sort();
        files
    }
}

/// Check if a path is a markdown file
pub fn is_markdown(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext == "md" || ext == "markdown")
            .unwrap_or(false)
}

/// Skip hidden entries and common non-content directories
fn is_skipped(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    (entry.depth() > 0 && name.starts_with('.'))
        || name == "node_modules"
        || name == "target"
}
