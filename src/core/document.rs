//! Document management for markdown notes

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::core::frontmatter;

/// A markdown note
#[derive(Debug, Clone)]
pub struct Document {
    /// File path
    pub path: PathBuf,
    /// Full document text, header included
    pub content: String,
}

impl Document {
    /// Open a document from a file
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Content without the frontmatter block
    pub fn body(&self) -> &str {
        match frontmatter::detect(&self.content) {
            Some(span) => &self.content[span.body..],
            None => &self.content,
        }
    }

    /// First paragraph of the body as plain text
    pub fn plain_summary(&self) -> Option<String> {
        let mut text = String::new();
        let mut in_paragraph = false;
        for event in Parser::new(self.body()) {
            match event {
                Event::Start(Tag::Paragraph) => in_paragraph = true,
                Event::End(TagEnd::Paragraph) => {
                    if !text.trim().is_empty() {
                        break;
                    }
                    in_paragraph = false;
                }
                Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
                _ => {}
            }
        }
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
