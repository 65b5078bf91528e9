//! Command-line interface definitions

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kinnote")]
#[command(about = "Markdown person notes as a contact and genealogy database")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (defaults to the last opened vault, then the current directory)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a person's details
    Show {
        /// Person name (note file stem)
        name: String,
        /// Open the backing note with the system handler
        #[arg(long)]
        open: bool,
    },
    /// List every person note with birthday and age
    List,
    /// Edit a person's header fields
    Set(SetArgs),
    /// Import a vCard contact file
    Import {
        /// Path to a .vcf file
        file: PathBuf,
    },
    /// Watch the vault and rebuild the family index on changes
    Watch,
}

#[derive(Args)]
pub struct SetArgs {
    /// Person name (note file stem); the note is created when missing
    pub name: String,

    /// Birthday as YYYY-MM-DD
    #[arg(long)]
    pub birthday: Option<NaiveDate>,

    /// Mother's name, stored as a link
    #[arg(long)]
    pub mother: Option<String>,

    /// Father's name, stored as a link
    #[arg(long)]
    pub father: Option<String>,

    #[arg(long)]
    pub street: Option<String>,

    #[arg(long = "post-code")]
    pub post_code: Option<i64>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    /// Remove a header field (repeatable)
    #[arg(long = "clear", value_name = "FIELD")]
    pub clear: Vec<String>,
}
