//! Kinnote - markdown person notes as a contact and genealogy database
//!
//! Each note under the vault's people folder is one person; its YAML
//! frontmatter holds the record, and parent links between notes drive
//! the family inference.

mod app;
mod cli;
mod core;
mod people;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    let mut app = App::new(cli.vault)?;
    app.run(cli.command)
}
