//! TOC Decomposer CLI
//!
//! Splits an outlined document into a directory tree of per-section documents.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use toc_decomposer::{
    config::Config,
    layout::list_layout,
    persistence::{RecordFormat, load_record, record_size},
    session::Session,
    tree::Hierarchy,
};
use tracing_subscriber::EnvFilter;

/// TOC Decomposer - rebuild a document's sections from its outline
#[derive(Parser)]
#[command(name = "toc-decomposer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a YAML config file (overrides the default location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the section hierarchy of a document
    Show {
        /// Path to the PDF document
        document: PathBuf,

        /// Title marker of the first section to keep
        #[arg(short, long)]
        anchor: Option<String>,
    },

    /// Build the section directory tree and record file
    Decompose {
        /// Path to the PDF document
        document: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Title marker of the first section to keep
        #[arg(short, long)]
        anchor: Option<String>,

        /// Record file format (json or bincode)
        #[arg(short, long)]
        format: Option<RecordFormat>,
    },

    /// Print the text of one section
    Text {
        /// Path to the PDF document
        document: PathBuf,

        /// Section title (case-insensitive)
        title: String,

        /// Title marker of the first section to keep
        #[arg(short, long)]
        anchor: Option<String>,
    },

    /// Show information about a record file
    Info {
        /// Path to the record file
        record: PathBuf,

        /// Output as JSON instead of formatted tree
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Show { document, anchor } => cmd_show(document, with_anchor(config, anchor)),
        Commands::Decompose {
            document,
            output,
            anchor,
            format,
        } => {
            let mut config = with_anchor(config, anchor);
            if let Some(format) = format {
                config.record.format = format;
            }
            cmd_decompose(document, output, config)
        }
        Commands::Text {
            document,
            title,
            anchor,
        } => cmd_text(document, title, with_anchor(config, anchor)),
        Commands::Info { record, json } => cmd_info(record, json),
        Commands::Config => cmd_config(config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path).context("Failed to load configuration file")?,
        None => Config::load().context("Failed to load configuration")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn with_anchor(mut config: Config, anchor: Option<String>) -> Config {
    if let Some(anchor) = anchor {
        config.outline.anchor = anchor;
    }
    config
}

fn open_and_load(document: &Path, config: Config) -> Result<Session<toc_decomposer::PdfDocument>> {
    let mut session = Session::open(document, config)
        .with_context(|| format!("Failed to open document '{}'", document.display()))?;
    let hierarchy = session.load().context("Failed to read document outline")?;

    if !hierarchy.anchor_found {
        println!(
            "Notice: no outline entry contains \"{}\"; the hierarchy is empty.",
            session.config().outline.anchor
        );
    }

    Ok(session)
}

fn cmd_show(document: PathBuf, config: Config) -> Result<()> {
    let session = open_and_load(&document, config)?;
    if let Some(hierarchy) = session.hierarchy() {
        println!("{}", hierarchy.format());
    }
    Ok(())
}

fn cmd_decompose(document: PathBuf, output: PathBuf, config: Config) -> Result<()> {
    println!("Decomposing document: {}", document.display());
    let start = Instant::now();

    let mut session = open_and_load(&document, config)?;
    session.select_output(&output);
    let report = session.commit().context("Failed to write sections")?;

    let duration = start.elapsed();
    let sections = session.hierarchy().map(Hierarchy::node_count).unwrap_or(0);

    println!("\nDecomposition finished:");
    println!("  Sections:       {}", sections);
    println!("  Leaves w/ text: {}", report.leaves_with_text);
    println!("  Directories:    {}", report.projection.directories);
    println!("  Files written:  {}", report.projection.files.len());
    println!("  Time:           {:.2?}", duration);

    for title in &report.projection.skipped {
        println!("  Skipped:        {}", title);
    }
    for failure in &report.text_failures {
        println!(
            "  No text:        {} [pages {}-{}] ({})",
            failure.title, failure.start_page, failure.end_page, failure.message
        );
    }
    for failure in &report.projection.failures {
        println!("  Failed:         {} ({})", failure.path.display(), failure.message);
    }

    let size = record_size(&report.record_path)?;
    println!("\nRecord saved to: {}", report.record_path.display());
    println!("  File size: {:.1} KB", size as f64 / 1024.0);

    let entries = list_layout(&output)?;
    println!("  Output entries: {}", entries.len());

    Ok(())
}

fn cmd_text(document: PathBuf, title: String, config: Config) -> Result<()> {
    let session = open_and_load(&document, config)?;
    match session.section_text(&title)? {
        Some(text) => println!("{}", text),
        None => anyhow::bail!("No section titled '{}'", title),
    }
    Ok(())
}

fn cmd_info(record: PathBuf, json: bool) -> Result<()> {
    let sections = load_record(&record).context("Failed to load record")?;

    if json {
        let json_str =
            serde_json::to_string_pretty(&sections).context("Failed to serialize record")?;
        println!("{}", json_str);
        return Ok(());
    }

    let name = record
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("record")
        .to_string();
    let last_page = sections.iter().map(|s| s.end_page).max().unwrap_or(0);
    let hierarchy = Hierarchy::new(name, sections, last_page);
    let size = record_size(&record)?;
    let with_text = hierarchy
        .leaves()
        .iter()
        .filter(|leaf| leaf.text.is_some())
        .count();

    println!("Record Information");
    println!("{}", "─".repeat(40));
    println!("  Document:     {}", hierarchy.name);
    println!("  Last page:    {}", hierarchy.total_pages);
    println!("  Sections:     {}", hierarchy.node_count());
    println!("  Leaves:       {} ({} with text)", hierarchy.leaves().len(), with_text);
    println!("  Max depth:    {}", hierarchy.max_depth());
    println!("  File size:    {:.1} KB", size as f64 / 1024.0);
    println!();
    println!("{}", hierarchy.format());

    Ok(())
}

fn cmd_config(config: Config) -> Result<()> {
    match Config::config_file_path() {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (no home directory)"),
    }
    println!();
    print!(
        "{}",
        serde_yaml::to_string(&config).context("Failed to serialize configuration")?
    );
    Ok(())
}
