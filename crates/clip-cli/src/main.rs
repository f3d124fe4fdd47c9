// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `clip`: developer CLI over a clipboard content directory.
//!
//! # Usage
//! ```text
//! clip [--content DIR] [--project DIR] <command>
//! ```
//!
//! Commands list, inspect, pin and delete stored entries, and check an
//! entry's dictionary against an asset manifest of a target project. Exits
//! non-zero on error, including when `missing` finds unavailable assets.

// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod manifest;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clip_codec::config::{default_content_dir, FsConfigStore, Settings};
use clip_codec::{Clipboard, EntryFilter, EntryId, FsEntryStore, StoredEntry};
use clip_core::{find_missing, SceneNodeRecord};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::manifest::ManifestCatalog;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and manage clipboard entries")]
struct Args {
    /// Content directory holding entries (defaults to the configured one)
    #[arg(long, global = true)]
    content: Option<PathBuf>,
    /// Project directory whose ClipboardSettings.json overrides the global one
    #[arg(long, global = true)]
    project: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List entries, newest first
    List {
        /// Only favorites
        #[arg(long)]
        favorites: bool,
        /// Only entries whose name or tags contain this text
        #[arg(long, conflicts_with = "favorites")]
        search: Option<String>,
    },
    /// Show metadata, dictionary and records of one entry
    Inspect {
        /// Entry id
        id: String,
    },
    /// List dictionary items an asset manifest cannot provide
    Missing {
        /// Entry id
        id: String,
        /// JSON asset manifest of the target project
        #[arg(long)]
        manifest: PathBuf,
    },
    /// Pin or unpin an entry
    Favorite {
        /// Entry id
        id: String,
        /// Unpin instead
        #[arg(long)]
        off: bool,
    },
    /// Remove an entry's files
    Delete {
        /// Entry id
        id: String,
    },
    /// Show the active settings and where they came from
    Settings,
}

fn load_settings(project: Option<&Path>) -> Result<Settings<FsConfigStore, FsConfigStore>> {
    let project_dir = match project {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let global = FsConfigStore::new().context("open global settings")?;
    let content = default_content_dir().context("resolve default content directory")?;
    Settings::load(FsConfigStore::at(project_dir), global, content).context("load settings")
}

fn open_clipboard(args: &Args) -> Result<Clipboard<FsEntryStore>> {
    let open = |content: &Path| {
        info!(content = %content.display(), "opening content directory");
        FsEntryStore::new(content)
            .with_context(|| format!("open content directory {}", content.display()))
    };
    if let Some(dir) = &args.content {
        return Ok(Clipboard::new(open(dir.as_path())?));
    }
    let settings = load_settings(args.project.as_deref())?;
    let store = open(settings.content_directory().as_path())?;
    Ok(Clipboard::from_settings(store, settings.data()))
}

fn entry(clipboard: &Clipboard<FsEntryStore>, id: &str) -> Result<StoredEntry> {
    clipboard
        .entry(&EntryId::from(id))
        .with_context(|| format!("read entry {id}"))
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn list(clipboard: &Clipboard<FsEntryStore>, filter: &EntryFilter) -> Result<()> {
    let entries = clipboard.list(filter).context("list entries")?;
    let mut out = table(vec!["Id", "Name", "Created", "Templates", "Compressed", "Favorite", "Tags"]);
    for entry in &entries {
        let m = &entry.metadata;
        out.add_row(vec![
            entry.id.to_string(),
            m.name.clone(),
            m.created.format("%Y-%m-%d %H:%M:%S").to_string(),
            m.number_of_templates.to_string(),
            m.compressed.to_string(),
            m.favorite.to_string(),
            m.tags.clone().unwrap_or_default(),
        ]);
    }
    println!("{out}");
    println!("{} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    Ok(())
}

fn record_row(record: &SceneNodeRecord) -> Vec<String> {
    let materials = record
        .material_overrides
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|m| format!("{}={}", m.slot, m.name))
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        record.id.to_string(),
        opt(record.name.as_deref()),
        opt(record.status.map(|s| format!("{s:?}"))),
        opt(record.path.as_deref()),
        opt(record.sibling_index),
        opt(record
            .template_reference
            .as_ref()
            .map(|t| format!("{} ({:?})", t.name, t.kind))),
        materials,
        record.children().len().to_string(),
    ]
}

fn inspect(clipboard: &Clipboard<FsEntryStore>, id: &str) -> Result<()> {
    let entry = entry(clipboard, id)?;
    let document = clipboard
        .load_tree(&entry)
        .with_context(|| format!("decode entry {id}"))?;
    let m = &entry.metadata;

    let mut summary = table(vec!["Field", "Value"]);
    summary.add_row(vec!["Name".to_owned(), m.name.clone()]);
    summary.add_row(vec!["Tags".to_owned(), m.tags.clone().unwrap_or_default()]);
    summary.add_row(vec!["Created".to_owned(), m.created.to_rfc3339()]);
    summary.add_row(vec!["Records".to_owned(), document.len().to_string()]);
    summary.add_row(vec!["Templates".to_owned(), m.number_of_templates.to_string()]);
    summary.add_row(vec!["Compressed".to_owned(), m.compressed.to_string()]);
    summary.add_row(vec!["Favorite".to_owned(), m.favorite.to_string()]);
    println!("{summary}");

    let mut dictionary = table(vec!["Item", "Kind", "Search path", "Name"]);
    for item in m.dictionary.items() {
        dictionary.add_row(vec![
            item.id.to_string(),
            format!("{:?}", item.kind),
            item.search_path.clone(),
            item.verification_name.clone(),
        ]);
    }
    println!("{dictionary}");

    let mut records = table(vec![
        "Record", "Name", "Status", "Path", "Sibling", "Template", "Materials", "Children",
    ]);
    for record in &document.nodes {
        records.add_row(record_row(record));
    }
    println!("{records}");
    Ok(())
}

fn missing(clipboard: &Clipboard<FsEntryStore>, id: &str, manifest: &Path) -> Result<()> {
    let entry = entry(clipboard, id)?;
    let catalog = ManifestCatalog::load(manifest)?;
    let missing = find_missing(&catalog, &entry.metadata.dictionary);
    if missing.is_empty() {
        println!("all {} referenced asset(s) available", entry.metadata.dictionary.len());
        return Ok(());
    }
    let mut out = table(vec!["Kind", "Search path", "Name"]);
    for item in &missing {
        out.add_row(vec![
            format!("{:?}", item.kind),
            item.search_path.clone(),
            item.verification_name.clone(),
        ]);
    }
    println!("{out}");
    bail!("{} referenced asset(s) missing", missing.len())
}

fn show_settings(project: Option<&Path>) -> Result<()> {
    let settings = load_settings(project)?;
    let data = settings.data();
    let mut out = table(vec!["Setting", "Value"]);
    out.add_row(vec!["Location".to_owned(), format!("{:?}", settings.location())]);
    out.add_row(vec![
        "Content directory".to_owned(),
        settings.content_directory().display().to_string(),
    ]);
    out.add_row(vec!["Save compressed".to_owned(), data.save_compressed.to_string()]);
    out.add_row(vec![
        "Preview thumbnail width".to_owned(),
        data.preview_thumbnail_width.to_string(),
    ]);
    out.add_row(vec![
        "Preview offset".to_owned(),
        format!(
            "({}, {}, {})",
            data.preview_offset.x, data.preview_offset.y, data.preview_offset.z
        ),
    ]);
    println!("{out}");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    match &args.command {
        Command::Settings => show_settings(args.project.as_deref()),
        Command::List { favorites, search } => {
            let filter = match (search, favorites) {
                (Some(text), _) => EntryFilter::Search(text.clone()),
                (None, true) => EntryFilter::Favorites,
                (None, false) => EntryFilter::All,
            };
            list(&open_clipboard(&args)?, &filter)
        }
        Command::Inspect { id } => inspect(&open_clipboard(&args)?, id),
        Command::Missing { id, manifest } => missing(&open_clipboard(&args)?, id, manifest),
        Command::Favorite { id, off } => {
            let metadata = open_clipboard(&args)?
                .set_favorite(&EntryId::from(id.as_str()), !off)
                .with_context(|| format!("update entry {id}"))?;
            println!("{}: favorite = {}", metadata.name, metadata.favorite);
            Ok(())
        }
        Command::Delete { id } => {
            open_clipboard(&args)?
                .delete(&EntryId::from(id.as_str()))
                .with_context(|| format!("delete entry {id}"))?;
            println!("deleted {id}");
            Ok(())
        }
    }
}
