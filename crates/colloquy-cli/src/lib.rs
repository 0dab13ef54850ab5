//! CLI logic for the Colloquy dialogue tool.
//!
//! This module contains the subcommand handlers behind the `colloquy` binary.

pub mod config;
pub mod error_adapter;

mod args;
mod error;

pub use args::{Args, Command};
pub use config::{ConfigError, ConfigOverrides};
pub use error::CliError;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{info, warn};

use colloquy::{
    DialogueIo,
    catalog::{Bucket, DialogueFilter},
    changeset::Removal,
    record::EntityRef,
    snapshot::GraphSnapshot,
    store::FsAssetStore,
};

/// Run the Colloquy CLI application, printing to standard output.
///
/// # Errors
///
/// Returns [`CliError`] for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed snapshot files, naming the file
/// - Any save, load or listing failure
pub fn run(args: &Args) -> Result<(), CliError> {
    let stdout = io::stdout();
    run_with_output(args, &mut stdout.lock())
}

/// Run the Colloquy CLI application, printing to `out`.
pub fn run_with_output(args: &Args, out: &mut impl Write) -> Result<(), CliError> {
    let overrides = ConfigOverrides {
        store_root: args.store.as_deref().map(Path::new),
    };
    let app_config = config::load_config(args.config.as_deref().map(Path::new), overrides)?;

    let mut dialogue_io = DialogueIo::open(app_config);

    match &args.command {
        Command::Save {
            graph,
            snapshot,
            dry_run,
        } => save(&mut dialogue_io, graph, snapshot, *dry_run, out),
        Command::Load { graph, output } => load(&dialogue_io, graph, output),
        Command::List {
            graph,
            group,
            ungrouped,
            starting_only,
        } => {
            let bucket = match (group, ungrouped) {
                (Some(group), _) => Bucket::Group(group.clone()),
                (None, true) => Bucket::Ungrouped,
                (None, false) => Bucket::All,
            };
            let filter = DialogueFilter::new(bucket).starting_only(*starting_only);
            list(&dialogue_io, graph, &filter, out)
        }
    }
}

fn save(
    dialogue_io: &mut DialogueIo<FsAssetStore>,
    graph: &str,
    snapshot_path: &str,
    dry_run: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    info!(graph, snapshot_path; "Saving graph");

    let source = fs::read_to_string(snapshot_path)?;
    let snapshot: GraphSnapshot =
        serde_json::from_str(&source).map_err(|source| CliError::Snapshot {
            path: PathBuf::from(snapshot_path),
            source,
        })?;

    if dry_run {
        let prepared = dialogue_io.prepare_save(graph, &snapshot)?;
        for path in prepared.writes() {
            writeln!(out, "write  {path}")?;
        }
        for removal in prepared.removals() {
            match removal {
                Removal::Asset(path) => writeln!(out, "remove {path}")?,
                Removal::Folder(path) => writeln!(out, "remove {path}/")?,
            }
        }
        for path in prepared.duplicates() {
            writeln!(out, "duplicate {path}")?;
        }
        return Ok(());
    }

    let report = dialogue_io.save(graph, &snapshot)?;
    for entity_ref in report.unreachable_dialogues() {
        warn!(dialogue = display_ref(entity_ref).as_str(); "Dialogue is not reachable from any starting dialogue");
    }

    info!(
        graph,
        written = report.written().len(),
        removed = report.removed().len(),
        duplicates = report.duplicates().len();
        "Graph saved"
    );

    Ok(())
}

fn load(
    dialogue_io: &DialogueIo<FsAssetStore>,
    graph: &str,
    output: &str,
) -> Result<(), CliError> {
    info!(graph, output; "Loading graph");

    let snapshot = dialogue_io.load_snapshot(graph)?;
    let json = serde_json::to_string_pretty(&snapshot).map_err(|source| CliError::Snapshot {
        path: PathBuf::from(output),
        source,
    })?;
    fs::write(output, json)?;

    info!(
        groups = snapshot.groups().len(),
        nodes = snapshot.nodes().len(),
        output;
        "Snapshot exported successfully"
    );

    Ok(())
}

fn list(
    dialogue_io: &DialogueIo<FsAssetStore>,
    graph: &str,
    filter: &DialogueFilter,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let catalog = dialogue_io.catalog(graph)?;

    for (entity_ref, entity) in catalog.dialogues(filter) {
        let name = display_ref(entity_ref);
        if entity.is_starting_dialogue() {
            writeln!(out, "{name} [start]")?;
        } else {
            writeln!(out, "{name}")?;
        }
    }

    Ok(())
}

/// Renders `entity_ref` as `Group/Name`, with `Global` standing in for no group.
fn display_ref(entity_ref: &EntityRef) -> String {
    format!(
        "{}/{}",
        entity_ref.group().unwrap_or("Global"),
        entity_ref.name()
    )
}
