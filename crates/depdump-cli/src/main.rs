//! Dependence graph exporter CLI.
//!
//! Provides the `depdump` binary. `export` reads a snapshot file (one function
//! plus its PDG and CDG) and writes the `{"pdg": [...], "cdg": [...]}`
//! document; `inspect` prints a summary of a snapshot without exporting it.
//!
//! Logs go to stderr and honour `RUST_LOG`; stdout carries only JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use depdump_core::{Cdg, Function, Pdg, Snapshot};
use depdump_export::{ExportError, ExportOptions, Layout};

/// Dependence graph exporter.
#[derive(Parser)]
#[command(name = "depdump", about = "Export PDG/CDG analysis results as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Serialize a snapshot's PDG and CDG to a JSON document.
    Export {
        /// Path to the snapshot file.
        #[arg(short, long)]
        input: PathBuf,

        /// Destination path (created or truncated).
        #[arg(short, long)]
        output: PathBuf,

        /// Emit without insignificant whitespace.
        #[arg(long)]
        compact: bool,

        /// Include each dependency's kind next to its id.
        #[arg(long)]
        dep_kinds: bool,

        /// Spaces per indentation level for pretty output (0-16).
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(0..=16))]
        indent: u16,
    },

    /// Print instruction, block and graph node counts of a snapshot.
    Inspect {
        /// Path to the snapshot file.
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Summary printed by `inspect`.
#[derive(Debug, Serialize)]
struct SnapshotSummary {
    function: String,
    blocks: usize,
    instructions: usize,
    pdg_nodes: usize,
    pdg_nodes_with_inst: usize,
    pdg_edges: usize,
    cdg_nodes: usize,
    cdg_nodes_with_block: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Export {
            input,
            output,
            compact,
            dep_kinds,
            indent,
        } => {
            let options = ExportOptions {
                layout: if compact { Layout::Compact } else { Layout::Pretty },
                emit_dep_kind: dep_kinds,
                indent: " ".repeat(usize::from(indent)),
            };
            run_export(&input, &output, &options)
        }
        Commands::Inspect { input } => run_inspect(&input),
    };
    process::exit(exit_code);
}

/// Execute the export subcommand.
///
/// Returns exit code: 0 = success, 1 = export failure, 3 = I/O error
/// (unreadable snapshot or unwritable destination).
fn run_export(input: &Path, output: &Path, options: &ExportOptions) -> i32 {
    let (function, pdg, cdg) = match load(input) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    match depdump_export::serialize(output, &function, &pdg, &cdg, options) {
        Ok(stats) => {
            let json = serde_json::to_string_pretty(&stats).unwrap_or_else(|e| {
                format!("{{\"error\": \"failed to serialize stats: {}\"}}", e)
            });
            println!("{}", json);
            0
        }
        Err(e @ ExportError::Resource { .. }) => {
            eprintln!("I/O error: {}", e);
            3
        }
        Err(e) => {
            eprintln!("Export error: {}", e);
            1
        }
    }
}

/// Execute the inspect subcommand.
fn run_inspect(input: &Path) -> i32 {
    let (function, pdg, cdg) = match load(input) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    let summary = SnapshotSummary {
        function: function.name.clone(),
        blocks: function.block_count(),
        instructions: function.inst_count(),
        pdg_nodes: pdg.node_count(),
        pdg_nodes_with_inst: pdg.nodes().filter(|(_, n)| n.inst.is_some()).count(),
        pdg_edges: pdg.edge_count(),
        cdg_nodes: cdg.node_count(),
        cdg_nodes_with_block: cdg.nodes().filter(|(_, n)| n.block.is_some()).count(),
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize summary: {}", e);
            1
        }
    }
}

/// Read and build a snapshot, reporting failures on stderr.
///
/// Returns the exit code on failure: 3 if the file cannot be opened, 1 if it
/// is not a valid snapshot.
fn load(path: &Path) -> Result<(Function, Pdg, Cdg), i32> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: failed to open snapshot '{}': {}", path.display(), e);
            return Err(3);
        }
    };

    let parts = Snapshot::from_reader(BufReader::new(file)).and_then(Snapshot::into_parts);
    match parts {
        Ok(parts) => {
            tracing::debug!("loaded snapshot '{}'", path.display());
            Ok(parts)
        }
        Err(e) => {
            eprintln!("Error: invalid snapshot '{}': {}", path.display(), e);
            Err(1)
        }
    }
}
