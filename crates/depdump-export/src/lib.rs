//! Streaming JSON export of a function's Program Dependence Graph and
//! Control Dependence Graph.
//!
//! The pipeline runs in four stages:
//!
//! - [`index`] -- program-order and graph-order identifiers for instructions
//!   and basic blocks
//! - [`project`] -- lazy record streams over the PDG and CDG in the dual-id
//!   scheme
//! - [`writer`] -- stack-checked streaming JSON token writer
//! - [`serialize`] -- the driver tying the stages to an output file
//!
//! The emitted document has the shape
//!
//! ```json
//! {
//!   "pdg": [ { "inst": "...", "bbId": 0, "realId": 1, "deps": [ { "id": 0 } ] } ],
//!   "cdg": [ { "name": "entry", "termInst": 1 } ]
//! }
//! ```

pub mod error;
pub mod index;
pub mod project;
pub mod serialize;
pub mod writer;

pub use error::{ExportError, WriterError};
pub use serialize::{serialize, serialize_to_writer};

use serde::{Deserialize, Serialize};

/// Whitespace layout of the emitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One token per line, nested containers indented.
    #[default]
    Pretty,
    /// No insignificant whitespace.
    Compact,
}

/// Options controlling the export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Whitespace layout.
    pub layout: Layout,

    /// Emit a `"kind"` field on every `deps` entry. Off by default so the
    /// output keeps bare `{ "id": n }` references.
    pub emit_dep_kind: bool,

    /// Indentation unit for [`Layout::Pretty`]. Must be whitespace only.
    pub indent: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            layout: Layout::Pretty,
            emit_dep_kind: false,
            indent: "  ".to_string(),
        }
    }
}

/// Counts describing a finished export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    /// Records written to the `pdg` array.
    pub pdg_records: usize,
    /// PDG nodes skipped because they carry no instruction.
    pub skipped_pdg_nodes: usize,
    /// Records written to the `cdg` array.
    pub cdg_records: usize,
    /// CDG nodes skipped because they carry no basic block.
    pub skipped_cdg_nodes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_export_options() {
        let opts = ExportOptions::default();
        assert_eq!(opts.layout, Layout::Pretty);
        assert!(!opts.emit_dep_kind);
        assert_eq!(opts.indent, "  ");
    }

    #[test]
    fn export_options_serde_roundtrip() {
        let opts = ExportOptions {
            layout: Layout::Compact,
            emit_dep_kind: true,
            indent: "\t".to_string(),
        };
        let json = serde_json::to_string(&opts).unwrap();
        assert!(json.contains("\"compact\""));
        let back: ExportOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.layout, opts.layout);
        assert_eq!(back.emit_dep_kind, opts.emit_dep_kind);
        assert_eq!(back.indent, opts.indent);
    }

    #[test]
    fn export_error_messages_name_the_stage() {
        let err = ExportError::Resource {
            path: "/nope/out.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().starts_with("cannot open '/nope/out.json'"));

        let err = ExportError::WriterInit("bad indent".into());
        assert_eq!(err.to_string(), "writer initialization failed: bad indent");

        let err = ExportError::from(WriterError::Misplaced("key outside object"));
        assert_eq!(err.to_string(), "write failed: misplaced token: key outside object");
    }
}
