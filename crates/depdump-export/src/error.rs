//! Export error types covering resource, writer setup and token stream
//! failures.
//!
//! Contract violations (a graph naming an instruction or block outside the
//! indexed function) are not represented here: they panic.

use std::path::PathBuf;

/// Errors raised by the streaming JSON writer.
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// The sink rejected a write or flush.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A close token did not match the innermost open container.
    #[error("unbalanced document: expected {expected}, found {found}")]
    Unbalanced {
        expected: &'static str,
        found: &'static str,
    },

    /// A token appeared where the document grammar does not allow it.
    #[error("misplaced token: {0}")]
    Misplaced(&'static str),
}

/// Errors that can occur while serializing a function's graphs.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The destination could not be opened for writing.
    #[error("cannot open '{path}' for writing: {source}", path = path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The streaming writer could not be set up against an open sink.
    #[error("writer initialization failed: {0}")]
    WriterInit(String),

    /// Emitting the document failed after the writer was initialized.
    #[error("write failed: {0}")]
    Write(#[from] WriterError),
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Write(WriterError::Io(e))
    }
}
