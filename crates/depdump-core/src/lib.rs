//! Input data model for depdump.
//!
//! A read-only snapshot of one function ([`Function`]) together with its
//! already-built Program Dependence Graph ([`Pdg`]) and Control Dependence
//! Graph ([`Cdg`]). The exporter in `depdump-export` walks these; nothing here
//! assigns export identifiers.

pub mod cdg;
pub mod error;
pub mod function;
pub mod id;
pub mod pdg;
pub mod snapshot;

// Re-export commonly used types
pub use cdg::{Cdg, CdgNode};
pub use error::CoreError;
pub use function::{BasicBlock, Function, FunctionBuilder, Instruction};
pub use id::{BlockId, CdgNodeId, InstId, PdgNodeId};
pub use pdg::{DepKind, Pdg, PdgNode};
pub use snapshot::Snapshot;
