//! Serialization driver: index, project and stream one function's graphs.
//!
//! [`serialize`] is the main entry point. It owns the output file for the
//! duration of the call; the handle is closed when it goes out of scope, on
//! success, on error and while unwinding from a contract-violation panic.
//! [`serialize_to_writer`] runs the same pipeline against any sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::ser::Formatter;

use depdump_core::cdg::Cdg;
use depdump_core::function::Function;
use depdump_core::pdg::Pdg;

use crate::error::{ExportError, WriterError};
use crate::index::IdIndex;
use crate::project::{CdgProjection, CdgRecord, PdgProjection, PdgRecord};
use crate::writer::{JsonStream, ObjectWriter};
use crate::{ExportOptions, ExportStats, Layout};

/// Serialize `function`'s PDG and CDG to the file at `path`.
///
/// Pipeline:
/// 1. Open (create or truncate) the destination -- [`ExportError::Resource`]
/// 2. Initialize the streaming writer -- [`ExportError::WriterInit`]
/// 3. Index instructions and blocks in program order
/// 4. Seed block graph order from a first CDG pass
/// 5. Stream the `pdg` array
/// 6. Stream the `cdg` array from a second CDG pass
/// 7. Close the document and flush
pub fn serialize(
    path: impl AsRef<Path>,
    function: &Function,
    pdg: &Pdg,
    cdg: &Cdg,
    options: &ExportOptions,
) -> Result<ExportStats, ExportError> {
    let path = path.as_ref();

    // 1. Acquire the destination before anything else is attempted
    let file = File::create(path).map_err(|source| ExportError::Resource {
        path: path.to_path_buf(),
        source,
    })?;

    let stats = serialize_to_writer(BufWriter::new(file), function, pdg, cdg, options)?;
    tracing::info!(
        "exported {} PDG and {} CDG records for '{}' to {}",
        stats.pdg_records,
        stats.cdg_records,
        function.name,
        path.display()
    );
    Ok(stats)
}

/// Serialize `function`'s PDG and CDG to `sink`.
///
/// Runs steps 2-7 of [`serialize`]. The sink is flushed on success.
pub fn serialize_to_writer<W: Write>(
    sink: W,
    function: &Function,
    pdg: &Pdg,
    cdg: &Cdg,
    options: &ExportOptions,
) -> Result<ExportStats, ExportError> {
    // 2. Writer setup
    let indent = validate_indent(&options.indent)?;
    match options.layout {
        Layout::Pretty => write_document(JsonStream::pretty(sink, indent), function, pdg, cdg, options),
        Layout::Compact => write_document(JsonStream::compact(sink), function, pdg, cdg, options),
    }
}

fn validate_indent(indent: &str) -> Result<&[u8], ExportError> {
    if let Some(c) = indent.chars().find(|c| !matches!(c, ' ' | '\t')) {
        return Err(ExportError::WriterInit(format!(
            "indent must be spaces or tabs, found {:?}",
            c
        )));
    }
    Ok(indent.as_bytes())
}

fn write_document<W: Write, F: Formatter>(
    mut stream: JsonStream<W, F>,
    function: &Function,
    pdg: &Pdg,
    cdg: &Cdg,
    options: &ExportOptions,
) -> Result<ExportStats, ExportError> {
    // 3. Program-order ids
    let mut index = IdIndex::build(function);

    // 4. Block graph order must be known before PDG records reference blocks
    index.seed_block_order(cdg);

    let mut stats = ExportStats::default();
    stream.object(|doc| {
        // 5. PDG section
        doc.array("pdg", |records| {
            let mut projection = PdgProjection::new(pdg, &mut index);
            for record in projection.by_ref() {
                records.object(|o| write_pdg_record(o, &record, options))?;
                stats.pdg_records += 1;
            }
            stats.skipped_pdg_nodes = projection.skipped();
            Ok(())
        })?;

        // 6. CDG section
        doc.array("cdg", |records| {
            let mut projection = CdgProjection::new(cdg, &mut index);
            for record in projection.by_ref() {
                records.object(|o| write_cdg_record(o, &record))?;
                stats.cdg_records += 1;
            }
            stats.skipped_cdg_nodes = projection.skipped();
            Ok(())
        })
    })?;

    // 7. Close out
    stream.finish()?;

    if stats.skipped_pdg_nodes > 0 || stats.skipped_cdg_nodes > 0 {
        tracing::warn!(
            "skipped {} PDG node(s) without an instruction and {} CDG node(s) without a block",
            stats.skipped_pdg_nodes,
            stats.skipped_cdg_nodes
        );
    }
    tracing::debug!(?stats, "document complete");
    Ok(stats)
}

fn write_pdg_record<W: Write, F: Formatter>(
    o: &mut ObjectWriter<'_, W, F>,
    record: &PdgRecord,
    options: &ExportOptions,
) -> Result<(), WriterError> {
    o.field_str("inst", &record.inst)?;
    o.field_int("bbId", i64::from(record.bb_id))?;
    o.field_int("realId", i64::from(record.real_id))?;
    o.array("deps", |deps| {
        for dep in &record.deps {
            deps.object(|d| {
                d.field_int("id", i64::from(dep.id))?;
                if options.emit_dep_kind {
                    d.field_str("kind", dep.kind.as_str())?;
                }
                Ok(())
            })?;
        }
        Ok(())
    })
}

fn write_cdg_record<W: Write, F: Formatter>(
    o: &mut ObjectWriter<'_, W, F>,
    record: &CdgRecord,
) -> Result<(), WriterError> {
    o.field_str("name", &record.name)?;
    if let Some(term) = record.term_inst {
        o.field_int("termInst", i64::from(term))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depdump_core::function::FunctionBuilder;
    use depdump_core::id::{BlockId, InstId};
    use depdump_core::pdg::DepKind;

    fn tiny() -> (Function, Pdg, Cdg) {
        let mut b = FunctionBuilder::new("tiny");
        b.block("entry");
        b.inst("%a = add i32 1, 2");
        b.terminator("ret i32 %a");
        let f = b.build();

        let mut pdg = Pdg::new();
        let a = pdg.add_node(Some(InstId(0)));
        let ret = pdg.add_node(Some(InstId(1)));
        pdg.add_dep(ret, a, DepKind::Data).unwrap();

        let mut cdg = Cdg::new();
        cdg.add_node(Some(BlockId(0)));
        (f, pdg, cdg)
    }

    fn compact() -> ExportOptions {
        ExportOptions {
            layout: Layout::Compact,
            ..ExportOptions::default()
        }
    }

    #[test]
    fn compact_document_matches_expected_text() {
        let (f, pdg, cdg) = tiny();
        let mut out = Vec::new();
        let stats = serialize_to_writer(&mut out, &f, &pdg, &cdg, &compact()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            concat!(
                r#"{"pdg":[{"inst":"%a = add i32 1, 2","bbId":0,"realId":0,"deps":[]},"#,
                r#"{"inst":"ret i32 %a","bbId":0,"realId":1,"deps":[{"id":0}]}],"#,
                r#""cdg":[{"name":"entry","termInst":1}]}"#
            )
        );
        assert_eq!(
            stats,
            ExportStats {
                pdg_records: 2,
                skipped_pdg_nodes: 0,
                cdg_records: 1,
                skipped_cdg_nodes: 0,
            }
        );
    }

    #[test]
    fn dep_kind_is_opt_in() {
        let (f, pdg, cdg) = tiny();
        let options = ExportOptions {
            emit_dep_kind: true,
            ..compact()
        };
        let mut out = Vec::new();
        serialize_to_writer(&mut out, &f, &pdg, &cdg, &options).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#""deps":[{"id":0,"kind":"data"}]"#));
    }

    #[test]
    fn non_whitespace_indent_fails_writer_init() {
        let (f, pdg, cdg) = tiny();
        let options = ExportOptions {
            indent: "->".to_string(),
            ..ExportOptions::default()
        };
        let mut out = Vec::new();
        let err = serialize_to_writer(&mut out, &f, &pdg, &cdg, &options).unwrap_err();
        assert!(matches!(err, ExportError::WriterInit(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn tab_indent_is_accepted() {
        let (f, pdg, cdg) = tiny();
        let options = ExportOptions {
            indent: "\t".to_string(),
            ..ExportOptions::default()
        };
        let mut out = Vec::new();
        serialize_to_writer(&mut out, &f, &pdg, &cdg, &options).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\n\t\"pdg\": ["));
    }

    #[test]
    fn empty_graphs_still_produce_both_keys() {
        let f = FunctionBuilder::new("empty").build();
        let mut out = Vec::new();
        let stats = serialize_to_writer(&mut out, &f, &Pdg::new(), &Cdg::new(), &compact()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"pdg":[],"cdg":[]}"#);
        assert_eq!(stats, ExportStats::default());
    }
}
