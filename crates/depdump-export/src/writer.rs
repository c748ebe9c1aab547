//! Streaming JSON writer with checked nesting.
//!
//! [`JsonStream`] forwards primitive tokens straight to its sink, laid out by
//! a `serde_json` [`Formatter`]. Nothing is buffered beyond the sink's own
//! buffer, so an aborted export leaves a visible (invalid) partial document.
//!
//! Every open pushes a frame and every close pops and verifies it. Mismatched
//! tokens fail with [`WriterError`] instead of silently producing a malformed
//! file. Most callers should not use the tokens directly: the closure builders
//! ([`JsonStream::object`], [`ObjectWriter::array`], ...) open and close each
//! container themselves, so pairing is structural.

use std::io::Write;

use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};

use crate::error::WriterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object { first: bool, key_pending: bool },
    Array { first: bool },
}

impl Frame {
    fn describe(&self) -> &'static str {
        match self {
            Frame::Object { .. } => "end of object",
            Frame::Array { .. } => "end of array",
        }
    }
}

/// A token-level JSON writer over `W`.
pub struct JsonStream<W: Write, F: Formatter> {
    sink: W,
    fmt: F,
    stack: Vec<Frame>,
    root_written: bool,
}

impl<W: Write> JsonStream<W, CompactFormatter> {
    /// A writer without insignificant whitespace.
    pub fn compact(sink: W) -> Self {
        JsonStream::new(sink, CompactFormatter)
    }
}

impl<'i, W: Write> JsonStream<W, PrettyFormatter<'i>> {
    /// An indenting writer using `indent` as the indentation unit.
    pub fn pretty(sink: W, indent: &'i [u8]) -> Self {
        JsonStream::new(sink, PrettyFormatter::with_indent(indent))
    }
}

impl<W: Write, F: Formatter> JsonStream<W, F> {
    pub fn new(sink: W, fmt: F) -> Self {
        JsonStream {
            sink,
            fmt,
            stack: Vec::new(),
            root_written: false,
        }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    pub fn begin_object(&mut self) -> Result<(), WriterError> {
        self.before_value()?;
        self.fmt.begin_object(&mut self.sink)?;
        self.stack.push(Frame::Object {
            first: true,
            key_pending: false,
        });
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<(), WriterError> {
        match self.stack.last() {
            Some(Frame::Object { key_pending: false, .. }) => {}
            Some(Frame::Object { key_pending: true, .. }) => {
                return Err(WriterError::Misplaced("object closed after a key with no value"))
            }
            Some(other) => {
                return Err(WriterError::Unbalanced {
                    expected: other.describe(),
                    found: "end of object",
                })
            }
            None => {
                return Err(WriterError::Unbalanced {
                    expected: "a value",
                    found: "end of object",
                })
            }
        }
        self.stack.pop();
        self.fmt.end_object(&mut self.sink)?;
        self.after_value()
    }

    pub fn begin_array(&mut self) -> Result<(), WriterError> {
        self.before_value()?;
        self.fmt.begin_array(&mut self.sink)?;
        self.stack.push(Frame::Array { first: true });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<(), WriterError> {
        match self.stack.last() {
            Some(Frame::Array { .. }) => {}
            Some(other) => {
                return Err(WriterError::Unbalanced {
                    expected: other.describe(),
                    found: "end of array",
                })
            }
            None => {
                return Err(WriterError::Unbalanced {
                    expected: "a value",
                    found: "end of array",
                })
            }
        }
        self.stack.pop();
        self.fmt.end_array(&mut self.sink)?;
        self.after_value()
    }

    /// Writes an object key. The next token must be its value.
    pub fn key(&mut self, key: &str) -> Result<(), WriterError> {
        let first = match self.stack.last_mut() {
            Some(Frame::Object { first, key_pending }) => {
                if *key_pending {
                    return Err(WriterError::Misplaced("key follows a key"));
                }
                let was_first = *first;
                *first = false;
                *key_pending = true;
                was_first
            }
            _ => return Err(WriterError::Misplaced("key outside object")),
        };
        self.fmt.begin_object_key(&mut self.sink, first)?;
        serde_json::to_writer(&mut self.sink, key).map_err(std::io::Error::from)?;
        self.fmt.end_object_key(&mut self.sink)?;
        Ok(())
    }

    /// Writes a string value with standard JSON escaping.
    pub fn string(&mut self, value: &str) -> Result<(), WriterError> {
        self.before_value()?;
        serde_json::to_writer(&mut self.sink, value).map_err(std::io::Error::from)?;
        self.after_value()
    }

    /// Writes an integer value.
    pub fn int(&mut self, value: i64) -> Result<(), WriterError> {
        self.before_value()?;
        self.fmt.write_i64(&mut self.sink, value)?;
        self.after_value()
    }

    pub fn field_str(&mut self, key: &str, value: &str) -> Result<(), WriterError> {
        self.key(key)?;
        self.string(value)
    }

    pub fn field_int(&mut self, key: &str, value: i64) -> Result<(), WriterError> {
        self.key(key)?;
        self.int(value)
    }

    /// Writes a key and opens an array as its value.
    pub fn field_array_begin(&mut self, key: &str) -> Result<(), WriterError> {
        self.key(key)?;
        self.begin_array()
    }

    /// Verifies the document is complete, flushes and returns the sink.
    pub fn finish(mut self) -> Result<W, WriterError> {
        if let Some(open) = self.stack.last() {
            return Err(WriterError::Unbalanced {
                expected: open.describe(),
                found: "end of document",
            });
        }
        if !self.root_written {
            return Err(WriterError::Misplaced("document has no root value"));
        }
        self.sink.flush()?;
        Ok(self.sink)
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Writes one object, delegating its fields to `body`.
    pub fn object<R>(
        &mut self,
        body: impl FnOnce(&mut ObjectWriter<'_, W, F>) -> Result<R, WriterError>,
    ) -> Result<R, WriterError> {
        self.begin_object()?;
        let out = body(&mut ObjectWriter { stream: self })?;
        self.end_object()?;
        Ok(out)
    }

    /// Writes one array, delegating its elements to `body`.
    pub fn array<R>(
        &mut self,
        body: impl FnOnce(&mut ArrayWriter<'_, W, F>) -> Result<R, WriterError>,
    ) -> Result<R, WriterError> {
        self.begin_array()?;
        let out = body(&mut ArrayWriter { stream: self })?;
        self.end_array()?;
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Frame bookkeeping
    // -----------------------------------------------------------------------

    fn before_value(&mut self) -> Result<(), WriterError> {
        match self.stack.last_mut() {
            Some(Frame::Array { first }) => {
                let was_first = *first;
                *first = false;
                self.fmt.begin_array_value(&mut self.sink, was_first)?;
            }
            Some(Frame::Object { key_pending, .. }) => {
                if !*key_pending {
                    return Err(WriterError::Misplaced("object value without a key"));
                }
                self.fmt.begin_object_value(&mut self.sink)?;
            }
            None => {
                if self.root_written {
                    return Err(WriterError::Misplaced("second root value"));
                }
                self.root_written = true;
            }
        }
        Ok(())
    }

    fn after_value(&mut self) -> Result<(), WriterError> {
        match self.stack.last_mut() {
            Some(Frame::Array { .. }) => self.fmt.end_array_value(&mut self.sink)?,
            Some(Frame::Object { key_pending, .. }) => {
                *key_pending = false;
                self.fmt.end_object_value(&mut self.sink)?;
            }
            None => {}
        }
        Ok(())
    }
}

/// Field writer handed to [`JsonStream::object`] bodies.
pub struct ObjectWriter<'s, W: Write, F: Formatter> {
    stream: &'s mut JsonStream<W, F>,
}

impl<W: Write, F: Formatter> ObjectWriter<'_, W, F> {
    pub fn field_str(&mut self, key: &str, value: &str) -> Result<(), WriterError> {
        self.stream.field_str(key, value)
    }

    pub fn field_int(&mut self, key: &str, value: i64) -> Result<(), WriterError> {
        self.stream.field_int(key, value)
    }

    /// Writes `key` with an array value built by `body`.
    pub fn array<R>(
        &mut self,
        key: &str,
        body: impl FnOnce(&mut ArrayWriter<'_, W, F>) -> Result<R, WriterError>,
    ) -> Result<R, WriterError> {
        self.stream.key(key)?;
        self.stream.array(body)
    }
}

/// Element writer handed to [`JsonStream::array`] bodies.
pub struct ArrayWriter<'s, W: Write, F: Formatter> {
    stream: &'s mut JsonStream<W, F>,
}

impl<W: Write, F: Formatter> ArrayWriter<'_, W, F> {
    pub fn int(&mut self, value: i64) -> Result<(), WriterError> {
        self.stream.int(value)
    }

    pub fn object<R>(
        &mut self,
        body: impl FnOnce(&mut ObjectWriter<'_, W, F>) -> Result<R, WriterError>,
    ) -> Result<R, WriterError> {
        self.stream.object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact_output(build: impl FnOnce(&mut JsonStream<Vec<u8>, CompactFormatter>) -> Result<(), WriterError>) -> String {
        let mut stream = JsonStream::compact(Vec::new());
        build(&mut stream).unwrap();
        String::from_utf8(stream.finish().unwrap()).unwrap()
    }

    #[test]
    fn tokens_produce_compact_json() {
        let out = compact_output(|s| {
            s.begin_object()?;
            s.field_str("name", "entry")?;
            s.field_int("termInst", 3)?;
            s.field_array_begin("deps")?;
            s.begin_object()?;
            s.field_int("id", 0)?;
            s.end_object()?;
            s.int(7)?;
            s.end_array()?;
            s.end_object()
        });
        assert_eq!(out, r#"{"name":"entry","termInst":3,"deps":[{"id":0},7]}"#);
    }

    #[test]
    fn builders_produce_the_same_document() {
        let out = compact_output(|s| {
            s.object(|o| {
                o.field_str("name", "entry")?;
                o.field_int("termInst", 3)?;
                o.array("deps", |a| {
                    a.object(|d| d.field_int("id", 0))?;
                    a.int(7)
                })
            })
        });
        assert_eq!(out, r#"{"name":"entry","termInst":3,"deps":[{"id":0},7]}"#);
    }

    #[test]
    fn empty_containers() {
        let out = compact_output(|s| s.object(|o| o.array("deps", |_| Ok(()))));
        assert_eq!(out, r#"{"deps":[]}"#);
    }

    #[test]
    fn strings_are_escaped() {
        let out = compact_output(|s| s.object(|o| o.field_str("inst", "call @\"f\"\n\ttail")));
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["inst"], "call @\"f\"\n\ttail");
        assert!(out.contains(r#"\"f\"\n\t"#));
    }

    #[test]
    fn pretty_layout_parses_to_the_same_value() {
        let mut stream = JsonStream::pretty(Vec::new(), b"  ");
        stream
            .object(|o| {
                o.array("pdg", |a| a.object(|r| r.field_int("realId", 1)))?;
                o.array("cdg", |_| Ok(()))
            })
            .unwrap();
        let out = String::from_utf8(stream.finish().unwrap()).unwrap();
        assert!(out.contains('\n'));
        assert!(out.contains("\"cdg\": []"));
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, serde_json::json!({ "pdg": [ { "realId": 1 } ], "cdg": [] }));
    }

    #[test]
    fn mismatched_close_is_rejected() {
        let mut s = JsonStream::compact(Vec::new());
        s.begin_object().unwrap();
        s.field_array_begin("pdg").unwrap();
        let err = s.end_object().unwrap_err();
        assert!(matches!(
            err,
            WriterError::Unbalanced { expected: "end of array", found: "end of object" }
        ));
        assert_eq!(s.depth(), 2);
    }

    #[test]
    fn close_without_open_is_rejected() {
        let mut s = JsonStream::compact(Vec::new());
        assert!(matches!(s.end_array(), Err(WriterError::Unbalanced { .. })));
    }

    #[test]
    fn key_rules_are_enforced() {
        let mut s = JsonStream::compact(Vec::new());
        assert!(matches!(s.key("x"), Err(WriterError::Misplaced("key outside object"))));

        s.begin_object().unwrap();
        assert!(matches!(s.int(1), Err(WriterError::Misplaced("object value without a key"))));
        s.key("a").unwrap();
        assert!(matches!(s.key("b"), Err(WriterError::Misplaced("key follows a key"))));
        assert!(matches!(s.end_object(), Err(WriterError::Misplaced(_))));
    }

    #[test]
    fn finish_requires_balanced_document() {
        let mut s = JsonStream::compact(Vec::new());
        s.begin_array().unwrap();
        let err = s.finish().unwrap_err();
        assert!(matches!(
            err,
            WriterError::Unbalanced { expected: "end of array", found: "end of document" }
        ));

        let empty = JsonStream::compact(Vec::new());
        assert!(matches!(empty.finish(), Err(WriterError::Misplaced(_))));
    }

    #[test]
    fn second_root_is_rejected() {
        let mut s = JsonStream::compact(Vec::new());
        s.object(|_| Ok(())).unwrap();
        assert!(matches!(s.begin_object(), Err(WriterError::Misplaced("second root value"))));
    }

    #[test]
    fn tokens_reach_the_sink_before_finish() {
        let mut sink = Vec::new();
        {
            let mut s = JsonStream::compact(&mut sink);
            s.begin_object().unwrap();
            s.field_array_begin("pdg").unwrap();
        }
        assert_eq!(sink, br#"{"pdg":["#);
    }
}
