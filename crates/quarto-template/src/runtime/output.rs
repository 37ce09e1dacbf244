/*
 * output.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Output sink for renderable nodes.
//!
//! Output is a list of segments. Text segments are appended directly;
//! deferred segments hold the result of a task running on an executor and
//! are resolved in source order when the output is finished.

use crate::error::{RenderError, RenderResult};
use std::fmt;
use std::sync::mpsc::Receiver;

#[derive(Debug)]
enum Segment {
    Text(String),
    Deferred {
        receiver: Receiver<RenderResult<String>>,
        line: usize,
        template: String,
    },
}

/// Where renderable nodes write their output.
#[derive(Debug, Default)]
pub struct Output {
    segments: Vec<Segment>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(buf)) => buf.push_str(text),
            _ => self.segments.push(Segment::Text(text.to_string())),
        }
    }

    /// Reserve a position for output produced by another thread.
    pub fn defer(
        &mut self,
        receiver: Receiver<RenderResult<String>>,
        line: usize,
        template: impl Into<String>,
    ) {
        self.segments.push(Segment::Deferred {
            receiver,
            line,
            template: template.into(),
        });
    }

    /// True if any segment is still waiting on a task.
    pub fn has_deferred(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Deferred { .. }))
    }

    /// Write all segments to `writer`, waiting on deferred segments in order.
    ///
    /// The first failed task aborts the write. Tasks that are still running
    /// are left to finish on their own.
    pub fn finish<W: fmt::Write + ?Sized>(self, writer: &mut W) -> RenderResult<()> {
        for segment in self.segments {
            match segment {
                Segment::Text(text) => writer.write_str(&text)?,
                Segment::Deferred {
                    receiver,
                    line,
                    template,
                } => {
                    let text = receiver
                        .recv()
                        .map_err(|_| RenderError::TaskAborted { line, template })??;
                    writer.write_str(&text)?;
                }
            }
        }
        Ok(())
    }

    pub fn into_string(self) -> RenderResult<String> {
        let mut out = String::new();
        self.finish(&mut out)?;
        Ok(out)
    }
}

impl fmt::Write for Output {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s);
        Ok(())
    }
}
