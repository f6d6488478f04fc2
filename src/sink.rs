//! Spill-capable output sink.
//!
//! Every producer in the render pass appends through one [`OutputSink`].
//! The sink has two implementations behind one contract, chosen once per
//! render pass: in-memory accumulation for small listings, or a bounded
//! scratch buffer flushed to backing temporary storage for large ones.
//! Both produce byte-identical output for the same appends; only where
//! the bytes rest differs.

use crate::body::ResponseBody;

/// Combined entry count at or above which a render pass spills.
pub const SPILL_THRESHOLD: usize = 256;

/// Scratch buffer size in spill mode.
const SCRATCH_CAPACITY: usize = 8192;

/// Free scratch space below which the buffer is flushed.
const LOW_WATER: usize = 256;

#[derive(Debug)]
enum Mode {
    Memory(Vec<u8>),
    Spill(Vec<u8>),
}

/// Append-only byte stream over a response body.
///
/// A failed write to backing storage latches: every later append for this
/// sink is dropped, while output already flushed stays in the body.
#[derive(Debug)]
pub struct OutputSink<'a> {
    body: &'a mut ResponseBody,
    mode: Mode,
    failed: bool,
}

impl<'a> OutputSink<'a> {
    /// Pick the implementation from the combined entry count.
    pub fn for_entry_count(body: &'a mut ResponseBody, entries: usize) -> Self {
        if entries >= SPILL_THRESHOLD {
            Self::spill(body)
        } else {
            Self::memory(body)
        }
    }

    pub fn memory(body: &'a mut ResponseBody) -> Self {
        Self {
            body,
            mode: Mode::Memory(Vec::new()),
            failed: false,
        }
    }

    pub fn spill(body: &'a mut ResponseBody) -> Self {
        Self {
            body,
            mode: Mode::Spill(Vec::with_capacity(SCRATCH_CAPACITY)),
            failed: false,
        }
    }

    pub fn is_spilling(&self) -> bool {
        matches!(self.mode, Mode::Spill(_))
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn append(&mut self, bytes: &[u8]) {
        if self.failed {
            return;
        }
        match &mut self.mode {
            Mode::Memory(buf) => buf.extend_from_slice(bytes),
            Mode::Spill(buf) => buf.extend_from_slice(bytes),
        }
        if let Mode::Spill(buf) = &self.mode {
            if buf.len() + LOW_WATER > SCRATCH_CAPACITY {
                self.flush_scratch();
            }
        }
    }

    /// Hand the underlying body to `f`, with all pending sink output
    /// committed first so chunks appended by `f` land in document order.
    pub fn yield_to(&mut self, f: impl FnOnce(&mut ResponseBody)) {
        if self.failed {
            return;
        }
        match &mut self.mode {
            Mode::Memory(buf) => {
                if !buf.is_empty() {
                    self.body.commit_buffer(std::mem::take(buf));
                }
            }
            Mode::Spill(_) => self.flush_scratch(),
        }
        if self.failed {
            return;
        }
        f(self.body);
    }

    /// Commit whatever is still pending. Consumes the sink.
    pub fn finish(mut self) {
        if self.failed {
            return;
        }
        match &mut self.mode {
            Mode::Memory(buf) => self.body.commit_buffer(std::mem::take(buf)),
            Mode::Spill(_) => self.flush_scratch(),
        }
    }

    fn flush_scratch(&mut self) {
        let Mode::Spill(buf) = &mut self.mode else {
            return;
        };
        if buf.is_empty() {
            return;
        }
        if let Err(err) = self.body.append_to_tempfile(buf) {
            log::error!("write to backing storage failed, dropping remaining output: {err}");
            self.failed = true;
        }
        buf.clear();
    }
}
