//! Response-body chunk queue.
//!
//! The body is an ordered, append-only sequence of chunks: bytes held in
//! memory, zero-copy references to files on disk, and backing temporary
//! storage for spilled output. Producers append in document order and the
//! queue preserves it: a later temp-storage append never merges into a
//! temp chunk that has memory chunks after it.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// One segment of the response stream.
#[derive(Debug)]
pub enum Chunk {
    /// Bytes held in memory.
    Memory(Vec<u8>),
    /// Reference to a file on disk, read at transmission time.
    FileRef { path: PathBuf, size: u64 },
    /// Backing temporary storage holding spilled output.
    Temp(File),
}

/// Ordered, append-only response body.
#[derive(Debug, Default)]
pub struct ResponseBody {
    chunks: Vec<Chunk>,
}

impl ResponseBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes, extending the trailing memory chunk when possible.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if let Some(Chunk::Memory(buf)) = self.chunks.last_mut() {
            buf.extend_from_slice(bytes);
            return;
        }
        self.chunks.push(Chunk::Memory(bytes.to_vec()));
    }

    /// Commit a caller-built buffer as one memory chunk.
    pub fn commit_buffer(&mut self, buf: Vec<u8>) {
        if !buf.is_empty() {
            self.chunks.push(Chunk::Memory(buf));
        }
    }

    /// Append a zero-copy file reference.
    pub fn append_file_ref(&mut self, path: PathBuf, size: u64) {
        self.chunks.push(Chunk::FileRef { path, size });
    }

    /// Append bytes to backing temporary storage, extending the trailing
    /// temp chunk when there is one.
    pub fn append_to_tempfile(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let Some(Chunk::Temp(file)) = self.chunks.last_mut() {
            return file.write_all(bytes);
        }
        let mut file = tempfile::tempfile()?;
        file.write_all(bytes)?;
        self.chunks.push(Chunk::Temp(file));
        Ok(())
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Stream the body into `writer` in chunk order.
    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        for chunk in &mut self.chunks {
            match chunk {
                Chunk::Memory(buf) => writer.write_all(buf)?,
                Chunk::FileRef { path, .. } => {
                    let mut file = File::open(&*path)?;
                    io::copy(&mut file, writer)?;
                }
                Chunk::Temp(file) => {
                    file.seek(SeekFrom::Start(0))?;
                    io::copy(file, writer)?;
                }
            }
        }
        Ok(())
    }

    /// Drain the body into one byte vector (file references and temp
    /// storage are read back from disk).
    pub fn collect(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}
