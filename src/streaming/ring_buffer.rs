//! Ring Buffer for per-stream windows
//!
//! Memory usage is FLAT regardless of stream length. The buffer:
//! - Uses a pre-allocated, zero-filled fixed-size buffer
//! - Overwrites the oldest byte as each canonical byte arrives
//! - Normalizes raw bytes on the way in
//! - Reconstructs the chronological window on demand
//!
//! Slots that have never been written read as zero. Stored patterns never
//! contain NUL, so those padding bytes cannot take part in a match, but they
//! do occupy the front of the window until `capacity` bytes have arrived.

use super::normalizer::canonicalize;

/// Fixed-capacity window over one stream's canonical bytes
#[derive(Clone, Debug)]
pub struct RingBuffer {
    /// Pre-allocated fixed-size buffer
    buffer: Vec<u8>,
    /// Buffer capacity (fixed, no growth)
    capacity: usize,
    /// Next slot to fill (wraps around)
    write_pos: usize,
    /// Total canonical bytes written
    total_written: u64,
}

impl RingBuffer {
    /// Create with fixed capacity - NO dynamic growth
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            buffer: vec![0u8; capacity],
            capacity,
            write_pos: 0,
            total_written: 0,
        }
    }

    /// Append one canonical byte, overwriting the oldest
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buffer[self.write_pos] = byte;
        self.write_pos += 1;
        if self.write_pos == self.capacity {
            self.write_pos = 0;
        }
        self.total_written += 1;
    }

    /// Normalize one raw byte and append it unless it is discarded.
    /// Returns whether the byte was accepted.
    #[inline]
    pub fn accept(&mut self, raw: u8) -> bool {
        match canonicalize(raw) {
            Some(byte) => {
                self.push(byte);
                true
            }
            None => false,
        }
    }

    /// Normalize and append a raw chunk. Returns the number of bytes accepted.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> usize {
        chunk.iter().filter(|&&raw| self.accept(raw)).count()
    }

    /// The two halves of the window in chronological order: the segment from
    /// the cursor to the end, then the segment before the cursor.
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        (&self.buffer[self.write_pos..], &self.buffer[..self.write_pos])
    }

    /// Reconstruct the window, oldest byte first, into `out`
    pub fn snapshot_into(&self, out: &mut Vec<u8>) {
        let (older, newer) = self.as_slices();
        out.clear();
        out.extend_from_slice(older);
        out.extend_from_slice(newer);
    }

    /// Reconstruct the window, oldest byte first
    pub fn snapshot(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.capacity);
        self.snapshot_into(&mut out);
        out
    }

    /// Get total canonical bytes written
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Whether every slot has been written at least once
    pub fn is_warm(&self) -> bool {
        self.total_written >= self.capacity as u64
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
