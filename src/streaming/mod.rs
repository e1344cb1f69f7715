//! Streaming module for per-stream byte windows
//!
//! This module provides streaming primitives that:
//! - Canonicalize raw bytes (case folding, punctuation and NUL removal)
//! - Use fixed memory allocation (ring buffer)
//! - Rebuild the chronological window on demand

pub mod normalizer;
pub mod ring_buffer;

pub use normalizer::{canonicalize, is_canonical};
pub use ring_buffer::RingBuffer;
