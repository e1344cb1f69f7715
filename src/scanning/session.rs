//! Scan session
//!
//! Owns the frozen [`MatchEngine`] and one [`StreamState`] per logical
//! stream. Each stream has its own window and its own shadow ledger; the
//! ledgers are merged only at finalization, so streams never share mutable
//! state.
//!
//! # Coverage
//! A window is evaluated anchored at its oldest byte. With single-byte
//! deliveries (or [`EvaluationMode::PerByte`]) every stream offset becomes
//! the anchor exactly once: while streaming for all but the last
//! `window_size - 1` offsets, and during the finalization flush for those.
//! With multi-byte chunks in [`EvaluationMode::PerChunk`] the anchor jumps
//! by the number of accepted bytes, and offsets in between are not tested.

use log::debug;
use serde::Serialize;

use super::engine::{Evaluation, MatchEngine};
use super::ledger::{MatchLedger, Report};
use crate::config::{EvaluationMode, ScannerConfig};
use crate::dictionary::PatternDictionary;
use crate::streaming::RingBuffer;
use crate::telemetry;

/// Logical byte stream observed by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamId {
    /// Memory reads
    Read,
    /// Memory writes
    Write,
}

impl StreamId {
    pub const ALL: [StreamId; 2] = [StreamId::Read, StreamId::Write];

    #[inline]
    fn index(self) -> usize {
        match self {
            StreamId::Read => 0,
            StreamId::Write => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StreamId::Read => "read",
            StreamId::Write => "write",
        }
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stream counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Raw bytes delivered
    pub bytes_seen: u64,
    /// Canonical bytes that entered the window
    pub bytes_accepted: u64,
    /// Window evaluations, finalization flush included
    pub evaluations: u64,
    /// Evaluations rejected by the prefix filter
    pub filtered: u64,
    /// Patterns recorded
    pub hits: u64,
}

impl ScanStats {
    pub fn absorb(&mut self, other: ScanStats) {
        self.bytes_seen += other.bytes_seen;
        self.bytes_accepted += other.bytes_accepted;
        self.evaluations += other.evaluations;
        self.filtered += other.filtered;
        self.hits += other.hits;
    }
}

/// Session behaviour knobs taken from [`ScannerConfig`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub evaluation: EvaluationMode,
    pub flush_on_finalize: bool,
    pub log_matches: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&ScannerConfig::default())
    }
}

impl From<&ScannerConfig> for SessionOptions {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            evaluation: config.evaluation,
            flush_on_finalize: config.flush_on_finalize,
            log_matches: config.log_matches,
        }
    }
}

/// Window, shadow ledger and counters for one stream
#[derive(Clone, Debug)]
pub struct StreamState {
    id: StreamId,
    window: RingBuffer,
    ledger: MatchLedger,
    /// Linear copy of the window, reused across evaluations
    scratch: Vec<u8>,
    stats: ScanStats,
}

impl StreamState {
    pub fn new(id: StreamId, window_size: usize) -> Self {
        Self {
            id,
            window: RingBuffer::new(window_size),
            ledger: MatchLedger::new(),
            scratch: Vec::with_capacity(window_size),
            stats: ScanStats::default(),
        }
    }

    /// Normalize `bytes` into the window and evaluate per `options`
    pub fn feed<D: PatternDictionary>(
        &mut self,
        engine: &MatchEngine<D>,
        bytes: &[u8],
        options: &SessionOptions,
    ) {
        self.stats.bytes_seen += bytes.len() as u64;
        match options.evaluation {
            EvaluationMode::PerChunk => {
                let accepted = self.window.process_chunk(bytes);
                self.stats.bytes_accepted += accepted as u64;
                // An all-discarded chunk leaves the window as it was
                if accepted > 0 {
                    self.evaluate(engine, options.log_matches);
                }
            }
            EvaluationMode::PerByte => {
                for &raw in bytes {
                    if self.window.accept(raw) {
                        self.stats.bytes_accepted += 1;
                        self.evaluate(engine, options.log_matches);
                    }
                }
            }
        }
    }

    fn evaluate<D: PatternDictionary>(&mut self, engine: &MatchEngine<D>, log_matches: bool) {
        self.window.snapshot_into(&mut self.scratch);
        self.evaluate_at(engine, 0, log_matches);
    }

    fn evaluate_at<D: PatternDictionary>(
        &mut self,
        engine: &MatchEngine<D>,
        offset: usize,
        log_matches: bool,
    ) {
        self.stats.evaluations += 1;
        match engine.evaluate(&self.scratch[offset..], &mut self.ledger) {
            Evaluation::Filtered => self.stats.filtered += 1,
            Evaluation::Searched(hits) if hits > 0 => {
                self.stats.hits += hits as u64;
                if log_matches {
                    debug!(
                        "[stream={}] {} hit(s) in window {:?}",
                        self.id,
                        hits,
                        String::from_utf8_lossy(&self.scratch[offset..])
                    );
                }
            }
            _ => {}
        }
    }

    /// Evaluate the offsets still inside the window that were never the
    /// anchor. Zero padding in front of the first real byte is skipped.
    pub fn flush<D: PatternDictionary>(&mut self, engine: &MatchEngine<D>, log_matches: bool) {
        let accepted = self.window.total_written();
        if accepted == 0 {
            return;
        }
        self.window.snapshot_into(&mut self.scratch);
        let capacity = self.window.capacity();
        // Offset 0 was the anchor of the last evaluation once warm
        let first = if self.window.is_warm() {
            1
        } else {
            capacity - accepted as usize
        };
        let last = capacity.saturating_sub(engine.limits().min_len());
        for offset in first..=last {
            self.evaluate_at(engine, offset, log_matches);
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn ledger(&self) -> &MatchLedger {
        &self.ledger
    }

    /// Chronological window contents, zero padding included
    pub fn window(&self) -> Vec<u8> {
        self.window.snapshot()
    }

    /// Hand over the shadow ledger, leaving an empty one
    pub fn take_ledger(&mut self) -> MatchLedger {
        std::mem::take(&mut self.ledger)
    }
}

/// A scan over both streams against one dictionary
pub struct ScanSession<D> {
    engine: MatchEngine<D>,
    streams: [StreamState; 2],
    options: SessionOptions,
    report: Option<Report>,
}

impl<D: PatternDictionary> ScanSession<D> {
    pub fn new(engine: MatchEngine<D>, options: SessionOptions) -> Self {
        let window_size = engine.limits().window_size();
        Self {
            engine,
            streams: StreamId::ALL.map(|id| StreamState::new(id, window_size)),
            options,
            report: None,
        }
    }

    /// Deliver one chunk observed on `stream`
    pub fn on_bytes(&mut self, stream: StreamId, bytes: &[u8]) {
        if self.report.is_some() {
            debug!(
                "[stream={}] Scan finalized, ignoring {} bytes",
                stream,
                bytes.len()
            );
            return;
        }
        if bytes.is_empty() {
            return;
        }
        self.streams[stream.index()].feed(&self.engine, bytes, &self.options);
    }

    /// Drain the ledgers into the final report. Later calls return the same
    /// report and the session ignores further input.
    pub fn finalize(&mut self) -> &Report {
        let Self {
            engine,
            streams,
            options,
            report,
        } = self;
        report.get_or_insert_with(|| Self::drain(engine, streams, options))
    }

    fn drain(
        engine: &MatchEngine<D>,
        streams: &mut [StreamState; 2],
        options: &SessionOptions,
    ) -> Report {
        let mut merged = MatchLedger::new();
        let mut totals = ScanStats::default();
        for stream in streams.iter_mut() {
            if options.flush_on_finalize {
                stream.flush(engine, options.log_matches);
            }
            totals.absorb(stream.stats());
            merged.merge(stream.take_ledger());
        }

        let report = merged.into_report();
        telemetry::scan_finalized(totals, report.len(), report.total()).emit();
        report
    }

    pub fn is_finalized(&self) -> bool {
        self.report.is_some()
    }

    pub fn stream(&self, id: StreamId) -> &StreamState {
        &self.streams[id.index()]
    }

    /// Counters summed over both streams
    pub fn stats(&self) -> ScanStats {
        let mut totals = ScanStats::default();
        for stream in &self.streams {
            totals.absorb(stream.stats());
        }
        totals
    }

    pub fn engine(&self) -> &MatchEngine<D> {
        &self.engine
    }
}
