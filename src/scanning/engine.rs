//! Match engine
//!
//! Building and scanning are separate types. [`EngineBuilder`] owns the
//! dictionary while lines are ingested; [`EngineBuilder::build`] freezes it
//! into a [`MatchEngine`], which only ever reads it.
//!
//! # Incremental descent
//! For a window `w`, the engine walks `w[..min_len]` from the root once and
//! then extends the prefix one byte at a time up to `max_len`, moving the
//! cursor along a single edge per step. Each terminal cursor is a stored
//! pattern equal to the current prefix. A broken path ends the evaluation,
//! since no longer prefix can be stored either. Cost per window is bounded
//! by the window length, independent of dictionary size.

use std::io::BufRead;

use log::{debug, info, warn};

use super::ledger::MatchLedger;
use crate::config::ScanLimits;
use crate::dictionary::loader::{classify_line, for_each_line, LineClass};
use crate::dictionary::prefix_filter::PREFIX_LEN;
use crate::dictionary::{LoadError, LoadStats, PatternDictionary, PrefixFilter};
use crate::telemetry;

/// Progress is logged every this many accepted lines
const PROGRESS_INTERVAL: u64 = 100_000;

/// Outcome of one window evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    /// Window shorter than the minimum pattern length
    Skipped,
    /// Rejected by the prefix filter before any trie work
    Filtered,
    /// Descended; carries the number of patterns recorded
    Searched(usize),
}

/// Build-phase owner of the dictionary and prefix filter
pub struct EngineBuilder<D> {
    dictionary: D,
    filter: Option<PrefixFilter>,
    limits: ScanLimits,
    stats: LoadStats,
}

impl<D: PatternDictionary> EngineBuilder<D> {
    /// Start a build over an empty `dictionary`
    pub fn new(dictionary: D, limits: ScanLimits, prefix_filter: bool) -> Self {
        let filter = if prefix_filter && limits.min_len() < PREFIX_LEN {
            warn!(
                "Prefix filter disabled: min_len {} is shorter than the {}-byte prefix",
                limits.min_len(), PREFIX_LEN
            );
            None
        } else if prefix_filter {
            Some(PrefixFilter::new())
        } else {
            None
        };

        Self {
            dictionary,
            filter,
            limits,
            stats: LoadStats::default(),
        }
    }

    /// Classify one line and store it if it fits the length bounds
    pub fn add_line(&mut self, line: &[u8]) -> LineClass {
        let class = classify_line(line, &self.limits);
        self.stats.record(class);
        if let LineClass::Accept { .. } = class {
            self.dictionary.insert(line);
            if let Some(filter) = self.filter.as_mut() {
                filter.insert(line);
            }
            if self.stats.accepted % PROGRESS_INTERVAL == 0 {
                debug!("Loaded {} strings", self.stats.accepted);
            }
        }
        class
    }

    /// Ingest every line of an in-memory source
    pub fn load_lines<I, L>(&mut self, lines: I) -> LoadStats
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        for line in lines {
            self.add_line(line.as_ref());
        }
        self.stats
    }

    /// Ingest a line-oriented reader. A read failure aborts the load.
    pub fn load_reader<R: BufRead>(&mut self, reader: R) -> Result<LoadStats, LoadError> {
        for_each_line(reader, |line| {
            self.add_line(line);
        })?;
        Ok(self.stats)
    }

    /// Counters so far
    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Freeze the dictionary and report how the load went
    pub fn build(self) -> MatchEngine<D> {
        let stats = self.stats;
        info!(
            "Added {} strings ({} distinct) to the {} dictionary",
            stats.accepted,
            self.dictionary.len(),
            D::NAME
        );
        if stats.too_long > 0 {
            warn!(
                "{} lines were too long (more than {} bytes) and were skipped",
                stats.too_long, self.limits.max_len()
            );
        }
        if stats.too_short > 0 {
            warn!(
                "{} lines were too short (less than {} bytes) and were skipped",
                stats.too_short, self.limits.min_len()
            );
        }
        if stats.invalid > 0 {
            warn!("{} lines contained NUL and were skipped", stats.invalid);
        }
        if stats.unmatchable > 0 {
            warn!(
                "{} stored lines contain lowercase or punctuation bytes and can never match",
                stats.unmatchable
            );
        }
        if self.dictionary.is_empty() {
            warn!("Dictionary is empty; no strings to search for");
        }

        telemetry::dictionary_loaded(D::NAME, self.dictionary.len(), stats).emit();
        if let Some(event) = telemetry::lines_skipped(stats) {
            event.emit();
        }

        MatchEngine {
            dictionary: self.dictionary,
            filter: self.filter,
            limits: self.limits,
            load_stats: stats,
        }
    }
}

/// Read-only matcher shared by every stream
pub struct MatchEngine<D> {
    dictionary: D,
    filter: Option<PrefixFilter>,
    limits: ScanLimits,
    load_stats: LoadStats,
}

impl<D: PatternDictionary> MatchEngine<D> {
    /// Record every stored pattern that is a prefix of `window`
    pub fn evaluate(&self, window: &[u8], ledger: &mut MatchLedger) -> Evaluation {
        let min_len = self.limits.min_len();
        let max_len = self.limits.max_len().min(window.len());
        if max_len < min_len {
            return Evaluation::Skipped;
        }
        if let Some(filter) = &self.filter {
            if !filter.admits(window) {
                return Evaluation::Filtered;
            }
        }

        let mut hits = 0;
        let mut len = min_len;
        let mut cursor = self.dictionary.descend_from_root(&window[..len]);
        while let Some(at) = cursor {
            if self.dictionary.is_terminal(at) {
                ledger.record(&window[..len]);
                hits += 1;
            }
            if len == max_len {
                break;
            }
            len += 1;
            cursor = self.dictionary.descend_one_edge(at, &window[..len]);
        }
        Evaluation::Searched(hits)
    }

    pub fn dictionary(&self) -> &D {
        &self.dictionary
    }

    pub fn filter(&self) -> Option<&PrefixFilter> {
        self.filter.as_ref()
    }

    pub fn limits(&self) -> ScanLimits {
        self.limits
    }

    pub fn load_stats(&self) -> LoadStats {
        self.load_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{CritBitTrie, WideTrie};
    use std::io::{self, Read};

    fn engine<D: PatternDictionary>(dictionary: D, patterns: &[&str], filter: bool) -> MatchEngine<D> {
        let mut builder = EngineBuilder::new(dictionary, ScanLimits::default(), filter);
        builder.load_lines(patterns);
        builder.build()
    }

    fn matched(ledger: &MatchLedger, patterns: &[&str]) -> Vec<u64> {
        patterns.iter().map(|p| ledger.count(p.as_bytes())).collect()
    }

    #[test]
    fn test_evaluate_records_every_prefix_pattern() {
        let patterns = ["ABCD", "ABCDEF", "ABCDEFGHIJKLMNOPQRST", "BCDE"];
        let engine = engine(CritBitTrie::new(), &patterns, true);
        let mut ledger = MatchLedger::new();

        let outcome = engine.evaluate(b"ABCDEFGHIJKLMNOPQRST", &mut ledger);
        assert_eq!(outcome, Evaluation::Searched(3));
        // Only prefixes of the window count; "BCDE" is an infix here
        assert_eq!(matched(&ledger, &patterns), vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_full_window_length_pattern() {
        let engine = engine(WideTrie::new(), &["ABCDEFGHIJKLMNOPQRST"], false);
        let mut ledger = MatchLedger::new();
        engine.evaluate(b"ABCDEFGHIJKLMNOPQRST", &mut ledger);
        assert_eq!(ledger.count(b"ABCDEFGHIJKLMNOPQRST"), 1);
    }

    #[test]
    fn test_filter_rejects_before_descent() {
        let engine = engine(CritBitTrie::new(), &["WXYZ"], true);
        let mut ledger = MatchLedger::new();
        assert_eq!(engine.evaluate(b"QQQQWXYZ", &mut ledger), Evaluation::Filtered);
        assert_eq!(engine.evaluate(b"WXYZQQQQ", &mut ledger), Evaluation::Searched(1));
    }

    #[test]
    fn test_short_window_skipped() {
        let engine = engine(CritBitTrie::new(), &["WXYZ"], true);
        let mut ledger = MatchLedger::new();
        assert_eq!(engine.evaluate(b"WXY", &mut ledger), Evaluation::Skipped);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_filter_never_changes_matches() {
        let patterns = ["ABCD", "ABCDX", "ABCE", "ZZZZZZ", "ABXYABXY"];
        let texts: [&[u8]; 5] = [b"ABCDXQQ", b"ABCEABCD", b"ZZZZZZZZ", b"ABXYABXYAB", b"\0\0ABCD"];

        let filtered = engine(CritBitTrie::new(), &patterns, true);
        let unfiltered = engine(CritBitTrie::new(), &patterns, false);
        for text in texts {
            let mut with = MatchLedger::new();
            let mut without = MatchLedger::new();
            filtered.evaluate(text, &mut with);
            unfiltered.evaluate(text, &mut without);
            assert_eq!(matched(&with, &patterns), matched(&without, &patterns));
        }
    }

    #[test]
    fn test_filter_admits_every_pattern() {
        let patterns = ["ABCD", "ABCDEFG", "QRSTUVWX", "1234"];
        let engine = engine(CritBitTrie::new(), &patterns, true);
        let filter = engine.filter().unwrap();
        for p in patterns {
            assert!(filter.admits(p.as_bytes()));
        }
    }

    #[test]
    fn test_builder_counts_rejections() {
        let mut builder = EngineBuilder::new(CritBitTrie::new(), ScanLimits::default(), true);
        let stats = builder.load_lines(["ABC", "ABCD", "ABCD", "A234567890123456789012", "AB\0D", "abcd"]);
        assert_eq!(stats.accepted, 3);
        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.too_long, 1);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.unmatchable, 1);

        let engine = builder.build();
        assert_eq!(engine.dictionary().len(), 2);
        assert!(!engine.dictionary().contains(b"ABC"));
        assert_eq!(engine.load_stats().accepted, 3);
    }

    #[test]
    fn test_filter_disabled_for_short_min_len() {
        let limits = ScanLimits::new(20, 2, 20).unwrap();
        let mut builder = EngineBuilder::new(CritBitTrie::new(), limits, true);
        builder.load_lines(["AB"]);
        let engine = builder.build();
        assert!(engine.filter().is_none());

        let mut ledger = MatchLedger::new();
        engine.evaluate(b"ABCD", &mut ledger);
        assert_eq!(ledger.count(b"AB"), 1);
    }

    #[test]
    fn test_load_reader() {
        let mut builder = EngineBuilder::new(WideTrie::new(), ScanLimits::default(), false);
        let stats = builder
            .load_reader(io::Cursor::new(b"HELLO\r\nWORLD\nNO\n".to_vec()))
            .unwrap();
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.too_short, 1);
        assert!(builder.build().dictionary().contains(b"WORLD"));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn test_load_reader_failure_is_fatal() {
        let mut builder = EngineBuilder::new(CritBitTrie::new(), ScanLimits::default(), true);
        let err = builder.load_reader(io::BufReader::new(FailingReader)).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
