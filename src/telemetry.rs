//! Telemetry for the string search engine
//!
//! Scan lifecycle events are serialized to JSON and written through the
//! `log` facade with a fixed tag, so whatever logger the host installs can
//! collect them alongside its own output.

use log::{info, warn};
use serde::Serialize;

use crate::dictionary::LoadStats;
use crate::scanning::ScanStats;

const TAG: &str = "[STRING-SEARCH]";

/// Scan event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanEventType {
    /// Dictionary built and ready for scanning
    DictionaryLoaded,
    /// Some dictionary lines were rejected or can never match
    LinesSkipped,
    /// Scan finalized, ledger drained
    ScanFinalized,
    /// Report written to its sink
    ReportWritten,
}

/// Structured scan event
#[derive(Debug, Clone, Serialize)]
pub struct ScanEvent {
    /// Event type
    pub event_type: ScanEventType,
    /// Dictionary representation in use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
    /// Distinct patterns stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<usize>,
    /// Line counters from the dictionary load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadStats>,
    /// Scan counters, summed over streams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanStats>,
    /// Distinct patterns matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_matches: Option<usize>,
    /// Sum of all occurrence counts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_matches: Option<u64>,
    /// Free-form explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ScanEvent {
    /// Create a new event
    pub fn new(event_type: ScanEventType) -> Self {
        Self {
            event_type,
            representation: None,
            patterns: None,
            load: None,
            scan: None,
            distinct_matches: None,
            total_matches: None,
            reason: None,
        }
    }

    pub fn with_representation(mut self, representation: &str) -> Self {
        self.representation = Some(representation.to_string());
        self
    }

    pub fn with_patterns(mut self, patterns: usize) -> Self {
        self.patterns = Some(patterns);
        self
    }

    pub fn with_load(mut self, load: LoadStats) -> Self {
        self.load = Some(load);
        self
    }

    pub fn with_scan(mut self, scan: ScanStats) -> Self {
        self.scan = Some(scan);
        self
    }

    pub fn with_matches(mut self, distinct: usize, total: u64) -> Self {
        self.distinct_matches = Some(distinct);
        self.total_matches = Some(total);
        self
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// Log the event
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => match self.event_type {
                ScanEventType::LinesSkipped => warn!("{} {}", TAG, json),
                _ => info!("{} {}", TAG, json),
            },
            Err(e) => warn!("Failed to serialize scan event: {}", e),
        }
    }
}

/// Dictionary ready event
pub fn dictionary_loaded(representation: &str, patterns: usize, load: LoadStats) -> ScanEvent {
    ScanEvent::new(ScanEventType::DictionaryLoaded)
        .with_representation(representation)
        .with_patterns(patterns)
        .with_load(load)
}

/// Rejected-lines warning, `None` when every line was stored and matchable
pub fn lines_skipped(load: LoadStats) -> Option<ScanEvent> {
    if load.skipped() == 0 && load.unmatchable == 0 {
        return None;
    }
    Some(
        ScanEvent::new(ScanEventType::LinesSkipped)
            .with_load(load)
            .with_reason("dictionary lines rejected or unmatchable"),
    )
}

/// Finalization event
pub fn scan_finalized(scan: ScanStats, distinct: usize, total: u64) -> ScanEvent {
    ScanEvent::new(ScanEventType::ScanFinalized)
        .with_scan(scan)
        .with_matches(distinct, total)
}

/// Report written event
pub fn report_written(distinct: usize, total: u64) -> ScanEvent {
    ScanEvent::new(ScanEventType::ReportWritten).with_matches(distinct, total)
}
