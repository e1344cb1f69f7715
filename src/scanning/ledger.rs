//! Match ledger and final report
//!
//! The ledger maps each matched pattern to its occurrence count. A key is
//! created on its first match, so no entry ever holds zero. Stream scanners
//! keep one ledger each and the session merges them at finalization.

use std::collections::HashMap;
use std::io::{self, Write};

use serde::{Serialize, Serializer};

/// Occurrence counts keyed by matched pattern
#[derive(Clone, Debug, Default)]
pub struct MatchLedger {
    counts: HashMap<Box<[u8]>, u64>,
}

impl MatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `pattern`
    #[inline]
    pub fn record(&mut self, pattern: &[u8]) {
        self.add(pattern, 1);
    }

    fn add(&mut self, pattern: &[u8], count: u64) {
        match self.counts.get_mut(pattern) {
            Some(existing) => *existing += count,
            None => {
                self.counts.insert(pattern.into(), count);
            }
        }
    }

    /// Occurrences of `pattern` so far
    pub fn count(&self, pattern: &[u8]) -> u64 {
        self.counts.get(pattern).copied().unwrap_or(0)
    }

    /// Distinct patterns matched
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all occurrence counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Fold another ledger's counts into this one
    pub fn merge(&mut self, other: MatchLedger) {
        if self.counts.is_empty() {
            self.counts = other.counts;
            return;
        }
        for (pattern, count) in other.counts {
            self.add(&pattern, count);
        }
    }

    /// Consume the ledger into a report sorted by pattern
    pub fn into_report(self) -> Report {
        let mut entries: Vec<MatchCount> = self
            .counts
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .map(|(pattern, count)| MatchCount { pattern, count })
            .collect();
        entries.sort_unstable_by(|a, b| a.pattern.cmp(&b.pattern));
        Report { entries }
    }
}

/// One report line
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchCount {
    /// Matched pattern, exactly as stored. The JSON view replaces bytes that
    /// are not UTF-8 with U+FFFD.
    #[serde(serialize_with = "serialize_lossy")]
    pub pattern: Box<[u8]>,
    pub count: u64,
}

impl MatchCount {
    /// Pattern as text, lossy for non-UTF-8 bytes
    pub fn pattern_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.pattern)
    }
}

fn serialize_lossy<P, S>(pattern: &P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(pattern.as_ref()))
}

/// Final list of matched patterns with nonzero counts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    entries: Vec<MatchCount>,
}

impl Report {
    pub fn entries(&self) -> &[MatchCount] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count for `pattern`, zero if it never matched
    pub fn count(&self, pattern: &[u8]) -> u64 {
        self.entries
            .binary_search_by(|entry| entry.pattern[..].cmp(pattern))
            .map(|i| self.entries[i].count)
            .unwrap_or(0)
    }

    /// Sum of all occurrence counts
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Write `pattern count` lines, patterns as raw bytes
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for entry in &self.entries {
            out.write_all(&entry.pattern)?;
            writeln!(out, " {}", entry.count)?;
        }
        out.flush()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_count() {
        let mut ledger = MatchLedger::new();
        assert_eq!(ledger.count(b"ABCD"), 0);
        ledger.record(b"ABCD");
        ledger.record(b"ABCD");
        ledger.record(b"WXYZ");

        assert_eq!(ledger.count(b"ABCD"), 2);
        assert_eq!(ledger.count(b"WXYZ"), 1);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.total(), 3);
    }

    #[test]
    fn test_merge() {
        let mut reads = MatchLedger::new();
        reads.record(b"ABCD");
        let mut writes = MatchLedger::new();
        writes.record(b"ABCD");
        writes.record(b"WXYZ");

        let mut merged = MatchLedger::new();
        merged.merge(reads);
        merged.merge(writes);
        assert_eq!(merged.count(b"ABCD"), 2);
        assert_eq!(merged.count(b"WXYZ"), 1);
    }

    #[test]
    fn test_report_sorted_without_zero_counts() {
        let mut ledger = MatchLedger::new();
        ledger.record(b"ZULU");
        ledger.record(b"ALFA");
        ledger.record(b"ALFA");

        let report = ledger.into_report();
        let patterns: Vec<&[u8]> = report.entries().iter().map(|e| &e.pattern[..]).collect();
        assert_eq!(patterns, vec![&b"ALFA"[..], &b"ZULU"[..]]);
        assert!(report.entries().iter().all(|e| e.count > 0));
        assert_eq!(report.count(b"ALFA"), 2);
        assert_eq!(report.count(b"MIKE"), 0);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_empty_report() {
        let report = MatchLedger::new().into_report();
        assert!(report.is_empty());

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_report_lines() {
        let mut ledger = MatchLedger::new();
        ledger.record(b"WXYZ");
        ledger.record(b"ABCD");
        ledger.record(b"ABCD");

        let mut out = Vec::new();
        ledger.into_report().write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ABCD 2\nWXYZ 1\n");
    }

    #[test]
    fn test_non_utf8_patterns_stay_distinct() {
        let mut ledger = MatchLedger::new();
        ledger.record(b"CAF\xe9");
        ledger.record(b"CAF\xe8");
        ledger.record(b"CAF\xe8");

        let report = ledger.into_report();
        assert_eq!(report.len(), 2);
        assert_eq!(report.count(b"CAF\xe9"), 1);
        assert_eq!(report.count(b"CAF\xe8"), 2);
        assert_eq!(report.entries()[0].pattern_lossy(), "CAF\u{fffd}");

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        assert_eq!(out, b"CAF\xe8 2\nCAF\xe9 1\n");

        // JSON needs text, so only that view is lossy
        let json = report.to_json().unwrap();
        assert_eq!(json.matches("CAF\u{fffd}").count(), 2);
    }

    #[test]
    fn test_report_json() {
        let mut ledger = MatchLedger::new();
        ledger.record(b"ABCD");
        let json = ledger.into_report().to_json().unwrap();
        assert_eq!(json, r#"{"entries":[{"pattern":"ABCD","count":1}]}"#);
    }
}
