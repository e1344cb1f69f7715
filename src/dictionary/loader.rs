//! Dictionary ingestion
//!
//! The dictionary source is line oriented: one pattern per line, expected
//! to be uppercase already (only the live window is canonicalized). Lines
//! are byte strings and need not be UTF-8. A trailing `\r` is stripped so
//! CRLF files load the same as LF files.
//!
//! Rejected lines are counted, never fatal. Only an unreadable source
//! stops the load.

use std::io::BufRead;

use serde::Serialize;

use crate::config::ScanLimits;
use crate::streaming::is_canonical;

/// How a single dictionary line is handled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineClass {
    /// Stored. `unmatchable` is set when the line holds a byte the
    /// normalizer never emits (lowercase, punctuation), so it can never match.
    Accept { unmatchable: bool },
    /// Shorter than the minimum pattern length
    TooShort,
    /// Longer than the maximum pattern length
    TooLong,
    /// Contains NUL, which neither trie can store
    Invalid,
}

/// Classify one line against the configured length bounds
pub fn classify_line(line: &[u8], limits: &ScanLimits) -> LineClass {
    if !limits.admits_len(line.len()) {
        if line.len() > limits.max_len() {
            LineClass::TooLong
        } else {
            LineClass::TooShort
        }
    } else if line.contains(&0) {
        LineClass::Invalid
    } else {
        LineClass::Accept {
            unmatchable: !line.iter().all(|&b| is_canonical(b)),
        }
    }
}

/// Per-load counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Lines inserted (duplicates included)
    pub accepted: u64,
    pub too_short: u64,
    pub too_long: u64,
    pub invalid: u64,
    /// Accepted lines that can never match
    pub unmatchable: u64,
}

impl LoadStats {
    pub fn record(&mut self, class: LineClass) {
        match class {
            LineClass::Accept { unmatchable } => {
                self.accepted += 1;
                if unmatchable {
                    self.unmatchable += 1;
                }
            }
            LineClass::TooShort => self.too_short += 1,
            LineClass::TooLong => self.too_long += 1,
            LineClass::Invalid => self.invalid += 1,
        }
    }

    /// Lines seen in total
    pub fn lines(&self) -> u64 {
        self.accepted + self.too_short + self.too_long + self.invalid
    }

    /// Lines that were not stored
    pub fn skipped(&self) -> u64 {
        self.too_short + self.too_long + self.invalid
    }
}

/// Call `f` for each line of `reader`, without the line terminator
pub fn for_each_line<R, F>(reader: R, mut f: F) -> Result<(), LoadError>
where
    R: BufRead,
    F: FnMut(&[u8]),
{
    for line in reader.split(b'\n') {
        let line = line?;
        f(line.strip_suffix(b"\r").unwrap_or(&line));
    }
    Ok(())
}

/// Dictionary loading errors
#[derive(Debug)]
pub enum LoadError {
    /// The dictionary source could not be opened or read
    Io(std::io::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "Dictionary unreadable: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_classify_bounds() {
        let limits = ScanLimits::default();
        assert_eq!(classify_line(b"ABC", &limits), LineClass::TooShort);
        assert_eq!(classify_line(b"", &limits), LineClass::TooShort);
        assert_eq!(
            classify_line(b"ABCD", &limits),
            LineClass::Accept { unmatchable: false }
        );
        assert_eq!(
            classify_line(&[b'A'; 20], &limits),
            LineClass::Accept { unmatchable: false }
        );
        assert_eq!(classify_line(&[b'A'; 21], &limits), LineClass::TooLong);
    }

    #[test]
    fn test_classify_custom_bounds() {
        let limits = ScanLimits::new(8, 2, 6).unwrap();
        assert_eq!(classify_line(b"A", &limits), LineClass::TooShort);
        assert_eq!(
            classify_line(b"AB", &limits),
            LineClass::Accept { unmatchable: false }
        );
        assert_eq!(
            classify_line(b"ABCDEF", &limits),
            LineClass::Accept { unmatchable: false }
        );
        assert_eq!(classify_line(b"ABCDEFG", &limits), LineClass::TooLong);
    }

    #[test]
    fn test_classify_invalid_and_unmatchable() {
        let limits = ScanLimits::default();
        assert_eq!(classify_line(b"AB\0D", &limits), LineClass::Invalid);
        assert_eq!(
            classify_line(b"abcd", &limits),
            LineClass::Accept { unmatchable: true }
        );
        assert_eq!(
            classify_line(b"AB-CD", &limits),
            LineClass::Accept { unmatchable: true }
        );
    }

    #[test]
    fn test_stats_record() {
        let mut stats = LoadStats::default();
        stats.record(LineClass::Accept { unmatchable: false });
        stats.record(LineClass::Accept { unmatchable: true });
        stats.record(LineClass::TooShort);
        stats.record(LineClass::TooLong);
        stats.record(LineClass::Invalid);

        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.unmatchable, 1);
        assert_eq!(stats.lines(), 5);
        assert_eq!(stats.skipped(), 3);
    }

    #[test]
    fn test_for_each_line_strips_terminators() {
        let source = Cursor::new(b"ABCD\r\nWXYZ\nLAST".to_vec());
        let mut lines = vec![];
        for_each_line(source, |line| lines.push(line.to_vec())).unwrap();
        assert_eq!(lines, vec![b"ABCD".to_vec(), b"WXYZ".to_vec(), b"LAST".to_vec()]);
    }

    #[test]
    fn test_for_each_line_non_utf8() {
        let source = Cursor::new(vec![0xff, 0xfe, 0x41, 0x42, b'\n']);
        let mut lines = vec![];
        for_each_line(source, |line| lines.push(line.to_vec())).unwrap();
        assert_eq!(lines, vec![vec![0xff, 0xfe, 0x41, 0x42]]);
    }
}
