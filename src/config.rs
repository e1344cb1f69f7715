//! Configuration module for the string search engine
//!
//! Configuration arrives as a JSON document from the embedding host.
//! Every field has a default, so an empty object `{}` yields the
//! reference sizing (window 20, patterns of 4..=20 bytes, crit-bit
//! dictionary with the prefix filter enabled).

use serde::Deserialize;

use crate::dictionary::prefix_filter::PREFIX_LEN;

/// Which dictionary representation to build
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Binary crit-bit trie, compact for large dictionaries
    #[default]
    CritBit,
    /// 255-way array trie, simple reference form
    Wide,
}

/// How often the match engine evaluates a stream's window
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// One evaluation per delivered chunk
    #[default]
    PerChunk,
    /// One evaluation per accepted canonical byte
    PerByte,
}

/// Scanner configuration loaded from the host
#[derive(Clone, Debug, Deserialize)]
pub struct ScannerConfig {
    /// Capacity of each stream's circular window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Shortest pattern accepted into the dictionary
    #[serde(default = "default_min_len")]
    pub min_len: usize,

    /// Longest pattern accepted into the dictionary
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Dictionary representation
    #[serde(default)]
    pub representation: Representation,

    /// Whether to reject windows by their first four bytes before descent
    #[serde(default = "default_prefix_filter")]
    pub prefix_filter: bool,

    /// Evaluation granularity
    #[serde(default)]
    pub evaluation: EvaluationMode,

    /// Evaluate never-anchored tail offsets when the scan is finalized
    #[serde(default = "default_flush_on_finalize")]
    pub flush_on_finalize: bool,

    /// Whether to log every evaluation that records hits
    #[serde(default)]
    pub log_matches: bool,
}

fn default_window_size() -> usize {
    20
}

fn default_min_len() -> usize {
    4
}

fn default_max_len() -> usize {
    20
}

fn default_prefix_filter() -> bool {
    true
}

fn default_flush_on_finalize() -> bool {
    true
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            min_len: default_min_len(),
            max_len: default_max_len(),
            representation: Representation::default(),
            prefix_filter: default_prefix_filter(),
            evaluation: EvaluationMode::default(),
            flush_on_finalize: default_flush_on_finalize(),
            log_matches: false,
        }
    }
}

impl ScannerConfig {
    /// Parse configuration from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config_str = std::str::from_utf8(bytes)
            .map_err(|e| ConfigError::InvalidUtf8(e.to_string()))?;

        let config: Self = serde_json::from_str(config_str)
            .map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validated pattern and window sizing
    pub fn limits(&self) -> Result<ScanLimits, ConfigError> {
        ScanLimits::new(self.window_size, self.min_len, self.max_len)
    }

    /// Check the sizing and the filter/length combination
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = self.limits()?;
        if self.prefix_filter && limits.min_len() < PREFIX_LEN {
            return Err(ConfigError::InvalidLimits(format!(
                "prefix_filter needs min_len >= {}, got {}",
                PREFIX_LEN, limits.min_len()
            )));
        }
        Ok(())
    }
}

/// Window and pattern length bounds shared by the loader and the engine.
/// Only [`ScanLimits::new`] and [`Default`] construct one, so the bounds
/// always hold: `1 <= min_len <= max_len <= window_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanLimits {
    window_size: usize,
    min_len: usize,
    max_len: usize,
}

impl ScanLimits {
    pub fn new(window_size: usize, min_len: usize, max_len: usize) -> Result<Self, ConfigError> {
        if min_len == 0 {
            return Err(ConfigError::InvalidLimits("min_len must be at least 1".to_string()));
        }
        if min_len > max_len {
            return Err(ConfigError::InvalidLimits(format!(
                "min_len ({}) exceeds max_len ({})",
                min_len, max_len
            )));
        }
        if max_len > window_size {
            return Err(ConfigError::InvalidLimits(format!(
                "max_len ({}) exceeds window_size ({})",
                max_len, window_size
            )));
        }
        Ok(Self {
            window_size,
            min_len,
            max_len,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Whether a pattern of `len` bytes may be stored
    pub fn admits_len(&self, len: usize) -> bool {
        (self.min_len..=self.max_len).contains(&len)
    }
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            min_len: default_min_len(),
            max_len: default_max_len(),
        }
    }
}

/// Configuration parsing errors
#[derive(Debug)]
pub enum ConfigError {
    InvalidUtf8(String),
    InvalidJson(String),
    InvalidLimits(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidUtf8(e) => write!(f, "Invalid UTF-8: {}", e),
            ConfigError::InvalidJson(e) => write!(f, "Invalid JSON: {}", e),
            ConfigError::InvalidLimits(e) => write!(f, "Invalid limits: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
