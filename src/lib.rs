//! Streaming multi-pattern string search over memory traffic
//!
//! The host observes guest memory reads and writes and hands each accessed
//! chunk to [`StringSearchPlugin`]. Bytes are normalized (NUL and ASCII
//! punctuation dropped, lowercase folded) into a small circular window per
//! stream, and each window is matched against a dictionary of patterns loaded
//! once at startup. Occurrence counts are reported when the scan finalizes.
//!
//! Lifecycle:
//! 1. [`StringSearchPlugin::open`] with a [`ScannerConfig`] and a dictionary
//!    path builds the engine
//! 2. [`StringSearchPlugin::on_mem_read`] / [`StringSearchPlugin::on_mem_write`]
//!    for every observed access
//! 3. [`StringSearchPlugin::finalize`] and [`StringSearchPlugin::write_report`]

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use log::{debug, info};

pub mod config;
pub mod dictionary;
pub mod scanning;
pub mod streaming;
pub mod telemetry;

pub use config::{ConfigError, EvaluationMode, Representation, ScanLimits, ScannerConfig};
pub use dictionary::{CritBitTrie, LoadError, LoadStats, PatternDictionary, WideTrie};
pub use scanning::{MatchCount, Report, ScanStats, StreamId};

use scanning::{EngineBuilder, ScanSession, SessionOptions};

/// A scan over one of the two dictionary representations
enum Session {
    CritBit(ScanSession<CritBitTrie>),
    Wide(ScanSession<WideTrie>),
}

impl Session {
    fn build<D: PatternDictionary, R: BufRead>(
        dictionary: D,
        config: &ScannerConfig,
        reader: R,
    ) -> Result<ScanSession<D>, PluginError> {
        let mut builder = EngineBuilder::new(dictionary, config.limits()?, config.prefix_filter);
        builder.load_reader(reader)?;
        Ok(ScanSession::new(builder.build(), SessionOptions::from(config)))
    }

    fn on_bytes(&mut self, stream: StreamId, bytes: &[u8]) {
        match self {
            Session::CritBit(session) => session.on_bytes(stream, bytes),
            Session::Wide(session) => session.on_bytes(stream, bytes),
        }
    }

    fn finalize(&mut self) -> &Report {
        match self {
            Session::CritBit(session) => session.finalize(),
            Session::Wide(session) => session.finalize(),
        }
    }

    fn is_finalized(&self) -> bool {
        match self {
            Session::CritBit(session) => session.is_finalized(),
            Session::Wide(session) => session.is_finalized(),
        }
    }

    fn stats(&self) -> ScanStats {
        match self {
            Session::CritBit(session) => session.stats(),
            Session::Wide(session) => session.stats(),
        }
    }

    fn load_stats(&self) -> LoadStats {
        match self {
            Session::CritBit(session) => session.engine().load_stats(),
            Session::Wide(session) => session.engine().load_stats(),
        }
    }

    fn patterns(&self) -> usize {
        match self {
            Session::CritBit(session) => session.engine().dictionary().len(),
            Session::Wide(session) => session.engine().dictionary().len(),
        }
    }
}

/// Host-facing string search plugin
pub struct StringSearchPlugin {
    config: ScannerConfig,
    session: Session,
}

impl StringSearchPlugin {
    /// Build the dictionary from a line-oriented reader
    pub fn new<R: BufRead>(config: ScannerConfig, reader: R) -> Result<Self, PluginError> {
        config.validate()?;
        let session = match config.representation {
            Representation::CritBit => {
                Session::CritBit(Session::build(CritBitTrie::new(), &config, reader)?)
            }
            Representation::Wide => Session::Wide(Session::build(WideTrie::new(), &config, reader)?),
        };

        info!(
            "String search initialized: {:?} dictionary, window {}, patterns {}..={} bytes",
            config.representation, config.window_size, config.min_len, config.max_len
        );
        Ok(Self { config, session })
    }

    /// Build the dictionary from a file. A missing or unreadable file is fatal.
    pub fn open<P: AsRef<Path>>(config: ScannerConfig, path: P) -> Result<Self, PluginError> {
        let path = path.as_ref();
        debug!("Loading dictionary from {}", path.display());
        let file = File::open(path).map_err(LoadError::Io)?;
        Self::new(config, BufReader::new(file))
    }

    /// Parse a JSON configuration, then build from `reader`
    pub fn from_config_bytes<R: BufRead>(config: &[u8], reader: R) -> Result<Self, PluginError> {
        Self::new(ScannerConfig::from_bytes(config)?, reader)
    }

    /// Memory read observed by the host
    pub fn on_mem_read(&mut self, bytes: &[u8]) {
        self.session.on_bytes(StreamId::Read, bytes);
    }

    /// Memory write observed by the host
    pub fn on_mem_write(&mut self, bytes: &[u8]) {
        self.session.on_bytes(StreamId::Write, bytes);
    }

    pub fn on_bytes(&mut self, stream: StreamId, bytes: &[u8]) {
        self.session.on_bytes(stream, bytes);
    }

    /// Stop scanning and return the match counts. Repeated calls return the
    /// same report.
    pub fn finalize(&mut self) -> &Report {
        self.session.finalize()
    }

    pub fn is_finalized(&self) -> bool {
        self.session.is_finalized()
    }

    /// Finalize if needed and write `pattern count` lines to `out`
    pub fn write_report<W: Write>(&mut self, out: W) -> Result<(), PluginError> {
        let report = self.session.finalize();
        report.write_to(out).map_err(PluginError::Report)?;
        telemetry::report_written(report.len(), report.total()).emit();
        Ok(())
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn load_stats(&self) -> LoadStats {
        self.session.load_stats()
    }

    /// Distinct patterns in the dictionary
    pub fn patterns(&self) -> usize {
        self.session.patterns()
    }

    /// Scan counters over both streams
    pub fn stats(&self) -> ScanStats {
        self.session.stats()
    }
}

/// Fatal plugin errors
#[derive(Debug)]
pub enum PluginError {
    Config(ConfigError),
    Load(LoadError),
    Report(io::Error),
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginError::Config(e) => write!(f, "Configuration error: {}", e),
            PluginError::Load(e) => write!(f, "Dictionary load failed: {}", e),
            PluginError::Report(e) => write!(f, "Report write failed: {}", e),
        }
    }
}

impl std::error::Error for PluginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PluginError::Config(e) => Some(e),
            PluginError::Load(e) => Some(e),
            PluginError::Report(e) => Some(e),
        }
    }
}

impl From<ConfigError> for PluginError {
    fn from(e: ConfigError) -> Self {
        PluginError::Config(e)
    }
}

impl From<LoadError> for PluginError {
    fn from(e: LoadError) -> Self {
        PluginError::Load(e)
    }
}
