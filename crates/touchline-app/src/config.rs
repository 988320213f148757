//! Runtime configuration.

use std::path::PathBuf;

use touchline_client::ClientConfig;

/// Directory summary files are written to by default.
pub const DEFAULT_SUMMARY_DIR: &str = "data";

/// Read buffer size for the broker connection.
pub const DEFAULT_READ_BUFFER: usize = 4096;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Protocol settings handed to the client
    pub client: ClientConfig,
    /// Directory for `summary` output files
    pub summary_dir: PathBuf,
    /// Bytes read from the broker per call
    pub read_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            summary_dir: PathBuf::from(DEFAULT_SUMMARY_DIR),
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }
}
