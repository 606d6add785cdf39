use thiserror::Error;

/// Unified error type for the exporter.
///
/// Alignment mismatches during incremental sync are deliberately *not* part
/// of this taxonomy: a misaligned window is a planner decision (skip, retry
/// next cycle), not a failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication rejected by the provider (no session cookie).
    #[error("login rejected: {0}")]
    Login(String),

    /// The raw payload carried an error or unrecognized status.
    #[error("server reported an error state: {0}")]
    ServerState(String),

    /// Malformed dates, timesheet rules, or payload fields.
    #[error("parse error: {0}")]
    Parse(String),

    /// HTTP transport failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// State/config/CSV file failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing required configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The sink rejected the write.
    #[error("export failed: {0}")]
    Export(String),
}

impl Error {
    /// Process exit code for the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => 2,
            Error::Login(_) => 3,
            Error::ServerState(_) | Error::Http(_) => 4,
            Error::Export(_) | Error::Io(_) => 5,
            Error::Parse(_) => 6,
        }
    }
}
