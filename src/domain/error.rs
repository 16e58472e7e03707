//! Domain error types.

/// Top-level error type for swingscan.
#[derive(Debug, thiserror::Error)]
pub enum SwingscanError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid scoring profile '{profile}': {reason}")]
    ProfileInvalid { profile: String, reason: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid bar series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("failed to fetch {symbol}: {reason}")]
    Fetch { symbol: String, reason: String },

    #[error("universe '{market}' unavailable: {reason}")]
    UniverseUnavailable { market: String, reason: String },

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SwingscanError {
    /// Errors that skip one instrument instead of aborting a scan.
    pub fn is_per_instrument(&self) -> bool {
        matches!(
            self,
            SwingscanError::InsufficientData { .. }
                | SwingscanError::InvalidSeries { .. }
                | SwingscanError::Fetch { .. }
        )
    }
}

impl From<&SwingscanError> for std::process::ExitCode {
    fn from(err: &SwingscanError) -> Self {
        let code: u8 = match err {
            SwingscanError::Io(_)
            | SwingscanError::WorkerPool { .. }
            | SwingscanError::Report { .. } => 1,
            SwingscanError::ConfigParse { .. }
            | SwingscanError::ConfigMissing { .. }
            | SwingscanError::ConfigInvalid { .. }
            | SwingscanError::ProfileInvalid { .. } => 2,
            SwingscanError::Fetch { .. } | SwingscanError::UniverseUnavailable { .. } => 3,
            SwingscanError::InsufficientData { .. } | SwingscanError::InvalidSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
