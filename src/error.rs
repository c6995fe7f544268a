use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Route registry unavailable: {0}")]
    Registry(String),

    #[error("Invalid namespace selection: {0}")]
    InvalidSelection(String),

    #[error("Capability source error ({callable}): {message}")]
    Source { callable: String, message: String },

    #[error("Route analysis failed for {route}: {message}")]
    Route { route: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScanError {
    pub fn exit_code(&self) -> i32 {
        2
    }

    /// Whether the analyzer recovers from this error locally instead of
    /// failing the whole call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Source { .. } | Self::Route { .. })
    }
}
