//! Error types for configuration loading and materialization.

/// All fatal errors the configuration layer can produce.
///
/// Malformed top-level documents, unknown keys, and cookie parse failures
/// are *not* represented here — they are recovered locally (empty/default
/// plus a warning) and surfaced through [`super::Materialized`] diagnostics.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No file resolved at any of the three lookup tiers.
    #[error("no {0} file found at any location")]
    NotFound(&'static str),

    /// File extension is not one of the supported formats.
    #[error("unsupported config file extension: {0}")]
    UnsupportedFormat(String),

    /// A `sites.<name>` block exists but is not a mapping.
    #[error("expected a table for site config '{site}', got {found}")]
    InvalidSiteBlock { site: String, found: &'static str },

    /// Requested account does not exist for the site.
    #[error("no account '{user}' for site '{site}'")]
    UnknownAccount { site: String, user: String },

    /// Attribute lookup on a site config missed both the fixed fields
    /// and the extension map.
    #[error("site config has no attribute '{0}'")]
    UnknownAttribute(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
