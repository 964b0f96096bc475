use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors from the upstream market API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Page 1 could not be fetched, so the page count is unknown and the
    /// region cannot be scanned at all.
    #[error("first page failed for region {region_id}: {reason}")]
    FirstPageFailed { region_id: u32, reason: String },

    #[error("region directory unavailable: {0}")]
    RegionDirectory(String),

    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },
}

/// Errors from the versioned content store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store returned status {status} for {path}")]
    Status { status: u16, path: String },

    /// The write precondition (previously read version) no longer matched,
    /// meaning another writer updated the path since we read it.
    #[error("write conflict on {path}: expected version {expected}")]
    Conflict { path: String, expected: String },

    #[error("malformed store response for {path}: {reason}")]
    Malformed { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
