use std::path::PathBuf;

/// Failures raised by the tree and search suppliers.
#[derive(Debug, thiserror::Error)]
pub enum SupplyError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed search query: {0}")]
    MalformedQuery(String),
    #[error("search worker is no longer running")]
    WorkerGone,
}

/// Failures raised while loading the optional TOML configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid color '{value}' for theme.{key}")]
    InvalidColor { key: &'static str, value: String },
}
