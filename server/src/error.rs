//! Typed errors at the crate's external boundaries (startup I/O, config
//! loading, board loading). Per-message failures inside the connection
//! handlers are not funneled through this enum — those are recovered
//! locally and turned into an `ERROR` reply (spec.md §7).

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read board file {path}: {source}")]
    BoardRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse board file {path}: {source}")]
    BoardParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
