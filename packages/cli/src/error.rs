use std::path::PathBuf;

/// Errors reported by the `memoires` binary.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] memoires_http::Error),

    #[error(transparent)]
    Catalog(#[from] memoires_catalog::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in --data: {0}")]
    InvalidData(serde_json::Error),

    #[error("{failed} of {total} deletions failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}
