use std::path::PathBuf;

use thiserror::Error;

/// tablegen errors
#[derive(Error, Debug)]
pub enum TablegenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Connection(String),

    #[error("Failed to query metadata in '{scope}': {message}")]
    Query { scope: String, message: String },

    #[error("Failed to prepare column query for '{scope}': {message}")]
    Prepare { scope: String, message: String },

    #[error("Code generation failed for table '{table}': {message}")]
    CodeGen { table: String, message: String },

    #[error("Failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
