//! CLI error types.

use std::path::PathBuf;

use h2f_config::ConfigError;
use h2f_renderer::ConvertError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{}: {source}", .path.display())]
    Convert {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },

    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0}")]
    Validation(String),
}
