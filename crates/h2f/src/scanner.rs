//! Input discovery.
//!
//! Named files are always converted. Directories are walked recursively,
//! skipping hidden entries and keeping only template extensions.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CliError;

/// Extensions of files picked up from directories.
const TEMPLATE_EXTENSIONS: &[&str] = &["erb", "rhtml", "html", "htm"];

/// Argument naming standard input.
pub(crate) const STDIN_ARG: &str = "-";

/// One template to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// Name shown in reports.
    pub(crate) fn display_name(&self) -> String {
        match self {
            Self::Stdin => STDIN_ARG.to_owned(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Expand command-line arguments into inputs, in argument order.
///
/// Files found in one directory are sorted by path.
pub(crate) fn collect_inputs(args: &[String]) -> Result<Vec<Input>, CliError> {
    let mut inputs = Vec::new();
    let mut stdin_seen = false;

    for arg in args {
        if arg == STDIN_ARG {
            if stdin_seen {
                return Err(CliError::Validation(
                    "standard input can only be converted once".to_owned(),
                ));
            }
            stdin_seen = true;
            inputs.push(Input::Stdin);
            continue;
        }

        let path = PathBuf::from(arg);
        if path.is_dir() {
            let mut files = Vec::new();
            scan_directory(&path, &mut files);
            files.sort();
            tracing::debug!(dir = %path.display(), count = files.len(), "Scanned directory");
            inputs.extend(files.into_iter().map(Input::File));
        } else if path.is_file() {
            inputs.push(Input::File(path));
        } else {
            return Err(CliError::NotFound(path));
        }
    }

    Ok(inputs)
}

fn scan_directory(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "Cannot read directory");
        return;
    };

    for entry in entries.filter_map(Result::ok) {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            scan_directory(&path, files);
        } else if is_template(&path) {
            files.push(path);
        }
    }
}

fn is_template(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
