use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("converter file '{}' not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read converter file '{}': {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LabError {
    #[error("line {line}: expected `<start> <end> <label>`, got `{content}`")]
    Parse { line: usize, content: String },
}

#[derive(Debug, Error)]
pub enum TextGridError {
    #[error("failed to read TextGrid: {0}")]
    Io(#[from] std::io::Error),
    #[error("TextGrid is neither UTF-8 nor UTF-16: {0}")]
    Encoding(String),
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl TextGridError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}
