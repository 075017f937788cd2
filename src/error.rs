//! Error types for nbdocs operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading, converting or writing a notebook.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notebook does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Invalid notebook: {0}")]
    InvalidNotebook(String),

    #[error("Failed to render section {section}: {message}")]
    SectionRender { section: usize, message: String },

    #[error("Malformed media: {0}")]
    MalformedMedia(String),

    #[error("Ambiguous pagebreak marker in cell {cell}: {reason}")]
    AmbiguousMarker { cell: usize, reason: String },

    #[error("Render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
