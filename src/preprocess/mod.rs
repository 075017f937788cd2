//! Preprocessing stages applied to a notebook before rendering.
//!
//! Provides the `Preprocessor` trait and the three stages every emitted
//! document passes through, in this order:
//!
//! 1. [`HideCells`] drops cells marked hidden
//! 2. [`EscapeCells`] neutralizes fences, HTML and notebook links
//! 3. [`ExtractMedia`] moves embedded media into the asset store
//!
//! Stages take the notebook by value and return the transformed copy. The
//! only state they share is the [`ConversionContext`].

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ConvertConfig;
use crate::error::Result;
use crate::model::Notebook;

mod escape;
mod filter;
mod media;

pub use escape::{EscapeCells, escape_cell};
pub use filter::{HideCells, is_hidden};
pub use media::{
    ExtractMedia, HASH_PREFIX_LEN, asset_file_name, decode_base64, extension_for_mime,
    extract_cell_media, store_asset,
};

/// A single named transformation of a notebook.
pub trait Preprocessor {
    /// Stage name, used in diagnostics.
    fn name(&self) -> &'static str;

    fn preprocess(&self, notebook: Notebook, ctx: &ConversionContext<'_>) -> Result<Notebook>;
}

/// Per-document state threaded through the stages.
#[derive(Debug, Clone)]
pub struct ConversionContext<'a> {
    /// Root of the asset store (`<root>/_intermediate/static/img` by default).
    pub asset_root: PathBuf,
    /// Source notebook file stem; names the asset subdirectory.
    pub document_name: String,
    /// Directory local image paths are resolved against.
    pub source_dir: Option<PathBuf>,
    pub config: &'a ConvertConfig,
}

impl<'a> ConversionContext<'a> {
    pub fn new(
        asset_root: impl Into<PathBuf>,
        document_name: impl Into<String>,
        config: &'a ConvertConfig,
    ) -> Self {
        Self {
            asset_root: asset_root.into(),
            document_name: document_name.into(),
            source_dir: None,
            config,
        }
    }

    pub fn with_source_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.source_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// `<asset_root>/notebooks/<document_name>`.
    pub fn asset_dir(&self) -> PathBuf {
        self.asset_root.join("notebooks").join(&self.document_name)
    }
}

/// The fixed stage list, in execution order.
pub fn default_stages() -> [&'static dyn Preprocessor; 3] {
    [&HideCells, &EscapeCells, &ExtractMedia]
}

/// Run `stages` over `notebook` in order.
pub fn run_stages(
    mut notebook: Notebook,
    stages: &[&dyn Preprocessor],
    ctx: &ConversionContext<'_>,
) -> Result<Notebook> {
    for stage in stages {
        notebook = stage.preprocess(notebook, ctx)?;
        debug!(stage = stage.name(), cells = notebook.cells.len(), "preprocessed");
    }
    Ok(notebook)
}

/// MIME types whose payloads are binary media destined for the asset store.
pub fn is_media_mime(mime: &str) -> bool {
    mime.starts_with("image/") || mime.starts_with("video/")
}
