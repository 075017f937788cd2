//! Converting every notebook under a project root.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::NOTEBOOK_EXTENSION;
use crate::error::{Error, Result};
use crate::markdown::RenderEngine;

use super::assemble::Converter;

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub files_created: usize,
    pub elapsed: Duration,
    /// Notebooks that failed, with the error message.
    pub failures: Vec<(PathBuf, String)>,
}

/// Every notebook below `root`, sorted by path.
///
/// Hidden files and directories (such as `.ipynb_checkpoints`) are skipped.
pub fn find_notebooks(root: &Path) -> Vec<PathBuf> {
    let mut notebooks: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == NOTEBOOK_EXTENSION)
        })
        .collect();
    notebooks.sort();
    notebooks
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

impl<E: RenderEngine> Converter<E> {
    /// Convert every notebook under `root`.
    ///
    /// A failing notebook is logged and counted; the run continues with the
    /// next one.
    pub fn convert_all(&self, root: &Path) -> Result<BatchStats> {
        if !root.is_dir() {
            return Err(Error::MissingInput(root.to_path_buf()));
        }

        let start = Instant::now();
        let notebooks = find_notebooks(root);
        info!(root = %root.display(), count = notebooks.len(), "found notebooks");

        let mut stats = BatchStats {
            total: notebooks.len(),
            ..BatchStats::default()
        };

        for path in notebooks {
            match self.convert(&path, root) {
                Ok(conversion) => {
                    stats.success += 1;
                    stats.files_created += conversion.outputs.len();
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "conversion failed");
                    stats.failed += 1;
                    stats.failures.push((path, e.to_string()));
                }
            }
        }

        stats.elapsed = start.elapsed();
        info!(
            total = stats.total,
            success = stats.success,
            failed = stats.failed,
            files = stats.files_created,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "batch complete"
        );
        Ok(stats)
    }
}
