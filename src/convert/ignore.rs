//! `.gitignore` bookkeeping for generated documents.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

const IGNORE_FILE: &str = ".gitignore";

/// Add the file name of `generated` to the `.gitignore` next to it.
///
/// The entry is written only when no line of the ignore file already equals
/// it. Returns the ignore file path.
pub fn append_to_ignore_file(generated: &Path) -> Result<PathBuf> {
    let dir = generated.parent().unwrap_or(Path::new("."));
    let entry = generated
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ignore = dir.join(IGNORE_FILE);

    let existing = match fs::read_to_string(&ignore) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    if existing.lines().any(|line| line.trim() == entry) {
        return Ok(ignore);
    }

    let mut file = OpenOptions::new().create(true).append(true).open(&ignore)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{entry}")?;
    debug!(path = %ignore.display(), %entry, "ignore entry added");
    Ok(ignore)
}

/// Create `<dir>/.gitignore` covering every generated page of a chapter.
///
/// An existing file is left alone.
pub fn write_directory_ignore(dir: &Path, extension: &str) -> Result<PathBuf> {
    let ignore = dir.join(IGNORE_FILE);
    if !ignore.exists() {
        fs::write(&ignore, format!("autogen-*.{extension}\nindex.{extension}\n"))?;
        debug!(path = %ignore.display(), "chapter ignore file created");
    }
    Ok(ignore)
}
