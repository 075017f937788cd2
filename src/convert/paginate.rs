//! Splitting a notebook into pages at `# !pagebreak` directives.

use tracing::warn;

use crate::config::{FRONTMATTER_DELIMITER, PAGEBREAK_MARKER, PaginationMode};
use crate::error::{Error, Result};
use crate::model::{Cell, Notebook, Section};

/// Whether the notebook contains at least one pagebreak directive.
pub fn has_pagebreaks(notebook: &Notebook) -> bool {
    notebook.find_directive(PAGEBREAK_MARKER).is_some()
}

/// Cells between the chapter cell (or the start) and the first pagebreak.
///
/// Cells above the chapter cell are not part of the index. A chapter cell
/// placed after the first pagebreak leaves the index empty.
pub fn index_cells(notebook: &Notebook, chapter_cell: Option<usize>) -> Vec<Cell> {
    let start = chapter_cell.map_or(0, |index| index + 1);
    let end = notebook
        .find_directive(PAGEBREAK_MARKER)
        .unwrap_or(notebook.cells.len());
    collect_cells(notebook, start, end, chapter_cell)
}

/// Split the notebook into sections, one per pagebreak directive.
///
/// Each section runs from its directive cell up to the next one (or the end
/// of the notebook). A front-matter block right after the marker becomes the
/// section metadata; any remaining text in the directive cell is kept as a
/// leading raw cell. The chapter cell never lands in a section, and sections
/// that end up without cells are dropped.
///
/// In [`PaginationMode::Strict`] a marker that is not at the start of its
/// cell, or that appears twice in one cell, is an error.
pub fn split_sections(
    notebook: &Notebook,
    chapter_cell: Option<usize>,
    mode: PaginationMode,
) -> Result<Vec<Section>> {
    let markers = notebook.directive_indices(PAGEBREAK_MARKER);
    let mut sections = Vec::with_capacity(markers.len());

    for (n, &marker) in markers.iter().enumerate() {
        let source = &notebook.cells[marker].source;
        check_marker_placement(marker, source, mode)?;

        let (block, leading) = split_marker_content(source);
        let mut cells = Vec::new();
        if let Some(text) = leading {
            cells.push(Cell::raw(text));
        }
        let end = markers.get(n + 1).copied().unwrap_or(notebook.cells.len());
        cells.extend(collect_cells(notebook, marker + 1, end, chapter_cell));

        let section = Section::new(cells);
        if section.is_empty() {
            warn!(cell = marker, "pagebreak section has no content, skipping");
            continue;
        }
        sections.push(match block {
            Some(block) => section.with_metadata_block(block),
            None => section,
        });
    }

    Ok(sections)
}

/// Split a directive cell into its front-matter block and leftover text.
///
/// The block starts right after the marker with a delimiter line and ends at
/// the next line that starts with the delimiter.
pub fn split_marker_content(source: &str) -> (Option<String>, Option<String>) {
    let after = source
        .split_once(PAGEBREAK_MARKER)
        .map(|(_, after)| after.trim())
        .unwrap_or_default();

    let (block, rest) = match after.strip_prefix(FRONTMATTER_DELIMITER) {
        Some(body) => match body.find(&format!("\n{FRONTMATTER_DELIMITER}")) {
            Some(pos) => {
                let end = FRONTMATTER_DELIMITER.len() + pos + 1 + FRONTMATTER_DELIMITER.len();
                (Some(after[..end].to_string()), after[end..].trim())
            }
            None => (None, after),
        },
        None => (None, after),
    };

    let leading = (!rest.is_empty()).then(|| rest.to_string());
    (block, leading)
}

fn check_marker_placement(cell: usize, source: &str, mode: PaginationMode) -> Result<()> {
    let count = source.matches(PAGEBREAK_MARKER).count();
    let before = source
        .split_once(PAGEBREAK_MARKER)
        .map(|(before, _)| before.trim())
        .unwrap_or_default();

    let reason = if count > 1 {
        format!("marker appears {count} times")
    } else if !before.is_empty() {
        "marker is not at the start of the cell".to_string()
    } else {
        return Ok(());
    };

    match mode {
        PaginationMode::Strict => Err(Error::AmbiguousMarker { cell, reason }),
        PaginationMode::Lenient => {
            warn!(cell, %reason, "ambiguous pagebreak marker");
            Ok(())
        }
    }
}

fn collect_cells(
    notebook: &Notebook,
    start: usize,
    end: usize,
    skip: Option<usize>,
) -> Vec<Cell> {
    (start..end)
        .filter(|&index| Some(index) != skip)
        .map(|index| notebook.cells[index].clone())
        .collect()
}
