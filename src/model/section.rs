//! Transient types produced while splitting a notebook into pages.

use super::notebook::Cell;

/// A run of cells that becomes one output page.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub cells: Vec<Cell>,
    /// Front-matter block declared right after the page break marker,
    /// delimiters included.
    pub metadata_block: Option<String>,
}

/// Chapter-level front-matter and the cell it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    pub text: String,
    /// Index of the consumed directive cell, `None` when the default block
    /// was substituted.
    pub source_cell: Option<usize>,
}

impl Section {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata_block: None,
        }
    }

    pub fn with_metadata_block(mut self, block: impl Into<String>) -> Self {
        self.metadata_block = Some(block.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
