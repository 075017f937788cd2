//! Cell filter: drops cells the author marked as hidden.

use crate::error::Result;
use crate::model::{Cell, CellKind, Notebook};

use super::{ConversionContext, Preprocessor};

/// Removes hidden cells, preserving the order of the rest.
///
/// - code cells with `hide_input` or `hide` set
/// - markdown cells with `hide` set
///
/// Raw cells are never removed here.
#[derive(Debug, Clone, Copy, Default)]
pub struct HideCells;

impl Preprocessor for HideCells {
    fn name(&self) -> &'static str {
        "hide-cells"
    }

    fn preprocess(&self, mut notebook: Notebook, _ctx: &ConversionContext<'_>) -> Result<Notebook> {
        notebook.cells.retain(|cell| !is_hidden(cell));
        Ok(notebook)
    }
}

/// Whether a cell is excluded from rendered output by its metadata.
pub fn is_hidden(cell: &Cell) -> bool {
    match cell.kind {
        CellKind::Code => cell.metadata.hide_input || cell.metadata.hide,
        CellKind::Markdown => cell.metadata.hide,
        CellKind::Raw => false,
    }
}
