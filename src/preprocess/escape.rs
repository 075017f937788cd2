//! Escaping stage: applies the [`crate::markdown`] escapes cell by cell.

use crate::error::Result;
use crate::markdown::{
    escape_backticks, escape_output_text, fix_heading_level, rewrite_notebook_links,
};
use crate::model::{Cell, CellKind, Notebook, Output, Payload};

use super::{ConversionContext, Preprocessor, is_media_mime};

/// Escapes cell sources and outputs so they survive inside an MDX page.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeCells;

impl Preprocessor for EscapeCells {
    fn name(&self) -> &'static str {
        "escape"
    }

    fn preprocess(&self, mut notebook: Notebook, ctx: &ConversionContext<'_>) -> Result<Notebook> {
        let extension = &ctx.config.link_extension;
        notebook.cells = notebook
            .cells
            .into_iter()
            .map(|cell| escape_cell(cell, extension))
            .collect();
        Ok(notebook)
    }
}

/// Escape a single cell.
///
/// - markdown: notebook links are rewritten to `link_extension`, then a
///   doubled leading heading marker is fixed
/// - code: triple backticks in the source are escaped; whitespace-only
///   stream outputs are dropped and the rest escaped
/// - raw: untouched
pub fn escape_cell(mut cell: Cell, link_extension: &str) -> Cell {
    match cell.kind {
        CellKind::Markdown => {
            let linked = rewrite_notebook_links(&cell.source, link_extension);
            cell.source = fix_heading_level(&linked).into_owned();
        }
        CellKind::Code => {
            cell.source = escape_backticks(&cell.source).into_owned();
            cell.outputs = std::mem::take(&mut cell.outputs)
                .into_iter()
                .filter_map(escape_output)
                .collect();
        }
        CellKind::Raw => {}
    }
    cell
}

fn escape_output(output: Output) -> Option<Output> {
    match output {
        Output::Text { name, text } => {
            if text.trim().is_empty() {
                return None;
            }
            Some(Output::Text {
                name,
                text: escape_output_text(&text),
            })
        }
        Output::Data {
            mut bundle,
            execution_count,
        } => {
            for (mime, payload) in bundle.iter_mut() {
                let Payload::Text(text) = payload else {
                    continue;
                };
                if mime == "text/html" {
                    // HTML must stay HTML: only neutralize fences.
                    *text = escape_backticks(text).into_owned();
                } else if !is_media_mime(mime) {
                    *text = escape_output_text(text);
                }
            }
            Some(Output::Data {
                bundle,
                execution_count,
            })
        }
        error @ Output::Error { .. } => Some(error),
    }
}
