//! Notebook → MDX rendering.
//!
//! This module provides the rendering step that runs after preprocessing.
//! No I/O is performed here; the conversion driver writes the result.
//!
//! The built-in [`MdxRenderer`] implements the `mdoutput` template: code
//! outputs are wrapped in the `CodeOutputBlock` / `HTMLOutputBlock` site
//! components so MDX does not try to interpret their content.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::config::DEFAULT_TEMPLATE;
use crate::error::{Error, Result};
use crate::model::{Cell, CellKind, MimeBundle, Notebook, Output, Payload};

/// Display priority for rich outputs, highest first.
const MIME_PRIORITY: &[&str] = &[
    "text/html",
    "text/markdown",
    "video/mp4",
    "video/webm",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "image/gif",
    "text/latex",
    "text/plain",
    "application/json",
];

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ansi pattern"));

/// Turns a preprocessed notebook into markup text.
///
/// Implementations receive the notebook after every preprocessing stage has
/// run and must not touch the filesystem.
pub trait RenderEngine {
    fn render(&self, notebook: &Notebook, template: &str) -> Result<String>;
}

/// Built-in engine for the `mdoutput` template.
#[derive(Debug, Clone, Copy, Default)]
pub struct MdxRenderer;

impl MdxRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl RenderEngine for MdxRenderer {
    fn render(&self, notebook: &Notebook, template: &str) -> Result<String> {
        if template != DEFAULT_TEMPLATE {
            return Err(Error::Render(format!("unknown template '{template}'")));
        }

        let lang = notebook.language();
        let mut blocks = Vec::new();
        for cell in &notebook.cells {
            render_cell(cell, lang, &mut blocks);
        }

        let mut output = blocks.join("\n\n");
        if !output.is_empty() {
            output.push('\n');
        }
        Ok(output)
    }
}

fn render_cell(cell: &Cell, lang: &str, blocks: &mut Vec<String>) {
    match cell.kind {
        CellKind::Markdown | CellKind::Raw => {
            let source = cell.source.trim_end();
            if !source.is_empty() {
                blocks.push(source.to_string());
            }
        }
        CellKind::Code => {
            let source = cell.source.trim_end();
            if !source.trim().is_empty() {
                blocks.push(format!("```{lang}\n{source}\n```"));
            }
            blocks.extend(cell.outputs.iter().filter_map(|o| render_output(o, lang)));
        }
    }
}

fn render_output(output: &Output, lang: &str) -> Option<String> {
    match output {
        Output::Text { text, .. } => Some(code_output_block(text, lang)),
        Output::Data { bundle, .. } => render_bundle(bundle, lang),
        Output::Error { traceback, .. } => {
            let text = ANSI_ESCAPE.replace_all(&traceback.join("\n"), "").into_owned();
            Some(code_output_block(&text, lang))
        }
    }
}

fn render_bundle(bundle: &MimeBundle, lang: &str) -> Option<String> {
    let (mime, payload) = MIME_PRIORITY
        .iter()
        .find_map(|mime| bundle.get_key_value(*mime))
        .or_else(|| {
            bundle
                .iter()
                .find(|(mime, _)| mime.starts_with("image/") || mime.starts_with("video/"))
        })?;

    let text = match payload {
        Payload::Text(text) => text.clone(),
        Payload::Json(value) => serde_json::to_string_pretty(value).ok()?,
    };

    let block = match mime.as_str() {
        "text/html" => format!(
            "<HTMLOutputBlock center>\n\n```\n{}\n```\n\n</HTMLOutputBlock>",
            text.trim_end()
        ),
        "text/markdown" | "text/latex" => text.trim_end().to_string(),
        "text/plain" | "application/json" => code_output_block(&text, lang),
        m if m.starts_with("video/") => {
            format!("<video controls src=\"{}\"></video>", media_src(m, &text))
        }
        m if m.starts_with("image/") => format!("![output]({})", media_src(m, &text)),
        _ => return None,
    };
    Some(block)
}

fn code_output_block(text: &str, lang: &str) -> String {
    format!(
        "<CodeOutputBlock lang=\"{lang}\">\n\n```\n{}\n```\n\n</CodeOutputBlock>",
        text.trim_end()
    )
}

/// Usable `src` for a media payload that may not have been extracted.
fn media_src(mime: &str, payload: &str) -> String {
    let payload = payload.trim();
    // Base64 may start with '/' but never contains '.'.
    let is_path = payload.starts_with('/') && payload.contains('.');
    if is_path || payload.starts_with("data:") || payload.contains("://") {
        payload.to_string()
    } else {
        let compact: String = payload.split_whitespace().collect();
        format!("data:{mime};base64,{compact}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(cells: Vec<Cell>) -> String {
        MdxRenderer::new()
            .render(&Notebook::new(cells), DEFAULT_TEMPLATE)
            .unwrap()
    }

    #[test]
    fn test_unknown_template() {
        let err = MdxRenderer::new()
            .render(&Notebook::new(Vec::new()), "classic")
            .unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_empty_notebook() {
        assert_eq!(render(Vec::new()), "");
    }

    #[test]
    fn test_markdown_and_raw_verbatim() {
        let out = render(vec![Cell::markdown("# Intro\n"), Cell::raw("<br/>")]);
        assert_eq!(out, "# Intro\n\n<br/>\n");
    }

    #[test]
    fn test_code_cell_with_stream() {
        let cell = Cell::code("print('hi')").with_output(Output::stdout("hi\n"));
        let out = render(vec![cell]);
        assert!(out.starts_with("```python\nprint('hi')\n```\n\n"));
        assert!(out.contains("<CodeOutputBlock lang=\"python\">\n\n```\nhi\n```\n\n</CodeOutputBlock>"));
    }

    #[test]
    fn test_html_preferred_over_plain() {
        let mut bundle = MimeBundle::new();
        bundle.insert("text/plain".into(), Payload::Text("<obj>".into()));
        bundle.insert("text/html".into(), Payload::Text("<b>x</b>".into()));
        let cell = Cell::code("x").with_output(Output::Data {
            bundle,
            execution_count: Some(1),
        });
        let out = render(vec![cell]);
        assert!(out.contains("<HTMLOutputBlock center>"));
        assert!(out.contains("<b>x</b>"));
        assert!(!out.contains("<obj>"));
    }

    #[test]
    fn test_extracted_image_and_video() {
        let cell = Cell::code("plot()")
            .with_output(Output::display("image/png", "/img/notebooks/nb/abc.png"))
            .with_output(Output::display("video/mp4", "/img/notebooks/nb/def.mp4"));
        let out = render(vec![cell]);
        assert!(out.contains("![output](/img/notebooks/nb/abc.png)"));
        assert!(out.contains("<video controls src=\"/img/notebooks/nb/def.mp4\"></video>"));
    }

    #[test]
    fn test_unextracted_image_falls_back_to_data_uri() {
        let cell = Cell::code("").with_output(Output::display("image/png", "iVBO\nRw0K\n"));
        let out = render(vec![cell]);
        assert_eq!(out, "![output](data:image/png;base64,iVBORw0K)\n");
    }

    #[test]
    fn test_error_traceback_strips_ansi() {
        let cell = Cell::code("1/0").with_output(Output::Error {
            ename: "ZeroDivisionError".into(),
            evalue: "division by zero".into(),
            traceback: vec!["\u{1b}[0;31mZeroDivisionError\u{1b}[0m: division by zero".into()],
        });
        let out = render(vec![cell]);
        assert!(out.contains("ZeroDivisionError: division by zero"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_json_payload() {
        let mut bundle = MimeBundle::new();
        bundle.insert(
            "application/json".into(),
            Payload::Json(serde_json::json!({"a": 1})),
        );
        let cell = Cell::code("").with_output(Output::Data {
            bundle,
            execution_count: None,
        });
        let out = render(vec![cell]);
        assert!(out.contains("\"a\": 1"));
    }
}
