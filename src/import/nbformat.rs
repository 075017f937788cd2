//! nbformat v4 JSON reader.
//!
//! The on-disk format is deserialized into private `Raw*` mirrors first and
//! then lifted into the typed [`crate::model`] types, so the rest of the
//! crate never sees untyped metadata for the flags it cares about.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Cell, CellKind, CellMetadata, MimeBundle, Notebook, Output, Payload};
use crate::util::decode_text;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Deserialize)]
struct RawNotebook {
    cells: Vec<RawCell>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
    #[serde(default)]
    nbformat: u32,
    #[serde(default)]
    nbformat_minor: u32,
}

#[derive(Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: MultilineString,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
    #[serde(default)]
    outputs: Vec<RawOutput>,
    #[serde(default)]
    execution_count: Option<u32>,
}

/// nbformat allows text either as one string or as a list of lines.
#[derive(Deserialize)]
#[serde(untagged)]
enum MultilineString {
    One(String),
    Lines(Vec<String>),
}

impl Default for MultilineString {
    fn default() -> Self {
        MultilineString::One(String::new())
    }
}

impl MultilineString {
    fn into_string(self) -> String {
        match self {
            MultilineString::One(s) => s,
            MultilineString::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
enum RawOutput {
    Stream {
        #[serde(default = "default_stream_name")]
        name: String,
        #[serde(default)]
        text: MultilineString,
    },
    DisplayData {
        #[serde(default)]
        data: BTreeMap<String, Value>,
    },
    ExecuteResult {
        #[serde(default)]
        data: BTreeMap<String, Value>,
        #[serde(default)]
        execution_count: Option<u32>,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

fn default_stream_name() -> String {
    "stdout".to_string()
}

// ============================================================================
// Reading
// ============================================================================

/// Read a notebook from disk.
///
/// A missing file is reported as [`Error::MissingInput`] before anything is
/// parsed.
pub fn read_notebook(path: impl AsRef<Path>) -> Result<Notebook> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    parse_notebook(&decode_text(&bytes))
}

/// Parse a notebook from its JSON text.
pub fn parse_notebook(json: &str) -> Result<Notebook> {
    let raw: RawNotebook = serde_json::from_str(json)?;

    if raw.nbformat != 0 && raw.nbformat < 4 {
        return Err(Error::InvalidNotebook(format!(
            "nbformat {} is not supported, upgrade the notebook to v4",
            raw.nbformat
        )));
    }

    let cells = raw
        .cells
        .into_iter()
        .enumerate()
        .map(|(index, cell)| lift_cell(index, cell))
        .collect::<Result<Vec<_>>>()?;

    Ok(Notebook {
        cells,
        metadata: raw.metadata,
        nbformat: raw.nbformat,
        nbformat_minor: raw.nbformat_minor,
    })
}

fn lift_cell(index: usize, raw: RawCell) -> Result<Cell> {
    let kind = match raw.cell_type.as_str() {
        "code" => CellKind::Code,
        "markdown" => CellKind::Markdown,
        "raw" => CellKind::Raw,
        other => {
            return Err(Error::InvalidNotebook(format!(
                "unknown cell type '{other}' at index {index}"
            )));
        }
    };

    let outputs = if kind == CellKind::Code {
        raw.outputs.into_iter().map(lift_output).collect()
    } else {
        Vec::new()
    };

    Ok(Cell {
        kind,
        source: raw.source.into_string(),
        metadata: lift_metadata(raw.metadata),
        outputs,
        execution_count: raw.execution_count,
    })
}

/// Lift the boolean `hide` / `hide_input` flags out of the metadata map.
///
/// Non-boolean values under those keys are not flags and stay in `extra`.
fn lift_metadata(mut map: BTreeMap<String, Value>) -> CellMetadata {
    let hide = take_flag(&mut map, "hide");
    let hide_input = take_flag(&mut map, "hide_input");

    CellMetadata {
        hide,
        hide_input,
        extra: map,
    }
}

fn take_flag(map: &mut BTreeMap<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(&Value::Bool(flag)) => {
            map.remove(key);
            flag
        }
        _ => false,
    }
}

fn lift_output(raw: RawOutput) -> Output {
    match raw {
        RawOutput::Stream { name, text } => Output::Text {
            name,
            text: text.into_string(),
        },
        RawOutput::DisplayData { data } => Output::Data {
            bundle: lift_bundle(data),
            execution_count: None,
        },
        RawOutput::ExecuteResult {
            data,
            execution_count,
        } => Output::Data {
            bundle: lift_bundle(data),
            execution_count,
        },
        RawOutput::Error {
            ename,
            evalue,
            traceback,
        } => Output::Error {
            ename,
            evalue,
            traceback,
        },
    }
}

fn lift_bundle(data: BTreeMap<String, Value>) -> MimeBundle {
    data.into_iter()
        .map(|(mime, value)| (mime, lift_payload(value)))
        .collect()
}

fn lift_payload(value: Value) -> Payload {
    match value {
        Value::String(s) => Payload::Text(s),
        Value::Array(items) if items.iter().all(Value::is_string) => Payload::Text(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .concat(),
        ),
        other => Payload::Json(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
      "cells": [
        {"cell_type": "raw", "metadata": {}, "source": ["# !chapter\n", "chapter-title: Intro"]},
        {"cell_type": "markdown", "metadata": {"hide": true, "tags": ["x"]}, "source": "# Hidden"},
        {"cell_type": "code", "metadata": {"hide_input": true}, "execution_count": 3,
         "source": ["print(1)"],
         "outputs": [
           {"output_type": "stream", "name": "stdout", "text": ["1\n"]},
           {"output_type": "execute_result", "execution_count": 3, "metadata": {},
            "data": {"text/plain": ["1"], "application/json": {"a": 1}}},
           {"output_type": "display_data", "metadata": {}, "data": {"image/png": "iVBORw0KGgo=\n"}},
           {"output_type": "error", "ename": "ValueError", "evalue": "bad", "traceback": ["line"]}
         ]}
      ],
      "metadata": {"kernelspec": {"language": "python"}},
      "nbformat": 4,
      "nbformat_minor": 5
    }"##;

    #[test]
    fn test_parse_sample() {
        let nb = parse_notebook(SAMPLE).unwrap();
        assert_eq!(nb.cells.len(), 3);
        assert_eq!(nb.nbformat, 4);

        let chapter = &nb.cells[0];
        assert_eq!(chapter.kind, CellKind::Raw);
        assert_eq!(chapter.source, "# !chapter\nchapter-title: Intro");

        let hidden = &nb.cells[1];
        assert!(hidden.metadata.hide);
        assert!(!hidden.metadata.hide_input);
        assert!(hidden.metadata.extra.contains_key("tags"));
        assert!(!hidden.metadata.extra.contains_key("hide"));

        let code = &nb.cells[2];
        assert!(code.metadata.hide_input);
        assert_eq!(code.execution_count, Some(3));
        assert_eq!(code.outputs.len(), 4);
        assert_eq!(code.outputs[0], Output::stdout("1\n"));
        match &code.outputs[1] {
            Output::Data {
                bundle,
                execution_count,
            } => {
                assert_eq!(*execution_count, Some(3));
                assert_eq!(bundle["text/plain"], Payload::Text("1".to_string()));
                assert!(matches!(bundle["application/json"], Payload::Json(_)));
            }
            other => panic!("unexpected output {other:?}"),
        }
        assert!(matches!(code.outputs[3], Output::Error { .. }));
    }

    #[test]
    fn test_non_bool_flag_stays_in_extra() {
        let json = r#"{"cells": [{"cell_type": "markdown", "metadata": {"hide": "yes"}, "source": ""}]}"#;
        let nb = parse_notebook(json).unwrap();
        assert!(!nb.cells[0].metadata.hide);
        assert_eq!(nb.cells[0].metadata.extra["hide"], Value::from("yes"));
    }

    #[test]
    fn test_unknown_cell_type() {
        let json = r#"{"cells": [{"cell_type": "heading", "source": "x"}]}"#;
        assert!(matches!(
            parse_notebook(json),
            Err(Error::InvalidNotebook(_))
        ));
    }

    #[test]
    fn test_rejects_nbformat_3() {
        let json = r#"{"cells": [], "nbformat": 3}"#;
        assert!(matches!(
            parse_notebook(json),
            Err(Error::InvalidNotebook(_))
        ));
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(parse_notebook("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = read_notebook("/definitely/not/here.ipynb").unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }
}
