//! Notebook, cell and output types.

use std::collections::BTreeMap;

use serde_json::Value;

/// MIME type → payload mapping of a rich output.
pub type MimeBundle = BTreeMap<String, Payload>;

/// A notebook: ordered cells plus a free-form metadata map.
///
/// The pipeline never mutates a loaded notebook in place; slicing produces
/// new notebooks via [`Notebook::with_cells`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    pub metadata: BTreeMap<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

/// Kind of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Code,
    /// Narrative (markdown) content.
    Markdown,
    /// Raw content, also used for directive cells.
    Raw,
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub source: String,
    pub metadata: CellMetadata,
    /// Outputs of a code cell, always empty for other kinds.
    pub outputs: Vec<Output>,
    pub execution_count: Option<u32>,
}

/// Cell metadata with the recognized flags lifted out of the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellMetadata {
    pub hide: bool,
    pub hide_input: bool,
    /// Every other key, preserved as-is.
    pub extra: BTreeMap<String, Value>,
}

/// A code cell output.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Stream text (`stdout` / `stderr`).
    Text { name: String, text: String },
    /// Rich display data or an execution result.
    Data {
        bundle: MimeBundle,
        execution_count: Option<u32>,
    },
    /// An exception raised while executing the cell.
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
}

/// A single MIME payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Text payload; binary MIME types carry base64 or a data URI here.
    Text(String),
    /// Structured payload such as `application/json`.
    Json(Value),
}

impl Notebook {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: BTreeMap::new(),
            nbformat: 4,
            nbformat_minor: 5,
        }
    }

    /// A new notebook with the same metadata and the given cells.
    pub fn with_cells(&self, cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: self.metadata.clone(),
            nbformat: self.nbformat,
            nbformat_minor: self.nbformat_minor,
        }
    }

    /// Kernel language, used to tag code fences.
    pub fn language(&self) -> &str {
        let from_info = self
            .metadata
            .get("language_info")
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str);
        let from_kernel = self
            .metadata
            .get("kernelspec")
            .and_then(|spec| spec.get("language"))
            .and_then(Value::as_str);

        from_info.or(from_kernel).unwrap_or("python")
    }

    /// Index of the first raw cell containing `token`.
    pub fn find_directive(&self, token: &str) -> Option<usize> {
        self.cells.iter().position(|c| c.is_directive(token))
    }

    /// Indices of every raw cell containing `token`, in source order.
    pub fn directive_indices(&self, token: &str) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_directive(token))
            .map(|(i, _)| i)
            .collect()
    }
}

impl Cell {
    fn new(kind: CellKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            metadata: CellMetadata::default(),
            outputs: Vec::new(),
            execution_count: None,
        }
    }

    pub fn code(source: impl Into<String>) -> Self {
        Self::new(CellKind::Code, source)
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(CellKind::Markdown, source)
    }

    pub fn raw(source: impl Into<String>) -> Self {
        Self::new(CellKind::Raw, source)
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_metadata(mut self, metadata: CellMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether this is a raw cell whose source contains `token`.
    pub fn is_directive(&self, token: &str) -> bool {
        self.kind == CellKind::Raw && self.source.contains(token)
    }
}

impl CellMetadata {
    pub fn hidden() -> Self {
        Self {
            hide: true,
            ..Default::default()
        }
    }

    pub fn input_hidden() -> Self {
        Self {
            hide_input: true,
            ..Default::default()
        }
    }
}

impl Output {
    pub fn stdout(text: impl Into<String>) -> Self {
        Output::Text {
            name: "stdout".to_string(),
            text: text.into(),
        }
    }

    /// Display data with a single text payload.
    pub fn display(mime: impl Into<String>, payload: impl Into<String>) -> Self {
        let mut bundle = MimeBundle::new();
        bundle.insert(mime.into(), Payload::Text(payload.into()));
        Output::Data {
            bundle,
            execution_count: None,
        }
    }
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Json(_) => None,
        }
    }
}
