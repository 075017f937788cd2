//! Chapter front-matter extraction and `custom_edit_url` injection.
//!
//! Front-matter is handled as text. The only structure assumed is the `---`
//! delimiter lines, one legacy key rename and one injected key.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex_lite::Regex;
use tracing::warn;

use crate::config::{CHAPTER_MARKER, FRONTMATTER_DELIMITER, GithubRepo};
use crate::model::{Frontmatter, Notebook};

/// Substituted when a notebook declares no chapter front-matter.
pub const DEFAULT_FRONTMATTER: &str = "---\ntitle: Untitled\n---\n";

const LEGACY_TITLE_KEY: &str = "chapter-title:";
const TITLE_KEY: &str = "title:";
const EDIT_URL_KEY: &str = "custom_edit_url:";

/// Characters escaped in a single path segment of an edit URL.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

static EDIT_URL_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"custom_edit_url:\s*"([^"]+)""#).expect("edit url pattern"));

/// Locate the chapter directive and build the chapter front-matter.
///
/// The first raw cell containing [`CHAPTER_MARKER`] supplies the block: the
/// text after the marker, with `chapter-title:` renamed to `title:` and
/// delimiters added where missing. Without such a cell (or with an empty
/// one) [`DEFAULT_FRONTMATTER`] is used. When `edit_url` is given it is
/// inserted as `custom_edit_url` before the closing delimiter.
pub fn extract_frontmatter(notebook: &Notebook, edit_url: Option<&str>) -> Frontmatter {
    let source_cell = notebook.find_directive(CHAPTER_MARKER);

    let declared = source_cell
        .and_then(|index| notebook.cells[index].source.split_once(CHAPTER_MARKER))
        .map(|(_, after)| rename_legacy_keys(after.trim()))
        .filter(|block| !block.is_empty());

    let mut text = match declared {
        Some(block) => ensure_delimited(&block),
        None => {
            warn!(
                found_cell = source_cell.is_some(),
                "no chapter front-matter, using default"
            );
            DEFAULT_FRONTMATTER.to_string()
        }
    };

    if let Some(url) = edit_url {
        text = add_edit_url(&text, url);
    }

    Frontmatter { text, source_cell }
}

/// Rename the legacy `chapter-title:` key to `title:`.
pub fn rename_legacy_keys(block: &str) -> String {
    block.replace(LEGACY_TITLE_KEY, TITLE_KEY)
}

/// Wrap a bare block in delimiters, or close an unterminated one.
pub fn ensure_delimited(block: &str) -> String {
    let block = block.trim();
    if !block.starts_with(FRONTMATTER_DELIMITER) {
        format!("{FRONTMATTER_DELIMITER}\n{block}\n{FRONTMATTER_DELIMITER}\n")
    } else if closing_delimiter(block).is_none() {
        format!("{block}\n{FRONTMATTER_DELIMITER}\n")
    } else {
        format!("{block}\n")
    }
}

/// Insert `custom_edit_url` right before the closing delimiter.
///
/// An empty block becomes a minimal block carrying only the edit URL. A
/// block that already declares `custom_edit_url` is returned unchanged, and
/// a block without a closing delimiter gets one appended.
pub fn add_edit_url(frontmatter: &str, edit_url: &str) -> String {
    let line = format!("{EDIT_URL_KEY} \"{edit_url}\"");
    let block = frontmatter.trim_end();

    if block.is_empty() {
        return format!("{FRONTMATTER_DELIMITER}\n{line}\n{FRONTMATTER_DELIMITER}\n");
    }
    if block.contains(EDIT_URL_KEY) {
        return frontmatter.to_string();
    }

    match closing_delimiter(block) {
        Some(pos) => format!("{}{line}\n{}\n", &block[..pos], &block[pos..]),
        None => format!("{block}\n{line}\n{FRONTMATTER_DELIMITER}\n"),
    }
}

/// Value of `custom_edit_url` declared in a block, if any.
pub fn extract_edit_url(frontmatter: &str) -> Option<String> {
    EDIT_URL_VALUE
        .captures(frontmatter)
        .map(|caps| caps[1].to_string())
}

/// Edit link for a notebook path relative to the repository root.
pub fn edit_url(github: &GithubRepo, relative_path: &str) -> String {
    let path = relative_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}{path}", github.blob_base())
}

/// Byte offset of the first delimiter line after the opening line.
fn closing_delimiter(block: &str) -> Option<usize> {
    let mut offset = 0;
    for (n, line) in block.split_inclusive('\n').enumerate() {
        if n > 0 && line.trim_end() == FRONTMATTER_DELIMITER {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}
