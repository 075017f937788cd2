//! Media extraction: moves embedded binaries into the content-addressed
//! asset store and rewrites references to point at the stored files.
//!
//! Three reference sites are handled:
//!
//! - `![alt](target)` in markdown cells, where `target` is a data URI or a
//!   local file
//! - `image/*` and `video/*` payloads of code outputs (data URI or raw base64)
//! - `<source src="data:video/...">` tags inside `text/html` payloads
//!
//! A reference that fails to decode is logged and left as it was. Filesystem
//! errors abort the stage.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use regex_lite::{Captures, Regex};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Cell, CellKind, MimeBundle, Notebook, Output, Payload};

use super::{ConversionContext, Preprocessor, is_media_mime};

/// Number of hex digits of the content hash used as the file name.
pub const HASH_PREFIX_LEN: usize = 12;

static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("image pattern"));

static DATA_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:([^;]+);base64,(.+)$").expect("data uri pattern"));

static VIDEO_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<source\s+([^>]*?)src=["'](data:video/[^"']+)["']"#).expect("source pattern")
});

/// Extracts embedded media into the asset store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractMedia;

impl Preprocessor for ExtractMedia {
    fn name(&self) -> &'static str {
        "extract-media"
    }

    fn preprocess(&self, mut notebook: Notebook, ctx: &ConversionContext<'_>) -> Result<Notebook> {
        for cell in &mut notebook.cells {
            extract_cell_media(cell, ctx)?;
        }
        Ok(notebook)
    }
}

/// Extract the media of a single cell in place.
pub fn extract_cell_media(cell: &mut Cell, ctx: &ConversionContext<'_>) -> Result<()> {
    match cell.kind {
        CellKind::Markdown => {
            cell.source = rewrite_markdown_images(&cell.source, ctx)?;
        }
        CellKind::Code => {
            for output in &mut cell.outputs {
                if let Output::Data { bundle, .. } = output {
                    extract_bundle(bundle, ctx)?;
                }
            }
        }
        CellKind::Raw => {}
    }
    Ok(())
}

// ============================================================================
// Asset Store
// ============================================================================

/// Content-addressed file name: hash prefix of the bytes plus extension.
pub fn asset_file_name(data: &[u8], extension: &str) -> String {
    let digest = sha1_smol::Sha1::from(data).digest().to_string();
    format!("{}.{}", &digest[..HASH_PREFIX_LEN], extension)
}

/// File extension for a MIME type: its subtype, minus parameters and any
/// structured syntax suffix (`image/svg+xml` → `svg`).
pub fn extension_for_mime(mime: &str) -> String {
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    let subtype = essence.rsplit('/').next().unwrap_or(essence);
    let subtype = subtype.split('+').next().unwrap_or(subtype);
    subtype.to_ascii_lowercase()
}

/// Write `data` into `dir` under its content-addressed name.
///
/// Returns the file name. An existing file of that name is never rewritten.
pub fn store_asset(dir: &Path, data: &[u8], extension: &str) -> Result<String> {
    let file_name = asset_file_name(data, extension);
    let path = dir.join(&file_name);
    if path.exists() {
        debug!(path = %path.display(), "asset already stored");
        return Ok(file_name);
    }
    fs::create_dir_all(dir)?;
    fs::write(&path, data)?;
    debug!(path = %path.display(), bytes = data.len(), "stored asset");
    Ok(file_name)
}

/// Decode base64 text, ignoring embedded whitespace and missing padding.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.split_whitespace().collect();
    STANDARD
        .decode(compact.as_bytes())
        .or_else(|_| STANDARD_NO_PAD.decode(compact.as_bytes()))
        .map_err(|e| Error::MalformedMedia(format!("invalid base64: {e}")))
}

/// Split a `data:` URI at its first comma into header and payload.
fn split_data_uri(uri: &str) -> Result<(&str, &str)> {
    uri.split_once(',')
        .ok_or_else(|| Error::MalformedMedia("data URI without ',' separator".to_string()))
}

/// MIME type declared in a `data:<mime>;base64` header.
fn data_uri_mime(header: &str) -> Result<&str> {
    header
        .split(';')
        .next()
        .and_then(|h| h.strip_prefix("data:"))
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::MalformedMedia(format!("bad data URI header '{header}'")))
}

// ============================================================================
// Markdown Images
// ============================================================================

fn rewrite_markdown_images(source: &str, ctx: &ConversionContext<'_>) -> Result<String> {
    let mut failure = None;
    let rewritten = MARKDOWN_IMAGE.replace_all(source, |caps: &Captures| {
        match rewrite_image_reference(&caps[1], &caps[2], ctx) {
            Ok(Some(replacement)) => replacement,
            Ok(None) => caps[0].to_string(),
            Err(Error::MalformedMedia(reason)) => {
                warn!(document = %ctx.document_name, %reason, "leaving image reference untouched");
                caps[0].to_string()
            }
            Err(e) => {
                failure.get_or_insert(e);
                caps[0].to_string()
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(rewritten.into_owned()),
    }
}

fn rewrite_image_reference(
    alt: &str,
    target: &str,
    ctx: &ConversionContext<'_>,
) -> Result<Option<String>> {
    let prefix = &ctx.config.markdown_image_prefix;

    if target.starts_with("data:") {
        let Some(caps) = DATA_URI.captures(target) else {
            return Err(Error::MalformedMedia("unsupported data URI".to_string()));
        };
        let data = decode_base64(&caps[2])?;
        let file_name = store_asset(&ctx.asset_dir(), &data, &extension_for_mime(&caps[1]))?;
        return Ok(Some(format!(
            "![{alt}]({prefix}/{}/{file_name})",
            ctx.document_name
        )));
    }

    if target.contains("://") {
        return Ok(None);
    }

    let Some(path) = ctx.resolve_local(target) else {
        return Ok(None);
    };
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(None);
    };
    let asset_dir = ctx.asset_dir();
    fs::create_dir_all(&asset_dir)?;
    fs::copy(&path, asset_dir.join(&file_name))?;
    debug!(source = %path.display(), "copied local image");

    Ok(Some(format!(
        "![{alt}]({prefix}/{}/{file_name})",
        ctx.document_name
    )))
}

// ============================================================================
// Output Payloads
// ============================================================================

fn extract_bundle(bundle: &mut MimeBundle, ctx: &ConversionContext<'_>) -> Result<()> {
    for (mime, payload) in bundle.iter_mut() {
        let Payload::Text(text) = payload else {
            continue;
        };

        if is_media_mime(mime) {
            if is_asset_reference(text, &ctx.config.output_media_prefix) {
                continue;
            }
            match store_output_media(mime, text, ctx) {
                Ok(url) => *text = url,
                Err(Error::MalformedMedia(reason)) => {
                    warn!(document = %ctx.document_name, %mime, %reason, "leaving output media untouched");
                }
                Err(e) => return Err(e),
            }
        } else if mime == "text/html" {
            *text = rewrite_video_sources(text, ctx)?;
        }
    }
    Ok(())
}

/// Whether a payload was already replaced by a stored asset path.
fn is_asset_reference(payload: &str, prefix: &str) -> bool {
    payload
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn store_output_media(mime: &str, payload: &str, ctx: &ConversionContext<'_>) -> Result<String> {
    let trimmed = payload.trim();
    let data = if trimmed.starts_with("data:") {
        let (_, encoded) = split_data_uri(trimmed)?;
        decode_base64(encoded)?
    } else if mime.ends_with("+xml") && trimmed.starts_with('<') {
        // SVG is stored as markup rather than base64.
        payload.as_bytes().to_vec()
    } else {
        decode_base64(trimmed)?
    };

    let file_name = store_asset(&ctx.asset_dir(), &data, &extension_for_mime(mime))?;
    Ok(format!(
        "{}/{}/{file_name}",
        ctx.config.output_media_prefix, ctx.document_name
    ))
}

/// Rewrite the `src` of `<source>` tags holding a video data URI.
///
/// Only the attribute value changes; malformed URIs keep the original tag.
fn rewrite_video_sources(html: &str, ctx: &ConversionContext<'_>) -> Result<String> {
    let mut failure = None;
    let rewritten = VIDEO_SOURCE.replace_all(html, |caps: &Captures| {
        let pre_attrs = &caps[1];
        match store_video_source(&caps[2], ctx) {
            Ok(url) => format!("<source {pre_attrs}src=\"{url}\""),
            Err(Error::MalformedMedia(reason)) => {
                warn!(document = %ctx.document_name, %reason, "leaving <source> tag untouched");
                caps[0].to_string()
            }
            Err(e) => {
                failure.get_or_insert(e);
                caps[0].to_string()
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(rewritten.into_owned()),
    }
}

fn store_video_source(data_uri: &str, ctx: &ConversionContext<'_>) -> Result<String> {
    let (header, encoded) = split_data_uri(data_uri)?;
    let mime = data_uri_mime(header)?;
    let data = decode_base64(encoded)?;
    let file_name = store_asset(&ctx.asset_dir(), &data, &extension_for_mime(mime))?;
    Ok(format!(
        "{}/{}/{file_name}",
        ctx.config.html_video_prefix, ctx.document_name
    ))
}

impl ConversionContext<'_> {
    /// Existing local file a markdown image target refers to.
    fn resolve_local(&self, target: &str) -> Option<PathBuf> {
        let path = Path::new(target);
        let resolved = match &self.source_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        };
        resolved.is_file().then_some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use tempfile::TempDir;

    // "hello" in base64
    const HELLO_B64: &str = "aGVsbG8=";

    fn ctx<'a>(root: &Path, config: &'a ConvertConfig) -> ConversionContext<'a> {
        ConversionContext::new(root.join("static"), "lesson", config)
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/svg+xml"), "svg");
        assert_eq!(extension_for_mime("video/mp4; codecs=avc1"), "mp4");
        assert_eq!(extension_for_mime("image/JPEG"), "jpeg");
    }

    #[test]
    fn test_asset_file_name_is_pure() {
        let a = asset_file_name(b"hello", "png");
        assert_eq!(a, asset_file_name(b"hello", "png"));
        assert_eq!(a, "aaf4c61ddcc5.png");
        assert_ne!(a, asset_file_name(b"hello!", "png"));
    }

    #[test]
    fn test_decode_base64_tolerates_whitespace_and_padding() {
        assert_eq!(decode_base64("aGVs\nbG8=\n").unwrap(), b"hello");
        assert_eq!(decode_base64("aGVsbG8").unwrap(), b"hello");
        assert!(matches!(
            decode_base64("!!not base64!!"),
            Err(Error::MalformedMedia(_))
        ));
    }

    #[test]
    fn test_store_asset_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("assets");
        let name = store_asset(&dir, b"hello", "bin").unwrap();
        fs::write(dir.join(&name), b"tampered").unwrap();
        assert_eq!(store_asset(&dir, b"hello", "bin").unwrap(), name);
        assert_eq!(fs::read(dir.join(&name)).unwrap(), b"tampered");
    }

    #[test]
    fn test_markdown_data_uri() {
        let tmp = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config);
        let source = format!("Look: ![plot](data:image/png;base64,{HELLO_B64}) done");

        let out = rewrite_markdown_images(&source, &ctx).unwrap();
        assert_eq!(out, "Look: ![plot](/notebooks/lesson/aaf4c61ddcc5.png) done");
        assert_eq!(files_in(&ctx.asset_dir()), vec!["aaf4c61ddcc5.png"]);
    }

    #[test]
    fn test_markdown_local_file_copied() {
        let tmp = TempDir::new().unwrap();
        let src_dir = tmp.path().join("docs");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("diagram.png"), b"png bytes").unwrap();

        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config).with_source_dir(&src_dir);
        let out = rewrite_markdown_images("![d](diagram.png)", &ctx).unwrap();

        assert_eq!(out, "![d](/notebooks/lesson/diagram.png)");
        assert_eq!(
            fs::read(ctx.asset_dir().join("diagram.png")).unwrap(),
            b"png bytes"
        );
    }

    #[test]
    fn test_markdown_remote_and_missing_untouched() {
        let tmp = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config);
        let source = "![a](https://example.com/a.png) ![b](missing.png)";
        assert_eq!(rewrite_markdown_images(source, &ctx).unwrap(), source);
        assert!(!ctx.asset_dir().exists());
    }

    #[test]
    fn test_markdown_malformed_data_uri_untouched() {
        let tmp = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config);
        let source = "![x](data:image/png;base64,@@@@)";
        assert_eq!(rewrite_markdown_images(source, &ctx).unwrap(), source);
    }

    #[test]
    fn test_output_payload_forms() {
        let tmp = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config);

        let mut bundle = MimeBundle::new();
        bundle.insert("image/png".into(), Payload::Text(format!("{HELLO_B64}\n")));
        bundle.insert(
            "video/mp4".into(),
            Payload::Text(format!("data:video/mp4;base64,{HELLO_B64}")),
        );
        bundle.insert("text/plain".into(), Payload::Text("<Figure>".into()));
        extract_bundle(&mut bundle, &ctx).unwrap();

        assert_eq!(
            bundle["image/png"].as_text(),
            Some("/img/notebooks/lesson/aaf4c61ddcc5.png")
        );
        assert_eq!(
            bundle["video/mp4"].as_text(),
            Some("/img/notebooks/lesson/aaf4c61ddcc5.mp4")
        );
        assert_eq!(bundle["text/plain"].as_text(), Some("<Figure>"));
    }

    #[test]
    fn test_raw_svg_payload() {
        let tmp = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config);

        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>";
        let mut bundle = MimeBundle::new();
        bundle.insert("image/svg+xml".into(), Payload::Text(svg.into()));
        extract_bundle(&mut bundle, &ctx).unwrap();

        let url = bundle["image/svg+xml"].as_text().unwrap();
        assert!(url.ends_with(".svg"));
        let name = url.rsplit('/').next().unwrap();
        assert_eq!(fs::read_to_string(ctx.asset_dir().join(name)).unwrap(), svg);
    }

    #[test]
    fn test_html_source_rewrite() {
        let tmp = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config);

        let html = format!(
            "<video autoplay>\n  <source type=\"video/mp4\" src=\"data:video/mp4;base64,{HELLO_B64}\" data-x='1'>\n</video>"
        );
        let out = rewrite_video_sources(&html, &ctx).unwrap();
        assert_eq!(
            out,
            "<video autoplay>\n  <source type=\"video/mp4\" src=\"/docs/img/notebooks/lesson/aaf4c61ddcc5.mp4\" data-x='1'>\n</video>"
        );
    }

    #[test]
    fn test_html_malformed_source_untouched() {
        let tmp = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config);

        let no_comma = "<source src=\"data:video/mp4;base64\">";
        assert_eq!(rewrite_video_sources(no_comma, &ctx).unwrap(), no_comma);

        let bad_payload = "<source src=\"data:video/mp4;base64,%%%\">";
        assert_eq!(rewrite_video_sources(bad_payload, &ctx).unwrap(), bad_payload);
        assert!(!ctx.asset_dir().exists());
    }

    #[test]
    fn test_same_bytes_one_asset() {
        let tmp = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let ctx = ctx(tmp.path(), &config);

        let mut notebook = Notebook::new(vec![
            Cell::markdown(format!("![a](data:image/png;base64,{HELLO_B64})")),
            Cell::code("plot()").with_output(Output::display("image/png", HELLO_B64)),
        ]);
        notebook = ExtractMedia.preprocess(notebook, &ctx).unwrap();
        notebook = ExtractMedia.preprocess(notebook, &ctx).unwrap();

        assert_eq!(files_in(&ctx.asset_dir()), vec!["aaf4c61ddcc5.png"]);
        assert_eq!(
            notebook.cells[0].source,
            "![a](/notebooks/lesson/aaf4c61ddcc5.png)"
        );
    }
}
