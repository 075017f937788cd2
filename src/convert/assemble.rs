//! Document assembly: front-matter, preprocessing, rendering and writing.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::import::read_notebook;
use crate::markdown::{MdxRenderer, RenderEngine};
use crate::model::Notebook;
use crate::preprocess::{ConversionContext, default_stages, run_stages};
use crate::util::{file_stem, to_slash_path};

use super::frontmatter::{
    DEFAULT_FRONTMATTER, add_edit_url, edit_url, extract_edit_url, extract_frontmatter,
};
use super::ignore::{append_to_ignore_file, write_directory_ignore};
use super::paginate::{has_pagebreaks, index_cells, split_sections};

/// Shape of the emitted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One `<name>.<ext>` file next to the notebook.
    SinglePage,
    /// A `<name>/` directory with `index.<ext>` and one page per section.
    MultiPage,
}

/// Result of converting one notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub layout: Layout,
    /// Every document written, in emission order.
    pub outputs: Vec<PathBuf>,
    /// 1-based numbers of sections that failed to render.
    pub skipped_sections: Vec<usize>,
}

/// Pick the layout for a notebook.
pub fn detect_layout(notebook: &Notebook) -> Layout {
    if has_pagebreaks(notebook) {
        Layout::MultiPage
    } else {
        Layout::SinglePage
    }
}

/// Converts notebooks into MDX documents.
///
/// # Example
///
/// ```no_run
/// use nbdocs::{ConvertConfig, Converter, GithubRepo};
///
/// let config = ConvertConfig::new().with_github(GithubRepo::new("octo", "docs"));
/// let converter = Converter::new().with_config(config);
/// let result = converter.convert("docs/intro.ipynb".as_ref(), ".".as_ref())?;
/// println!("wrote {} documents", result.outputs.len());
/// # Ok::<(), nbdocs::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter<E: RenderEngine = MdxRenderer> {
    config: ConvertConfig,
    engine: E,
}

impl Converter<MdxRenderer> {
    /// Create a converter with default configuration and the built-in engine.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: RenderEngine> Converter<E> {
    /// Set the conversion configuration.
    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    /// Swap the render engine.
    pub fn with_engine<F: RenderEngine>(self, engine: F) -> Converter<F> {
        Converter {
            config: self.config,
            engine,
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Convert one notebook.
    ///
    /// Documents are written next to `notebook_path`; assets go to the store
    /// under `root_dir`. The edit URL is built from the notebook path
    /// relative to `root_dir`.
    ///
    /// Loading, chapter front-matter and index failures abort the document.
    /// A section that fails to render is logged and listed in
    /// [`Conversion::skipped_sections`] while the remaining sections are
    /// still written.
    pub fn convert(&self, notebook_path: &Path, root_dir: &Path) -> Result<Conversion> {
        if !notebook_path.is_file() {
            return Err(Error::MissingInput(notebook_path.to_path_buf()));
        }
        let notebook = read_notebook(notebook_path)?;
        let name = file_stem(notebook_path);
        let out_dir = notebook_path.parent().unwrap_or(Path::new("."));

        let edit_url = self
            .config
            .github
            .as_ref()
            .map(|github| edit_url(github, &relative_path(notebook_path, root_dir)));

        let ctx = ConversionContext::new(root_dir.join(&self.config.static_subdir), &name, &self.config)
            .with_source_dir(out_dir);

        let layout = detect_layout(&notebook);
        info!(path = %notebook_path.display(), ?layout, "converting notebook");

        match layout {
            Layout::SinglePage => {
                self.convert_single(notebook, out_dir, &name, edit_url.as_deref(), &ctx)
            }
            Layout::MultiPage => {
                self.convert_multi(notebook, out_dir, &name, edit_url.as_deref(), &ctx)
            }
        }
    }

    /// Preprocess and render `notebook` under `frontmatter`.
    ///
    /// Assets are written to the store as a side effect; the document itself
    /// is returned, not written.
    pub fn render_document(
        &self,
        notebook: Notebook,
        frontmatter: &str,
        ctx: &ConversionContext<'_>,
    ) -> Result<String> {
        let notebook = run_stages(notebook, &default_stages(), ctx)?;
        let body = self.engine.render(&notebook, &self.config.template)?;
        Ok(format!("{}\n\n{}", frontmatter.trim_end(), body))
    }

    fn convert_single(
        &self,
        notebook: Notebook,
        out_dir: &Path,
        name: &str,
        edit_url: Option<&str>,
        ctx: &ConversionContext<'_>,
    ) -> Result<Conversion> {
        let frontmatter = extract_frontmatter(&notebook, edit_url);
        let cells = notebook
            .cells
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != frontmatter.source_cell)
            .map(|(_, cell)| cell.clone())
            .collect();

        let path = out_dir.join(format!("{name}.{}", self.config.output_extension));
        self.export(notebook.with_cells(cells), &frontmatter.text, &path, ctx)?;
        if self.config.write_ignore_files {
            append_to_ignore_file(&path)?;
        }

        Ok(Conversion {
            layout: Layout::SinglePage,
            outputs: vec![path],
            skipped_sections: Vec::new(),
        })
    }

    fn convert_multi(
        &self,
        notebook: Notebook,
        out_dir: &Path,
        name: &str,
        edit_url: Option<&str>,
        ctx: &ConversionContext<'_>,
    ) -> Result<Conversion> {
        let ext = &self.config.output_extension;
        let chapter_dir = out_dir.join(name);
        fs::create_dir_all(&chapter_dir)?;
        if self.config.write_ignore_files {
            write_directory_ignore(&chapter_dir, ext)?;
        }

        let frontmatter = extract_frontmatter(&notebook, edit_url);
        let mut outputs = Vec::new();

        let index_path = chapter_dir.join(format!("index.{ext}"));
        let index = index_cells(&notebook, frontmatter.source_cell);
        if index.is_empty() {
            fs::write(&index_path, format!("{}\n", frontmatter.text.trim_end()))?;
            info!(path = %index_path.display(), "created");
        } else {
            self.export(notebook.with_cells(index), &frontmatter.text, &index_path, ctx)?;
        }
        outputs.push(index_path);

        let section_edit_url = extract_edit_url(&frontmatter.text).or(edit_url.map(String::from));
        let sections = split_sections(&notebook, frontmatter.source_cell, self.config.pagination)?;
        if sections.is_empty() {
            warn!(document = %name, "no sections with content after pagebreaks");
        }

        let mut skipped_sections = Vec::new();
        for (number, section) in (1..).zip(sections) {
            let block = section_frontmatter(
                section.metadata_block.as_deref(),
                section_edit_url.as_deref(),
            );
            let path = chapter_dir.join(format!("autogen-page-{number}.{ext}"));

            match self.export(notebook.with_cells(section.cells), &block, &path, ctx) {
                Ok(()) => outputs.push(path),
                Err(e) => {
                    let e = Error::SectionRender {
                        section: number,
                        message: e.to_string(),
                    };
                    error!(document = %name, error = %e, "skipping section");
                    skipped_sections.push(number);
                }
            }
        }

        Ok(Conversion {
            layout: Layout::MultiPage,
            outputs,
            skipped_sections,
        })
    }

    fn export(
        &self,
        notebook: Notebook,
        frontmatter: &str,
        path: &Path,
        ctx: &ConversionContext<'_>,
    ) -> Result<()> {
        let document = self.render_document(notebook, frontmatter, ctx)?;
        fs::write(path, document)?;
        info!(path = %path.display(), "created");
        Ok(())
    }
}

/// Front-matter of a section page.
///
/// The section's own block wins; the edit URL is injected when known, and a
/// page with neither gets the default block.
fn section_frontmatter(block: Option<&str>, edit_url: Option<&str>) -> String {
    match (block, edit_url) {
        (Some(block), Some(url)) => add_edit_url(block, url),
        (None, Some(url)) => add_edit_url("", url),
        (Some(block), None) => format!("{}\n", block.trim_end()),
        (None, None) => DEFAULT_FRONTMATTER.to_string(),
    }
}

/// Notebook path relative to the project root, with `/` separators.
///
/// Both paths are resolved first, so `docs/a.ipynb` under root `.` gives
/// `docs/a.ipynb`.
fn relative_path(notebook_path: &Path, root_dir: &Path) -> String {
    let notebook = resolve_path(notebook_path);
    let root = resolve_path(root_dir);
    match notebook.strip_prefix(&root) {
        Ok(relative) => to_slash_path(relative),
        Err(_) => {
            warn!(
                path = %notebook.display(),
                root = %root.display(),
                "notebook outside root, using file name for edit url"
            );
            notebook_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        }
    }
}

/// Canonical form of an existing path, else its absolute form.
fn resolve_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
