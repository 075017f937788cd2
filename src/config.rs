//! Conversion configuration.
//!
//! Everything that used to be a process-wide constant (GitHub repository,
//! asset locations, public URL prefixes) lives here and is injected into the
//! [`Converter`](crate::convert::Converter).

use std::path::PathBuf;

/// Token marking the chapter-level front-matter directive cell.
pub const CHAPTER_MARKER: &str = "# !chapter";

/// Token marking a page break directive cell.
pub const PAGEBREAK_MARKER: &str = "# !pagebreak";

/// Front-matter delimiter line.
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Extension of source notebooks.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Default asset store location, relative to the project root.
pub const DEFAULT_STATIC_SUBDIR: &str = "_intermediate/static/img";

/// Public prefix for images referenced from narrative cells.
pub const MARKDOWN_IMAGE_PREFIX: &str = "/notebooks";

/// Public prefix for images and videos found directly in output payloads.
pub const OUTPUT_MEDIA_PREFIX: &str = "/img/notebooks";

/// Public prefix for videos embedded as `<source>` tags in HTML outputs.
///
/// Differs from [`OUTPUT_MEDIA_PREFIX`]; both forms are served by the site.
pub const HTML_VIDEO_PREFIX: &str = "/docs/img/notebooks";

/// Template handed to the render engine.
pub const DEFAULT_TEMPLATE: &str = "mdoutput";

/// GitHub repository used to build "edit this page" links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub user: String,
    pub repo: String,
    pub branch: String,
}

impl GithubRepo {
    pub fn new(user: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            repo: repo.into(),
            branch: "main".to_string(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Base URL that a project-relative path is appended to.
    pub fn blob_base(&self) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/",
            self.user, self.repo, self.branch
        )
    }
}

/// How the paginator treats marker tokens that are not the leading content
/// of their cell, or appear more than once in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaginationMode {
    /// Log a diagnostic and keep going.
    #[default]
    Lenient,
    /// Reject the document with [`Error::AmbiguousMarker`](crate::Error::AmbiguousMarker).
    Strict,
}

/// Configuration for notebook conversion.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Repository for edit URLs. No `custom_edit_url` is emitted when unset.
    pub github: Option<GithubRepo>,
    /// Asset store root, relative to the project root.
    pub static_subdir: PathBuf,
    /// Extension of emitted documents (without the dot).
    pub output_extension: String,
    /// Extension that narrative links to notebooks are rewritten to.
    pub link_extension: String,
    pub markdown_image_prefix: String,
    pub output_media_prefix: String,
    pub html_video_prefix: String,
    /// Template identifier passed to the render engine.
    pub template: String,
    pub pagination: PaginationMode,
    /// Maintain `.gitignore` entries for generated documents.
    pub write_ignore_files: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            github: None,
            static_subdir: PathBuf::from(DEFAULT_STATIC_SUBDIR),
            output_extension: "mdx".to_string(),
            link_extension: "md".to_string(),
            markdown_image_prefix: MARKDOWN_IMAGE_PREFIX.to_string(),
            output_media_prefix: OUTPUT_MEDIA_PREFIX.to_string(),
            html_video_prefix: HTML_VIDEO_PREFIX.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            pagination: PaginationMode::default(),
            write_ignore_files: true,
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_github(mut self, github: GithubRepo) -> Self {
        self.github = Some(github);
        self
    }

    pub fn with_static_subdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_subdir = dir.into();
        self
    }

    pub fn with_output_extension(mut self, ext: impl Into<String>) -> Self {
        self.output_extension = ext.into();
        self
    }

    pub fn with_pagination(mut self, mode: PaginationMode) -> Self {
        self.pagination = mode;
        self
    }

    pub fn with_ignore_files(mut self, enabled: bool) -> Self {
        self.write_ignore_files = enabled;
        self
    }
}
