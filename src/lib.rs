//! # nbdocs
//!
//! Converts Jupyter notebooks into MDX documents for a static documentation
//! site.
//!
//! ## Features
//!
//! - Single-page output, or one page per `# !pagebreak` section
//! - Chapter front-matter from a `# !chapter` raw cell
//! - `custom_edit_url` links back to the notebook on GitHub
//! - Embedded images and videos moved into a content-addressed asset store
//! - Escaping of fences and HTML so outputs survive the MDX compiler
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use nbdocs::{ConvertConfig, Converter, GithubRepo};
//!
//! let config = ConvertConfig::new().with_github(GithubRepo::new("octo", "docs"));
//! let converter = Converter::new().with_config(config);
//!
//! // One notebook
//! converter.convert(Path::new("docs/intro.ipynb"), Path::new("."))?;
//!
//! // Every notebook under the project root
//! let stats = converter.convert_all(Path::new("."))?;
//! println!("{}/{} converted", stats.success, stats.total);
//! # Ok::<(), nbdocs::Error>(())
//! ```
//!
//! ## Working with Notebooks
//!
//! The pipeline pieces are public and work on in-memory notebooks:
//!
//! ```
//! use nbdocs::markdown::{MdxRenderer, RenderEngine};
//! use nbdocs::model::{Cell, Notebook, Output};
//!
//! let notebook = Notebook::new(vec![
//!     Cell::markdown("# Hello"),
//!     Cell::code("print(1)").with_output(Output::stdout("1\n")),
//! ]);
//! let mdx = MdxRenderer::new().render(&notebook, "mdoutput").unwrap();
//! assert!(mdx.starts_with("# Hello\n\n```python\nprint(1)\n```"));
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod import;
pub mod markdown;
pub mod model;
pub mod preprocess;
pub(crate) mod util;

pub use config::{ConvertConfig, GithubRepo, PaginationMode};
pub use convert::{BatchStats, Conversion, Converter, Layout};
pub use error::{Error, Result};
pub use import::{parse_notebook, read_notebook};
pub use model::{Cell, CellKind, Notebook, Output};
