//! Conversion driver: notebook files in, MDX documents out.
//!
//! # Architecture
//!
//! A notebook goes through these steps:
//! - load the nbformat JSON ([`crate::import`])
//! - pick a [`Layout`] from the presence of pagebreak directives
//! - build the chapter front-matter ([`extract_frontmatter`])
//! - split into sections when paginated ([`split_sections`])
//! - preprocess, render and write each document ([`Converter`])
//!
//! Generated documents are listed in `.gitignore` files unless
//! [`ConvertConfig::write_ignore_files`](crate::ConvertConfig::write_ignore_files)
//! is off.

mod assemble;
mod batch;
mod frontmatter;
mod ignore;
mod paginate;

pub use assemble::{Conversion, Converter, Layout, detect_layout};
pub use batch::{BatchStats, find_notebooks};
pub use frontmatter::{
    DEFAULT_FRONTMATTER, add_edit_url, edit_url, ensure_delimited, extract_edit_url,
    extract_frontmatter, rename_legacy_keys,
};
pub use ignore::{append_to_ignore_file, write_directory_ignore};
pub use paginate::{has_pagebreaks, index_cells, split_marker_content, split_sections};
