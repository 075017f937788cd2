//! Pure markdown generation from a notebook.
//!
//! This module separates pure text logic from I/O:
//!
//! - [`escape`]: string transformations applied to cell sources and outputs
//! - [`render`]: the render engine seam and the built-in MDX template
//!
//! The conversion layer ([`crate::convert`]) handles I/O orchestration,
//! calling these pure functions to generate content.

mod escape;
mod render;

pub use escape::{
    ESCAPED_FENCE, escape_backticks, escape_html, escape_output_text, fix_heading_level,
    rewrite_notebook_links,
};
pub use render::{MdxRenderer, RenderEngine};
