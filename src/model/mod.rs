//! Core data model for notebook conversion.
//!
//! This module contains:
//! - The notebook container with its cells and outputs
//! - Typed cell metadata (recognized flags plus a pass-through bag)
//! - Sections and front-matter produced during pagination

mod notebook;
mod section;

pub use notebook::{Cell, CellKind, CellMetadata, MimeBundle, Notebook, Output, Payload};
pub use section::{Frontmatter, Section};
