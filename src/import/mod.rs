//! Notebook importers.
//!
//! Only nbformat v4 JSON is supported; older notebooks must be upgraded with
//! `jupyter nbconvert --to notebook` first.

mod nbformat;

pub use nbformat::{parse_notebook, read_notebook};
