//! Conversion with paths given relative to the working directory.
//!
//! Kept in its own test binary because it changes the process working
//! directory.

use std::env;
use std::fs;
use std::path::Path;

use nbdocs::{ConvertConfig, Converter, GithubRepo};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_edit_url_keeps_directory_for_relative_paths() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("docs")).unwrap();
    let notebook = json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {},
        "cells": [
            {"cell_type": "raw", "metadata": {}, "source": "# !chapter\nchapter-title: Intro"},
            {"cell_type": "markdown", "metadata": {}, "source": "# Hello"}
        ]
    });
    fs::write(tmp.path().join("docs/intro.ipynb"), notebook.to_string()).unwrap();

    let previous = env::current_dir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    let converter = Converter::new()
        .with_config(ConvertConfig::new().with_github(GithubRepo::new("u", "r")));
    let result = converter.convert(Path::new("docs/intro.ipynb"), Path::new("."));
    let doc = fs::read_to_string("docs/intro.mdx");

    env::set_current_dir(previous).unwrap();

    result.unwrap();
    let doc = doc.unwrap();
    assert!(
        doc.contains("custom_edit_url: \"https://github.com/u/r/blob/main/docs/intro.ipynb\""),
        "unexpected front-matter:\n{doc}"
    );
}
