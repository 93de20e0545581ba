// Shared test helpers for report fixtures and database setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::io::Write;
use std::path::{Path, PathBuf};

use backlink_intel::Config;

/// Header row in the layout of an Ahrefs backlink export.
#[allow(dead_code)] // Used by other test files
pub const AHREFS_HEADER: &str =
    "Referring page URL,Domain rating,Domain traffic,Nofollow,UGC,Sponsored,First seen,Last seen,External links,Anchor";

/// Writes a delimited report with `header` and `rows` into `dir`.
#[allow(dead_code)]
pub fn write_report(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create report fixture");
    writeln!(file, "{header}").expect("Failed to write header");
    for row in rows {
        writeln!(file, "{row}").expect("Failed to write row");
    }
    path
}

/// Configuration pointing at a fresh database inside `dir`.
#[allow(dead_code)]
pub fn test_config(dir: &Path) -> Config {
    Config {
        db_path: dir.join("intel.db"),
        batch_size: 2,
        ..Default::default()
    }
}

/// The two-link report used by the end-to-end scenario.
#[allow(dead_code)]
pub fn scenario_rows() -> Vec<&'static str> {
    vec![
        "https://Blog.Example.com/post,62,1200,false,false,false,2024-01-10,2024-03-01,15,guide",
        "http://www.blog.example.com/other,62,1200,true,false,false,2024-01-10,2024-03-01,15,",
    ]
}
