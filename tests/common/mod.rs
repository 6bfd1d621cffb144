#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Source headers in the layout contestants upload.
pub const SOURCE_HEADER: &str = "Contestant id,Name,Age,rank,email,gender,number of clicks/ points,Date of Participation,Location,Profile Creation Date,Device/Browser Info";

/// One contestant row for [`contestant_csv`].
pub struct Row<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub age: &'a str,
    pub gender: &'a str,
    pub clicks: &'a str,
    pub date: &'a str,
    pub location: &'a str,
}

impl<'a> Row<'a> {
    pub const fn new(
        id: &'a str,
        clicks: &'a str,
        date: &'a str,
        gender: &'a str,
        location: &'a str,
    ) -> Self {
        Self {
            id,
            name: id,
            age: "30",
            gender,
            clicks,
            date,
            location,
        }
    }
}

pub fn contestant_csv(rows: &[Row<'_>]) -> String {
    let mut text = String::from(SOURCE_HEADER);
    for (idx, row) in rows.iter().enumerate() {
        text.push('\n');
        text.push_str(&format!(
            "{},{},{},{},{}@example.com,{},{},{},{},2023-06-01,Chrome",
            row.id,
            row.name,
            row.age,
            idx + 1,
            row.id.to_lowercase(),
            row.gender,
            row.clicks,
            row.date,
            row.location
        ));
    }
    text.push('\n');
    text
}

/// The three-contestant scenario used across the pipeline tests.
pub fn example_csv() -> String {
    contestant_csv(&[
        Row::new("A", "50", "2024-01-05", "M", "NY"),
        Row::new("B", "50", "2024-02-10", "F", "LA"),
        Row::new("C", "30", "2024-01-20", "M", "NY"),
    ])
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}
