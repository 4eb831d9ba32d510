#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use sales_insights::data::{CellValue, Dataset};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

pub fn num(value: f64) -> CellValue {
    CellValue::Number(value)
}

pub fn dataset(headers: &[&str], rows: Vec<Vec<CellValue>>) -> Dataset {
    Dataset::new(headers.iter().map(|h| h.to_string()).collect(), rows)
}

/// Three months of orders whose monthly revenue is 100, 150 and 90.
pub const QUARTER_SALES_CSV: &str = "\
Order ID,Order Date,Product Name,Quantity,Unit Price
1001,2024-01-05,Widget,4,20
1002,2024-01-19,Gadget,2,10
1003,2024-02-02,Widget,5,20
1004,2024-02-14,Gizmo,10,5
1005,2024-03-09,Gadget,9,10
";
