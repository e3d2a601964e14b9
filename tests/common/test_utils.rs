//! Test utilities for temporary files and sample tables

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tallyrs::{na, val, FieldType, Schema, Table};

static TEST_FILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique path in the system temp directory
pub fn test_temp_path(test_name: &str, extension: &str) -> PathBuf {
    let counter = TEST_FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let filename = format!(
        "tallyrs_test_{}_{}_{}.{}",
        test_name,
        std::process::id(),
        counter,
        extension
    );
    env::temp_dir().join(filename)
}

/// RAII wrapper for temporary test files; the file is deleted on drop
pub struct TempTestFile {
    path: PathBuf,
}

impl TempTestFile {
    pub fn new(test_name: &str, extension: &str) -> Self {
        TempTestFile {
            path: test_temp_path(test_name, extension),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to the file
    pub fn write(&self, contents: &str) {
        fs::write(&self.path, contents).expect("failed to write test file");
    }
}

impl Drop for TempTestFile {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// A temp CSV file with the given lines joined by newlines
pub fn create_test_csv(test_name: &str, lines: &[&str]) -> TempTestFile {
    let file = TempTestFile::new(test_name, "csv");
    file.write(&(lines.join("\n") + "\n"));
    file
}

/// `{sex: M, weight: 10}, {sex: F, weight: 20}, {sex: NA, weight: 30}`
pub fn sex_weight_table() -> Table {
    let schema = Schema::from_pairs(&[("sex", FieldType::Text), ("weight", FieldType::Int)]).unwrap();
    Table::from_rows(
        schema,
        vec![
            vec![val("M"), val(10)],
            vec![val("F"), val(20)],
            vec![na(), val(30)],
        ],
    )
    .unwrap()
}

/// A small survey: species, sex, plot, weight (with gaps)
pub fn surveys_table() -> Table {
    let schema = Schema::from_pairs(&[
        ("species_id", FieldType::Text),
        ("sex", FieldType::Text),
        ("plot_id", FieldType::Int),
        ("weight", FieldType::Float),
    ])
    .unwrap();
    Table::from_rows(
        schema,
        vec![
            vec![val("DM"), val("M"), val(2), val(40.0)],
            vec![val("DM"), val("F"), val(3), val(48.0)],
            vec![val("PE"), val("M"), val(2), val(20.0)],
            vec![val("DO"), na(), val(7), na()],
            vec![val("DM"), val("M"), val(2), val(44.0)],
            vec![val("PE"), val("F"), val(3), val(24.0)],
            vec![na(), val("F"), val(1), val(12.0)],
            vec![val("DO"), val("F"), val(7), val(52.0)],
        ],
    )
    .unwrap()
}

/// One `species` field where species `s{i}` appears `counts[i]` times,
/// interleaved so first-seen order is `s0, s1, ...`
pub fn species_table(counts: &[usize]) -> Table {
    let schema = Schema::from_pairs(&[("species", FieldType::Text)]).unwrap();
    let max = counts.iter().copied().max().unwrap_or(0);
    let mut rows = Vec::new();
    for round in 0..max {
        for (i, &count) in counts.iter().enumerate() {
            if round < count {
                rows.push(vec![val(format!("s{}", i))]);
            }
        }
    }
    Table::from_rows(schema, rows).unwrap()
}
