//! Assertion helpers for downloaded files

use std::path::Path;

/// Assert that the file at `path` holds exactly `expected`
///
/// Reports the first differing offset instead of dumping both buffers.
pub fn assert_file_eq(path: &Path, expected: &[u8]) {
    let actual = std::fs::read(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    assert_eq!(
        actual.len(),
        expected.len(),
        "length mismatch for {}",
        path.display()
    );
    if let Some(offset) = actual.iter().zip(expected).position(|(a, b)| a != b) {
        panic!("{} differs from expected at byte {offset}", path.display());
    }
}
