//! Scratch directories for tests that write catalogs, cubes or exports.

/// A temporary directory removed when the returned guard is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("itslive-test-")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_test_dir() {
        let path = {
            let dir = temp_test_dir();
            assert!(dir.path().is_dir());
            assert!(dir.path().to_string_lossy().contains("itslive-test-"));
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
