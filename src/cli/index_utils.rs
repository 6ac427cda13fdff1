//! Reading and writing stored buffers

use std::path::Path;

use anyhow::{Context, Result};

use crate::symbol::{unix_seconds, File, FileView};

/// Read a whole buffer from disk
pub fn read_buffer(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path))
}

/// Write a buffer, creating parent directories as needed
pub fn write_buffer(path: &str, buf: &[u8]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, buf).with_context(|| format!("Failed to write {}", path))
}

/// Open a stored buffer as a view
pub fn open_index<'a>(buf: &'a [u8], path: &str) -> Result<FileView<'a>> {
    FileView::open(buf).with_context(|| format!("{} is not a symbol index", path))
}

/// Read and fully decode a stored index
pub fn load_index(path: &str) -> Result<File> {
    let buf = read_buffer(path)?;
    let view = open_index(&buf, path)?;
    view.unmarshal()
        .with_context(|| format!("{} is corrupt", path))
}

/// Absolute form of a path, as recorded for real headers
pub fn canonicalize_path(path: &str) -> Result<String> {
    Ok(Path::new(path)
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", path))?
        .display()
        .to_string())
}

/// Filesystem mtime in unix seconds, if the file exists. Times before
/// the epoch are negative, as recorded in headers.
pub fn file_mtime(path: &str) -> Option<i64> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(unix_seconds)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_file_mtime_before_epoch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.h");
        let file = std::fs::File::create(&path).unwrap();
        file.set_modified(UNIX_EPOCH - Duration::from_secs(3600))
            .unwrap();
        drop(file);

        assert_eq!(file_mtime(path.to_str().unwrap()), Some(-3600));
    }

    #[test]
    fn test_file_mtime_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.h");
        assert_eq!(file_mtime(path.to_str().unwrap()), None);
    }

    #[test]
    fn test_open_index_borrows_buffer() {
        let buf = File::new("a.c", vec![]).serialize();
        let view = open_index(&buf, "a.idx").unwrap();
        assert_eq!(view.name().unwrap(), "a.c");
        assert!(open_index(&[], "empty.idx").is_err());
    }
}
