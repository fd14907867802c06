//! On-disk task result cache
//!
//! One JSON file per task at `<root>/<job>/<task>.json`. A missing file is a
//! cache miss; any other I/O failure is reported.

use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PipelineError, Result};

pub fn cache_file(root: &Path, job: &str, task: &str) -> PathBuf {
    root.join(job).join(format!("{}.json", task))
}

/// Reads a cached result, `None` on a miss
pub fn lookup(path: &Path) -> Result<Option<Value>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PipelineError::CacheIo {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| PipelineError::CacheFormat {
            path: path.to_path_buf(),
            source,
        })
}

pub fn store(path: &Path, value: &Value) -> Result<()> {
    let io_error = |source: std::io::Error| PipelineError::CacheIo {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let bytes = serde_json::to_vec(value).map_err(|source| PipelineError::CacheFormat {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, bytes).map_err(io_error)?;

    debug!("Cached task result at {}", path.display());
    Ok(())
}

/// Removes the whole cache; a cache that does not exist is already clear
pub fn clear(root: &Path) -> Result<()> {
    remove_dir_if_exists(root).map_err(|source| PipelineError::CacheIo {
        path: root.to_path_buf(),
        source,
    })
}

pub(crate) fn remove_dir_if_exists(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_file_layout() {
        let path = cache_file(Path::new("tasks"), "build", "compile");
        assert_eq!(path, PathBuf::from("tasks/build/compile.json"));
    }

    #[test]
    fn test_store_then_lookup() {
        let tmp = tempfile::tempdir().unwrap();
        let path = cache_file(tmp.path(), "build", "compile");

        assert_eq!(lookup(&path).unwrap(), None);

        store(&path, &json!({"artifact": "app.tar"})).unwrap();
        assert_eq!(lookup(&path).unwrap(), Some(json!({"artifact": "app.tar"})));
    }

    #[test]
    fn test_lookup_propagates_other_io_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = cache_file(tmp.path(), "build", "compile");
        std::fs::create_dir_all(&path).unwrap();

        let err = lookup(&path).unwrap_err();
        assert!(matches!(err, PipelineError::CacheIo { .. }));
    }

    #[test]
    fn test_lookup_rejects_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            lookup(&path),
            Err(PipelineError::CacheFormat { .. })
        ));
    }

    #[test]
    fn test_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("tasks");
        store(&cache_file(&root, "a", "b"), &json!(1)).unwrap();

        clear(&root).unwrap();
        assert!(!root.exists());

        // Clearing twice is fine
        clear(&root).unwrap();
    }
}
