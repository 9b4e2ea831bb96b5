//! In-memory filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::ports::filesystem::FileSystem;

/// Filesystem held entirely in memory. Directories exist implicitly
/// whenever some file lives beneath them.
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.get(path).cloned().ok_or_else(|| format!("File not found: {}", path.display()).into())
    }

    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        files.contains_key(path) || files.keys().any(|k| k.starts_with(path) && k != path)
    }

    fn list_dir(
        &self,
        path: &Path,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = files
            .keys()
            .filter_map(|k| {
                let rest = k.strip_prefix(path).ok()?;
                rest.components().next().map(|c| c.as_os_str().to_string_lossy().into_owned())
            })
            .collect();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_and_implicit_directories() {
        let fs = MemoryFileSystem::new();
        fs.write(Path::new("/store/plans/a.yaml"), "a").unwrap();
        fs.write(Path::new("/store/plans/b.yaml"), "b").unwrap();
        fs.write(Path::new("/store/validations/p/t.yaml"), "v").unwrap();

        assert_eq!(fs.list_dir(Path::new("/store/plans")).unwrap(), vec!["a.yaml", "b.yaml"]);
        assert_eq!(fs.list_dir(Path::new("/store")).unwrap(), vec!["plans", "validations"]);
        assert!(fs.exists(Path::new("/store/validations")));
        assert!(!fs.exists(Path::new("/elsewhere")));
    }

    #[test]
    fn missing_file_is_an_error() {
        let fs = MemoryFileSystem::new();
        assert!(fs.read_to_string(Path::new("/nope.yaml")).is_err());
    }
}
