//! Test fixtures for source and deployment trees.
//!
//! Provides a throwaway webapp layout so sync behavior can be tested
//! against real files and real modification times.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::FilterConfig;

/// Temporary source tree plus deployment tree.
///
/// Both directories are removed when the fixture is dropped.
pub struct WebappDirs {
    _temp_dir: tempfile::TempDir,
    /// Editable source tree (stands in for `src/main/webapp`)
    pub source: PathBuf,
    /// Deployed tree the host serves
    pub deploy: PathBuf,
}

impl WebappDirs {
    /// Creates empty source and deployment directories.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails. This is acceptable in
    /// test fixtures where failures indicate environment issues.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("webapp");
        let deploy = temp_dir.path().join("deploy");

        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&deploy).unwrap();

        Self {
            _temp_dir: temp_dir,
            source,
            deploy,
        }
    }

    /// Enabled filter configuration pointing at these directories.
    pub fn config(&self) -> FilterConfig {
        FilterConfig::new(&self.deploy)
            .with_enabled(true)
            .with_source_root(&self.source)
    }

    /// Path of a resource in the source tree.
    pub fn source_path(&self, resource: &str) -> PathBuf {
        self.source.join(resource.trim_start_matches('/'))
    }

    /// Path of a resource in the deployment tree.
    pub fn deploy_path(&self, resource: &str) -> PathBuf {
        self.deploy.join(resource.trim_start_matches('/'))
    }

    /// Writes a source file, creating parent directories in both trees.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_source(&self, resource: &str, content: &str) -> PathBuf {
        let path = self.source_path(resource);
        create_parent(&path);
        create_parent(&self.deploy_path(resource));
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Writes a deployed file.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_deployed(&self, resource: &str, content: &str) -> PathBuf {
        let path = self.deploy_path(resource);
        create_parent(&path);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Reads a deployed file, `None` when it does not exist.
    pub fn read_deployed(&self, resource: &str) -> Option<String> {
        std::fs::read_to_string(self.deploy_path(resource)).ok()
    }

    /// Makes the source copy newer than the deployed one by `by`.
    ///
    /// # Panics
    ///
    /// Panics if either file is missing.
    pub fn make_source_newer(&self, resource: &str, by: Duration) {
        let now = SystemTime::now();
        set_modified(&self.deploy_path(resource), now - by);
        set_modified(&self.source_path(resource), now);
    }

    /// Makes the deployed copy newer than the source by `by`.
    ///
    /// # Panics
    ///
    /// Panics if either file is missing.
    pub fn make_deployed_newer(&self, resource: &str, by: Duration) {
        let now = SystemTime::now();
        set_modified(&self.source_path(resource), now - by);
        set_modified(&self.deploy_path(resource), now);
    }
}

impl Default for WebappDirs {
    fn default() -> Self {
        Self::new()
    }
}

/// Sets a file's modification time.
///
/// # Panics
///
/// Panics if the file cannot be opened or its timestamp cannot be set.
pub fn set_modified(path: &Path, time: SystemTime) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}

fn create_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webapp_dirs() {
        let dirs = WebappDirs::new();

        assert!(dirs.source.is_dir());
        assert!(dirs.deploy.is_dir());
    }

    #[test]
    fn test_write_source_prepares_deploy_parent() {
        let dirs = WebappDirs::new();
        dirs.write_source("/css/site.css", "body {}");

        assert!(dirs.source_path("/css/site.css").is_file());
        assert!(dirs.deploy.join("css").is_dir());
        assert_eq!(dirs.read_deployed("/css/site.css"), None);
    }
}
