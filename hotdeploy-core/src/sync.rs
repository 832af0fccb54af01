//! Copy-on-stale resource synchronization.
//!
//! Mirrors a requested resource from the source tree into the deployed tree
//! when the deployed copy is missing or older, then fills in `${name}`
//! placeholders for HTML pages.

use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use tokio::fs;
use tracing::debug;

use crate::config::FilterConfig;
use crate::lock::PathLocks;
use crate::path::{RequestContext, SyncPaths};
use crate::placeholder::substitute;

/// Errors raised while syncing a resource.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Filesystem operation on a source or destination file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File the operation was touching
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        move |source| SyncError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Why a request left the filesystem alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The filter is switched off
    Disabled,
    /// The resource extension is not watched
    UnwatchedExtension,
    /// Nothing exists at the source path
    MissingSource,
}

/// Result of syncing one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Copy logic did not apply
    Skipped(SkipReason),
    /// Deployed copy is at least as new as the source
    UpToDate,
    /// Source was copied over the destination
    Copied {
        /// Whether placeholders were filled in afterwards
        substituted: bool,
    },
}

impl SyncOutcome {
    /// Whether the destination file was rewritten.
    pub fn copied(self) -> bool {
        matches!(self, SyncOutcome::Copied { .. })
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::Skipped(SkipReason::Disabled) => write!(f, "skipped (disabled)"),
            SyncOutcome::Skipped(SkipReason::UnwatchedExtension) => {
                write!(f, "skipped (extension not watched)")
            }
            SyncOutcome::Skipped(SkipReason::MissingSource) => write!(f, "skipped (no source)"),
            SyncOutcome::UpToDate => write!(f, "up to date"),
            SyncOutcome::Copied { substituted: true } => write!(f, "copied, placeholders filled"),
            SyncOutcome::Copied { substituted: false } => write!(f, "copied"),
        }
    }
}

/// Resource synchronizer shared by every request.
///
/// Cheap to clone: configuration and lock table live behind `Arc`s.
#[derive(Debug, Clone)]
pub struct ResourceSync {
    config: Arc<FilterConfig>,
    locks: Arc<PathLocks>,
}

impl ResourceSync {
    /// Creates a synchronizer for the given configuration.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config: Arc::new(config),
            locks: Arc::new(PathLocks::new()),
        }
    }

    /// Whether the filter is switched on.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Brings the deployed copy of one resource up to date.
    ///
    /// Copies when the destination is missing or its modification time is
    /// strictly older than the source's (millisecond resolution). HTML pages
    /// get their placeholders filled only when a copy happened, so a page
    /// is never substituted twice.
    ///
    /// # Errors
    /// - `SyncError::Io` - Reading metadata, copying, or rewriting failed
    pub async fn sync(&self, context: &RequestContext) -> Result<SyncOutcome, SyncError> {
        if !self.config.enabled {
            return Ok(SyncOutcome::Skipped(SkipReason::Disabled));
        }

        if !self.config.watches(context.extension()) {
            debug!("Not watched: {}", context.requested_path);
            return Ok(SyncOutcome::Skipped(SkipReason::UnwatchedExtension));
        }

        let paths = context.sync_paths(&self.config.source_root, &self.config.destination_root);
        let _guard = self.locks.lock(&paths.dest).await;

        if !exists(&paths.src).await? {
            debug!("No source for {} at {}", context.requested_path, paths.src.display());
            return Ok(SyncOutcome::Skipped(SkipReason::MissingSource));
        }

        if !is_stale(&paths).await? {
            return Ok(SyncOutcome::UpToDate);
        }

        fs::copy(&paths.src, &paths.dest)
            .await
            .map_err(SyncError::io(&paths.dest))?;
        debug!(
            "Copied {} -> {}",
            paths.src.display(),
            paths.dest.display()
        );

        let substituted = context.is_html();
        if substituted {
            self.fill_placeholders(&paths.dest).await?;
        }

        Ok(SyncOutcome::Copied { substituted })
    }

    async fn fill_placeholders(&self, dest: &Path) -> Result<(), SyncError> {
        let bytes = fs::read(dest).await.map_err(SyncError::io(dest))?;
        let content = String::from_utf8_lossy(&bytes);
        let filtered = substitute(&content, &self.config.variables);

        fs::write(dest, filtered).await.map_err(SyncError::io(dest))?;
        debug!("Filled placeholders in {}", dest.display());
        Ok(())
    }
}

async fn exists(path: &Path) -> Result<bool, SyncError> {
    fs::try_exists(path).await.map_err(SyncError::io(path))
}

async fn is_stale(paths: &SyncPaths) -> Result<bool, SyncError> {
    if !exists(&paths.dest).await? {
        return Ok(true);
    }

    let src_modified = modified_millis(&paths.src).await?;
    let dest_modified = modified_millis(&paths.dest).await?;
    Ok(src_modified > dest_modified)
}

async fn modified_millis(path: &Path) -> Result<u128, SyncError> {
    let modified = fs::metadata(path)
        .await
        .and_then(|metadata| metadata.modified())
        .map_err(SyncError::io(path))?;

    // Pre-epoch timestamps collapse to zero
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::test_fixtures::{WebappDirs, set_modified};

    fn syncer(dirs: &WebappDirs, variables: &[(&str, &str)]) -> ResourceSync {
        ResourceSync::new(dirs.config().with_variables(variables.iter().copied()))
    }

    fn request(path: &str) -> RequestContext {
        RequestContext::resolve(None, path)
    }

    #[tokio::test]
    async fn test_disabled_skips_everything() {
        let dirs = WebappDirs::new();
        dirs.write_source("/a.css", "body {}");
        let sync = ResourceSync::new(dirs.config().with_enabled(false));

        let outcome = sync.sync(&request("/a.css")).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::Disabled));
        assert_eq!(dirs.read_deployed("/a.css"), None);
    }

    #[tokio::test]
    async fn test_copies_when_destination_missing() {
        let dirs = WebappDirs::new();
        dirs.write_source("/a.css", "body {}");

        let outcome = syncer(&dirs, &[]).sync(&request("/a.css")).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Copied { substituted: false });
        assert_eq!(dirs.read_deployed("/a.css").as_deref(), Some("body {}"));
    }

    #[tokio::test]
    async fn test_unwatched_extension_not_copied() {
        let dirs = WebappDirs::new();
        dirs.write_source("/data.json", "{}");

        let outcome = syncer(&dirs, &[]).sync(&request("/data.json")).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::UnwatchedExtension));
        assert_eq!(dirs.read_deployed("/data.json"), None);
    }

    #[tokio::test]
    async fn test_missing_source_is_not_an_error() {
        let dirs = WebappDirs::new();

        let outcome = syncer(&dirs, &[]).sync(&request("/gone.js")).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::MissingSource));
    }

    #[tokio::test]
    async fn test_newer_destination_left_alone() {
        let dirs = WebappDirs::new();
        dirs.write_source("/a.txt", "new source");
        dirs.write_deployed("/a.txt", "deployed");
        dirs.make_deployed_newer("/a.txt", Duration::from_secs(60));

        let outcome = syncer(&dirs, &[]).sync(&request("/a.txt")).await.unwrap();

        assert_eq!(outcome, SyncOutcome::UpToDate);
        assert_eq!(dirs.read_deployed("/a.txt").as_deref(), Some("deployed"));
    }

    #[tokio::test]
    async fn test_equal_timestamps_are_up_to_date() {
        let dirs = WebappDirs::new();
        let src = dirs.write_source("/a.txt", "source");
        let dest = dirs.write_deployed("/a.txt", "deployed");
        let stamp = SystemTime::now() - Duration::from_secs(10);
        set_modified(&src, stamp);
        set_modified(&dest, stamp);

        let outcome = syncer(&dirs, &[]).sync(&request("/a.txt")).await.unwrap();

        assert_eq!(outcome, SyncOutcome::UpToDate);
    }

    #[tokio::test]
    async fn test_stale_destination_overwritten() {
        let dirs = WebappDirs::new();
        dirs.write_source("/a.js", "short");
        dirs.write_deployed("/a.js", "a much longer stale deployment");
        dirs.make_source_newer("/a.js", Duration::from_secs(60));

        let outcome = syncer(&dirs, &[]).sync(&request("/a.js")).await.unwrap();

        assert!(outcome.copied());
        assert_eq!(dirs.read_deployed("/a.js").as_deref(), Some("short"));
    }

    #[tokio::test]
    async fn test_html_placeholders_filled_once() {
        let dirs = WebappDirs::new();
        dirs.write_source("/index.html", "Version: ${pom.version} ${other}");
        let sync = syncer(&dirs, &[("pom.version", "1.0.0-SNAPSHOT")]);

        let first = sync.sync(&request("/index.html")).await.unwrap();
        let second = sync.sync(&request("/index.html")).await.unwrap();

        assert_eq!(first, SyncOutcome::Copied { substituted: true });
        assert_eq!(second, SyncOutcome::UpToDate);
        assert_eq!(
            dirs.read_deployed("/index.html").as_deref(),
            Some("Version: 1.0.0-SNAPSHOT ${other}")
        );
    }

    #[tokio::test]
    async fn test_htm_not_substituted() {
        let dirs = WebappDirs::new();
        dirs.write_source("/page.htm", "${pom.version}");

        let outcome = syncer(&dirs, &[("pom.version", "1")])
            .sync(&request("/page.htm"))
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Copied { substituted: false });
        assert_eq!(dirs.read_deployed("/page.htm").as_deref(), Some("${pom.version}"));
    }

    #[tokio::test]
    async fn test_missing_destination_directory_surfaces_io_error() {
        let dirs = WebappDirs::new();
        dirs.write_source("/css/site.css", "body {}");
        std::fs::remove_dir(dirs.deploy.join("css")).unwrap();

        let result = syncer(&dirs, &[]).sync(&request("/css/site.css")).await;

        assert!(matches!(result, Err(SyncError::Io { .. })));
    }
}
