//! Request path resolution and source/destination mapping

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Per-request view of which resource is being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Logical resource path, e.g. `/css/site.css`
    pub requested_path: String,
}

impl RequestContext {
    /// Resolves the requested path for one request.
    ///
    /// An include target set by the host wins over the request's own path.
    /// The request path is percent-decoded; an undecodable path is used as-is.
    pub fn resolve(include_target: Option<&str>, request_path: &str) -> Self {
        let requested_path = match include_target {
            Some(target) => target.to_string(),
            None => urlencoding::decode(request_path)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| request_path.to_string()),
        };

        Self { requested_path }
    }

    /// Extension of the requested resource, see [`extension_of`].
    pub fn extension(&self) -> &str {
        extension_of(&self.requested_path)
    }

    /// Whether placeholder substitution applies to this resource.
    pub fn is_html(&self) -> bool {
        self.requested_path.ends_with(".html")
    }

    /// Maps the requested path onto both trees.
    pub fn sync_paths(&self, source_root: &Path, destination_root: &Path) -> SyncPaths {
        SyncPaths {
            src: concat_path(source_root, &self.requested_path),
            dest: concat_path(destination_root, &self.requested_path),
        }
    }
}

/// Source and destination files for one requested resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPaths {
    /// File in the editable source tree
    pub src: PathBuf,
    /// File in the deployed tree
    pub dest: PathBuf,
}

/// Returns the text after the last `.` of the final path segment.
///
/// Empty when there is no dot, or when the last dot sits in a directory
/// name (`/v1.2/readme`). Case is preserved.
pub fn extension_of(path: &str) -> &str {
    let Some(dot) = path.rfind('.') else {
        return "";
    };

    match path.rfind(['/', '\\']) {
        Some(separator) if separator > dot => "",
        _ => &path[dot + 1..],
    }
}

// Plain concatenation: the requested path already carries its leading slash.
fn concat_path(root: &Path, requested_path: &str) -> PathBuf {
    let mut joined = OsString::from(root.as_os_str());
    joined.push(requested_path);
    PathBuf::from(joined)
}
