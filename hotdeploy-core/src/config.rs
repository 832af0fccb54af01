//! Filter configuration for Hotdeploy.
//!
//! Built once at startup from host-supplied init parameters and shared
//! read-only by every request afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Init parameter holding the enable flag.
pub const ENABLED_PARAM: &str = "enabled";

/// Init parameter holding the `key=value,key=value` substitution list.
pub const FILTER_VARIABLES_PARAM: &str = "filterVariables";

/// Relative path of the source tree that is mirrored into the deployment.
pub const DEFAULT_SOURCE_ROOT: &str = "src/main/webapp";

/// File extensions the filter watches.
pub const DEFAULT_EXTENSIONS: [&str; 11] = [
    "jsp", "css", "html", "htm", "gif", "jpg", "jpeg", "png", "txt", "xhtml", "js",
];

/// Host-supplied init parameters, keyed by parameter name.
pub type InitParams = HashMap<String, String>;

/// Immutable configuration of the resource sync filter.
///
/// Cloned into an `Arc` by the web layer; nothing mutates it after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Whether the filter does anything at all
    pub enabled: bool,
    /// Placeholder name to replacement text, applied to copied `.html` files
    pub variables: BTreeMap<String, String>,
    /// Extensions (without the dot) eligible for copying
    pub extensions: BTreeSet<String>,
    /// Root of the editable source tree
    pub source_root: PathBuf,
    /// Root of the deployed tree the host serves from
    pub destination_root: PathBuf,
}

impl FilterConfig {
    /// Creates a disabled configuration with default extensions and source root.
    pub fn new(destination_root: impl Into<PathBuf>) -> Self {
        Self {
            enabled: false,
            variables: BTreeMap::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            source_root: PathBuf::from(DEFAULT_SOURCE_ROOT),
            destination_root: destination_root.into(),
        }
    }

    /// Builds the configuration from host init parameters.
    ///
    /// Never fails: a missing or unparsable `enabled` means disabled, and
    /// malformed `filterVariables` entries are skipped silently.
    pub fn from_init_params(params: &InitParams, destination_root: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(destination_root);
        config.enabled = parse_enabled(params.get(ENABLED_PARAM).map(String::as_str));
        if let Some(raw) = params.get(FILTER_VARIABLES_PARAM) {
            config.variables = parse_filter_variables(raw);
        }
        config
    }

    /// Sets the enable flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replaces the substitution variables.
    pub fn with_variables<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.variables = variables
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    /// Overrides the source tree root.
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = source_root.into();
        self
    }

    /// Checks whether an extension (without the dot) is watched.
    ///
    /// Matching is case-sensitive: `PNG` is not `png`.
    pub fn watches(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Destination root as a path.
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }
}

/// Parses the enable flag with standard boolean semantics.
///
/// Only a case-insensitive `"true"` enables; whitespace is not trimmed.
pub fn parse_enabled(raw: Option<&str>) -> bool {
    raw.is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

/// Parses `key=value,key=value` into a variable map.
///
/// Each entry must split into exactly two `=`-separated pieces once trailing
/// empty pieces are dropped, so `a=b=c` and `key=` are both skipped while
/// `key= ` maps `key` to an empty string. Keys and values are trimmed and a
/// repeated key keeps its last value.
pub fn parse_filter_variables(raw: &str) -> BTreeMap<String, String> {
    let mut variables = BTreeMap::new();

    for pair in raw.split(',') {
        let mut pieces: Vec<&str> = pair.split('=').collect();
        while pieces.last().is_some_and(|piece| piece.is_empty()) {
            pieces.pop();
        }

        if let [key, value] = pieces.as_slice() {
            variables.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    variables
}

/// Collects init parameters from `HOTDEPLOY_ENABLED` and `HOTDEPLOY_FILTER_VARIABLES`.
pub fn init_params_from_env() -> InitParams {
    let mut params = InitParams::new();

    if let Ok(enabled) = std::env::var("HOTDEPLOY_ENABLED") {
        params.insert(ENABLED_PARAM.to_string(), enabled);
    }

    if let Ok(variables) = std::env::var("HOTDEPLOY_FILTER_VARIABLES") {
        params.insert(FILTER_VARIABLES_PARAM.to_string(), variables);
    }

    params
}
