//! Resolution of the language server executable.
//!
//! An explicit override from [`SERVER_PATH_ENV`] always wins. Otherwise the
//! binary bundled under `<extension root>/server/` is used when it exists.
//! Only existence is probed: the locator does not check that the file is
//! executable, nor its version or integrity.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Log target for resolution.
pub(crate) const LOCATOR_TARGET: &str = "flb_lsp_client::locator";

/// Environment variable holding an explicit server path.
pub const SERVER_PATH_ENV: &str = "__FLB_LSP_SERVER_DEBUG";

/// File stem of the bundled server binary.
pub const SERVER_BINARY_NAME: &str = "fluent-bit-language-server";

/// Directory, relative to the extension root, that holds the bundled binary.
pub const BUNDLED_SERVER_DIR: &str = "server";

/// Platform families that differ in executable naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    /// Windows targets; executables carry `.exe`.
    Windows,
    /// Every other target.
    Other,
}

impl PlatformKind {
    /// Platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Suffix appended to executable file names.
    #[must_use]
    pub const fn executable_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Other => "",
        }
    }
}

/// Inputs to a single resolution. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionConfig {
    override_path: Option<OsString>,
    extension_root: PathBuf,
    platform: PlatformKind,
    home_dir: Option<PathBuf>,
}

impl ResolutionConfig {
    /// Builds a configuration without an override or home directory.
    #[must_use]
    pub fn new(extension_root: impl Into<PathBuf>, platform: PlatformKind) -> Self {
        Self {
            override_path: None,
            extension_root: extension_root.into(),
            platform,
            home_dir: None,
        }
    }

    /// Captures the override variable, home directory and platform of the
    /// running process.
    #[must_use]
    pub fn from_environment(extension_root: impl Into<PathBuf>) -> Self {
        Self {
            override_path: std::env::var_os(SERVER_PATH_ENV),
            extension_root: extension_root.into(),
            platform: PlatformKind::current(),
            home_dir: dirs::home_dir(),
        }
    }

    /// Sets an explicit server path override.
    #[must_use]
    pub fn with_override(mut self, path: impl Into<OsString>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    /// Sets the directory `~/` expands to.
    #[must_use]
    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(dir.into());
        self
    }

    /// The configured override, if any.
    #[must_use]
    pub fn override_path(&self) -> Option<&OsStr> {
        self.override_path.as_deref()
    }

    /// Root directory of the installed extension.
    #[must_use]
    pub fn extension_root(&self) -> &Path {
        &self.extension_root
    }

    /// Platform family used for the bundled file name.
    #[must_use]
    pub fn platform(&self) -> PlatformKind {
        self.platform
    }

    /// Location of the bundled server binary for this configuration.
    #[must_use]
    pub fn bundled_path(&self) -> PathBuf {
        self.extension_root.join(BUNDLED_SERVER_DIR).join(format!(
            "{SERVER_BINARY_NAME}{}",
            self.platform.executable_suffix()
        ))
    }
}

/// A server executable path produced by a successful resolution.
///
/// Only the locator constructs this type, so holding one proves the path
/// came from a `Found` outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPath(PathBuf);

impl ServerPath {
    /// Borrow the path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

/// Why an explicit override was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideRejection {
    /// The variable was set but empty or whitespace.
    Empty,
    /// The value starts with `~/` but no home directory is known.
    HomeUnavailable,
}

impl fmt::Display for OverrideRejection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => formatter.write_str("override is empty"),
            Self::HomeUnavailable => {
                formatter.write_str("override uses '~/' but the home directory is unknown")
            }
        }
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedServerLocation {
    /// A server path to launch.
    Found(ServerPath),
    /// No override and no bundled binary for this platform.
    NotAvailable,
    /// An override was set but cannot be used.
    InvalidOverride(OverrideRejection),
}

/// Resolves the server executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerLocator;

impl ServerLocator {
    /// Creates a locator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves the executable for `config`.
    ///
    /// The bundled-path existence probe is the only I/O performed; a failed
    /// probe is treated as "absent".
    pub async fn resolve(&self, config: &ResolutionConfig) -> ResolvedServerLocation {
        if let Some(raw) = config.override_path() {
            let resolved = expand_override(raw, config.home_dir.as_deref());
            debug!(
                target: LOCATOR_TARGET,
                raw = %raw.to_string_lossy(),
                outcome = ?resolved,
                "using explicit server override"
            );
            return resolved;
        }

        let bundled = config.bundled_path();
        match tokio::fs::try_exists(&bundled).await {
            Ok(true) => {
                debug!(
                    target: LOCATOR_TARGET,
                    path = %bundled.display(),
                    "found bundled server"
                );
                ResolvedServerLocation::Found(ServerPath(bundled))
            }
            Ok(false) => {
                debug!(
                    target: LOCATOR_TARGET,
                    path = %bundled.display(),
                    "no bundled server for this platform"
                );
                ResolvedServerLocation::NotAvailable
            }
            Err(error) => {
                warn!(
                    target: LOCATOR_TARGET,
                    path = %bundled.display(),
                    error = %error,
                    "could not probe bundled server, treating as absent"
                );
                ResolvedServerLocation::NotAvailable
            }
        }
    }
}

fn expand_override(raw: &OsStr, home_dir: Option<&Path>) -> ResolvedServerLocation {
    let Some(text) = raw.to_str() else {
        // Non UTF-8 values cannot carry the `~/` shorthand; use them verbatim.
        return ResolvedServerLocation::Found(ServerPath(PathBuf::from(raw)));
    };
    if text.trim().is_empty() {
        return ResolvedServerLocation::InvalidOverride(OverrideRejection::Empty);
    }
    match (text.strip_prefix("~/"), home_dir) {
        (Some(rest), Some(home)) => ResolvedServerLocation::Found(ServerPath(home.join(rest))),
        (Some(_), None) => {
            ResolvedServerLocation::InvalidOverride(OverrideRejection::HomeUnavailable)
        }
        (None, _) => ResolvedServerLocation::Found(ServerPath(PathBuf::from(text))),
    }
}
