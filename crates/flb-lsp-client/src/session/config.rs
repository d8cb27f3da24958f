use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;

use flb_client_config::ExecutionMode;

use super::selector::{DocumentSelector, FileWatcher};
use crate::locator::ServerPath;

/// How the server process is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProfile {
    command: ServerPath,
    args: Vec<OsString>,
    environment: BTreeMap<OsString, OsString>,
}

impl RunProfile {
    /// Executable to spawn.
    #[must_use]
    pub fn command(&self) -> &Path {
        self.command.as_path()
    }

    /// Arguments passed to the executable.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Complete environment of the spawned process.
    #[must_use]
    pub fn environment(&self) -> &BTreeMap<OsString, OsString> {
        &self.environment
    }

    /// Looks up one environment variable.
    #[must_use]
    pub fn env_var(&self, name: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.environment.get(name.as_ref()).map(OsString::as_os_str)
    }
}

/// Everything needed to start one session.
///
/// Only buildable from a [`ServerPath`], so a configuration never exists for
/// a failed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    profile: RunProfile,
    document_selector: DocumentSelector,
    change_watch: FileWatcher,
}

impl SessionConfig {
    /// Builds a configuration inheriting the current process environment.
    #[must_use]
    pub fn new<I, K, V>(server: ServerPath, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self::with_inherited(server, std::env::vars_os(), overrides)
    }

    /// Builds a configuration from an explicit inherited environment.
    ///
    /// Overrides only add variables: a name already present in `inherited`
    /// keeps its inherited value.
    #[must_use]
    pub fn with_inherited<E, I, K, V>(server: ServerPath, inherited: E, overrides: I) -> Self
    where
        E: IntoIterator<Item = (OsString, OsString)>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let mut environment: BTreeMap<OsString, OsString> = inherited.into_iter().collect();
        for (name, value) in overrides {
            environment.entry(name.into()).or_insert_with(|| value.into());
        }
        Self {
            profile: RunProfile {
                command: server,
                args: Vec::new(),
                environment,
            },
            document_selector: DocumentSelector::fluent_bit(),
            change_watch: FileWatcher::sentinel(),
        }
    }

    /// Run profile for `mode`.
    ///
    /// Normal and debug launches are identical at this layer.
    #[must_use]
    pub fn profile(&self, mode: ExecutionMode) -> &RunProfile {
        match mode {
            ExecutionMode::Normal | ExecutionMode::Debug => &self.profile,
        }
    }

    /// Executable the session launches.
    #[must_use]
    pub fn command(&self) -> &Path {
        self.profile.command()
    }

    /// Documents the session applies to.
    #[must_use]
    pub fn document_selector(&self) -> &DocumentSelector {
        &self.document_selector
    }

    /// Sentinel file watcher.
    #[must_use]
    pub fn change_watch(&self) -> &FileWatcher {
        &self.change_watch
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn inherited() -> Vec<(OsString, OsString)> {
        vec![
            ("PATH".into(), "/usr/bin".into()),
            ("RUST_LOG".into(), "warn".into()),
        ]
    }

    #[rstest]
    fn overrides_add_but_never_replace() {
        let config = SessionConfig::with_inherited(
            ServerPath::for_tests("/srv/fluent-bit-language-server"),
            inherited(),
            [("RUST_LOG", "debug"), ("FLB_EXTRA", "1")],
        );
        let profile = config.profile(ExecutionMode::Normal);

        assert_eq!(profile.env_var("RUST_LOG"), Some(OsStr::new("warn")));
        assert_eq!(profile.env_var("FLB_EXTRA"), Some(OsStr::new("1")));
        assert_eq!(profile.env_var("PATH"), Some(OsStr::new("/usr/bin")));
        assert_eq!(profile.environment().len(), 3);
    }

    #[rstest]
    fn debug_and_normal_share_one_profile() {
        let config = SessionConfig::with_inherited(
            ServerPath::for_tests("/srv/server"),
            inherited(),
            std::iter::empty::<(OsString, OsString)>(),
        );

        assert_eq!(
            config.profile(ExecutionMode::Normal),
            config.profile(ExecutionMode::Debug)
        );
        assert_eq!(config.command(), Path::new("/srv/server"));
        assert!(config.profile(ExecutionMode::Debug).args().is_empty());
    }

    #[rstest]
    fn scopes_to_fluent_bit_and_sentinel_glob() {
        let config = SessionConfig::with_inherited(
            ServerPath::for_tests("/srv/server"),
            Vec::new(),
            std::iter::empty::<(OsString, OsString)>(),
        );

        assert_eq!(config.document_selector().language_id(), "fluent-bit");
        assert_eq!(config.change_watch().pattern(), "**/.clientrc");
    }
}
