//! Shared fixtures and doubles for client tests.

mod recording;

use std::ffi::OsString;
use std::path::Path;
use std::str::FromStr;

use lsp_types::Uri;
use rstest::fixture;

pub use recording::{Call, LaunchFailure, RecordingLauncher, RecordingNotifier};

use crate::locator::ServerPath;
use crate::session::SessionConfig;

/// URI of a fluent-bit configuration document.
#[fixture]
pub fn sample_uri() -> Uri {
    Uri::from_str("file:///etc/fluent-bit/fluent-bit.conf").expect("invalid test URI")
}

/// Session configuration with an empty inherited environment.
pub fn session_config(command: impl AsRef<Path>) -> SessionConfig {
    SessionConfig::with_inherited(
        ServerPath::for_tests(command.as_ref()),
        Vec::new(),
        std::iter::empty::<(OsString, OsString)>(),
    )
}

/// Creates the bundled server binary under `root` for `file_name`.
pub fn write_bundled_server(root: &Path, file_name: &str) {
    let dir = root.join("server");
    std::fs::create_dir_all(&dir).expect("create server dir");
    std::fs::write(dir.join(file_name), b"#!/bin/sh\n").expect("write server binary");
}
