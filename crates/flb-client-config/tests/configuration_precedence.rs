use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::rstest;
use tempfile::TempDir;

use flb_client_config::{Config, ExecutionMode, LogFormat};
use ortho_config::OrthoConfig;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` on the 2024 edition; the override
        // restores the previous value in `Drop`.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}

fn load(args: &[&str]) -> Config {
    let mut argv = vec![OsString::from("flb-client")];
    argv.extend(args.iter().map(OsString::from));
    Config::load_from_iter(argv).expect("configuration should load")
}

#[rstest]
fn environment_overrides_defaults() {
    let _env = EnvOverride::set_var("FLB_CLIENT_LOG_FILTER", OsStr::new("debug"));

    let config = load(&[]);

    assert_eq!(config.log_filter(), "debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
}

#[rstest]
fn cli_flags_override_environment() {
    let _env = EnvOverride::set_var("FLB_CLIENT_LOG_FILTER", OsStr::new("debug"));

    let config = load(&["--log-filter", "trace"]);

    assert_eq!(config.log_filter(), "trace");
}

#[rstest]
fn configuration_file_supplies_values() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("flb_client.toml");
    fs::write(
        &path,
        "execution_mode = \"debug\"\nhints_debounce_ms = 250\nextension_root = \"/opt/flb\"\n",
    )
    .expect("write config");

    let config = load(&["--config-path", path.to_str().expect("utf-8 temp path")]);

    assert_eq!(config.execution_mode(), ExecutionMode::Debug);
    assert_eq!(config.hints_debounce_ms, 250);
    assert_eq!(config.extension_root().as_str(), "/opt/flb");
}
