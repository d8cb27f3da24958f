//! Tests for the host wiring around the lifecycle.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flb_client_config::Config;
use flb_lsp_client::adapter::{LaunchError, ProtocolError};
use flb_lsp_client::{
    ActivationError, Launcher, NO_BINARY_MESSAGE, PlatformKind, ProtocolClient,
    ResolutionConfig, ResolutionError, RunProfile, UserNotifier,
};
use ortho_config::OrthoError;
use rstest::rstest;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::bootstrap::{ConfigLoader, bootstrap_with};
use crate::notifier::WriterNotifier;
use crate::{report_startup_failure, serve};

#[derive(Debug, Clone, Default)]
struct ScriptedLauncher {
    methods: Arc<Mutex<Vec<String>>>,
}

impl ScriptedLauncher {
    fn methods(&self) -> Vec<String> {
        self.methods.lock().expect("log poisoned").clone()
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    async fn launch(&self, _profile: &RunProfile) -> Result<Box<dyn ProtocolClient>, LaunchError> {
        Ok(Box::new(ScriptedClient {
            methods: Arc::clone(&self.methods),
        }))
    }
}

struct ScriptedClient {
    methods: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ProtocolClient for ScriptedClient {
    async fn request(&mut self, method: &str, _params: Option<Value>) -> Result<Value, ProtocolError> {
        self.methods.lock().expect("log poisoned").push(method.to_owned());
        Ok(match method {
            "initialize" => json!({"capabilities": {"hoverProvider": true}}),
            _ => Value::Null,
        })
    }

    async fn notify(&mut self, method: &str, _params: Option<Value>) -> Result<(), ProtocolError> {
        self.methods.lock().expect("log poisoned").push(method.to_owned());
        Ok(())
    }

    async fn close(&mut self) {
        self.methods.lock().expect("log poisoned").push("close".to_owned());
    }
}

#[derive(Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("buffer poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct FixedLoader(Config);

impl ConfigLoader for FixedLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.0.clone())
    }
}

#[rstest]
#[tokio::test]
async fn serve_runs_until_shutdown_then_stops_server() {
    let launcher = ScriptedLauncher::default();
    let notifier: Arc<dyn UserNotifier> = Arc::new(WriterNotifier::new(Vec::new()));
    let resolution = ResolutionConfig::new("/opt/flb", PlatformKind::Other)
        .with_override("/usr/local/bin/fluent-bit-language-server");

    serve(
        &Config::default(),
        resolution,
        Arc::new(launcher.clone()),
        notifier,
        async {},
    )
    .await
    .expect("serve completes");

    assert_eq!(
        launcher.methods(),
        vec!["initialize", "initialized", "shutdown", "exit", "close"]
    );
}

#[rstest]
#[tokio::test]
async fn serve_reports_missing_binary_to_the_user() {
    let root = TempDir::new().expect("temp dir");
    let output = Arc::new(Mutex::new(Vec::new()));
    let notifier = Arc::new(WriterNotifier::new(SharedBuffer(Arc::clone(&output))));
    let launcher = ScriptedLauncher::default();

    let result = serve(
        &Config::default(),
        ResolutionConfig::new(root.path(), PlatformKind::Other),
        Arc::new(launcher.clone()),
        notifier,
        std::future::pending(),
    )
    .await;

    assert!(matches!(
        result,
        Err(ActivationError::Resolution(ResolutionError::NotAvailable))
    ));
    assert!(launcher.methods().is_empty());
    let written = String::from_utf8(output.lock().expect("buffer poisoned").clone()).expect("utf-8");
    assert_eq!(written, format!("error: {NO_BINARY_MESSAGE}\n"));
}

#[rstest]
fn bootstrap_returns_loaded_configuration() {
    let config = Config {
        shutdown_grace_ms: 50,
        ..Config::default()
    };

    let bootstrapped = bootstrap_with(&FixedLoader(config.clone())).expect("bootstrap succeeds");

    assert_eq!(bootstrapped.config(), &config);
}

#[rstest]
fn startup_failures_are_written_as_one_line() {
    let mut output = Vec::new();

    report_startup_failure(
        &mut output,
        &format_args!("failed to start the async runtime: {}", "no reactor"),
    );

    assert_eq!(
        String::from_utf8(output).expect("utf-8"),
        "flb-client: failed to start the async runtime: no reactor\n"
    );
}
