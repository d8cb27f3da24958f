//! User-facing error output for a terminal host.

use std::io::{self, Write};
use std::sync::Mutex;

use flb_lsp_client::UserNotifier;
use tracing::{error, warn};

use crate::CLIENT_TARGET;

/// Shows messages on a writer, stderr by default.
#[derive(Debug)]
pub struct WriterNotifier<W> {
    writer: Mutex<W>,
}

/// Notifier writing to the process's stderr.
pub type StderrNotifier = WriterNotifier<io::Stderr>;

impl StderrNotifier {
    /// Notifier bound to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> WriterNotifier<W> {
    /// Wraps `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> UserNotifier for WriterNotifier<W> {
    fn show_error(&self, message: &str) {
        error!(target: CLIENT_TARGET, text = message, "showing error to user");
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(write_error) = writeln!(writer, "error: {message}").and_then(|()| writer.flush())
        {
            warn!(target: CLIENT_TARGET, error = %write_error, "failed to display error");
        }
    }
}
