use glob::Pattern;
use lsp_types::Uri;

/// Language identifier of fluent-bit configuration documents.
pub const FLUENT_BIT_LANGUAGE_ID: &str = "fluent-bit";

/// Sentinel glob whose matches nudge the server to resynchronise.
pub const CHANGE_WATCH_GLOB: &str = "**/.clientrc";

/// Restricts session traffic to documents of one language.
///
/// Matching is exact on the language identifier; no scheme, extension or
/// path patterns are consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSelector {
    language_id: String,
}

impl DocumentSelector {
    /// Selector for fluent-bit documents.
    #[must_use]
    pub fn fluent_bit() -> Self {
        Self {
            language_id: FLUENT_BIT_LANGUAGE_ID.to_owned(),
        }
    }

    /// The selected language identifier.
    #[must_use]
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Whether a document with `language_id` belongs to the session.
    #[must_use]
    pub fn matches(&self, language_id: &str) -> bool {
        self.language_id == language_id
    }
}

/// Watches for file events on the sentinel pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWatcher {
    pattern: Pattern,
}

impl FileWatcher {
    /// Watcher over [`CHANGE_WATCH_GLOB`].
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            pattern: sentinel_pattern(),
        }
    }

    /// The glob being watched.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether an event for `uri` should be forwarded to the server.
    #[must_use]
    pub fn matches(&self, uri: &Uri) -> bool {
        self.pattern.matches(uri.path().as_str())
    }
}

fn sentinel_pattern() -> Pattern {
    // Constant and valid; the empty fallback would match nothing.
    Pattern::new(CHANGE_WATCH_GLOB).unwrap_or_default()
}
