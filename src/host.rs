//! Collaborators supplied by the host application
//!
//! The speech core never renders UI or owns routing. It talks to the host
//! through these traits: toasts, the document locale attribute and the
//! page router.

use std::fmt;
use std::sync::Mutex;

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Surfaces user-visible messages (toast/alert)
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Receives the active language code for the document-level locale attribute
pub trait LocaleSink: Send + Sync {
    fn set_locale(&self, code: &str);
}

/// Page router
pub trait Router: Send + Sync {
    /// Navigate to `path`
    fn navigate(&self, path: &str);

    /// Path currently displayed
    fn current_path(&self) -> String;
}

/// Notifier that writes toasts to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!(%severity, "{message}"),
            Severity::Warning => tracing::warn!(%severity, "{message}"),
            Severity::Error => tracing::error!(%severity, "{message}"),
        }
    }
}

/// Locale sink that only logs the change
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLocaleSink;

impl LocaleSink for TracingLocaleSink {
    fn set_locale(&self, code: &str) {
        tracing::debug!(lang = code, "document locale updated");
    }
}

/// Router holding the current path in memory
#[derive(Debug)]
pub struct MemoryRouter {
    path: Mutex<String>,
}

impl MemoryRouter {
    /// Create a router positioned at `path`
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: Mutex::new(path.to_string()),
        }
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Router for MemoryRouter {
    fn navigate(&self, path: &str) {
        tracing::info!(path, "navigating");
        if let Ok(mut current) = self.path.lock() {
            *current = path.to_string();
        }
    }

    fn current_path(&self) -> String {
        self.path.lock().map(|p| p.clone()).unwrap_or_default()
    }
}
