/// Error types shared across the extension
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Platform error texts that mean the page cannot be scripted
static RESTRICTED_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cannot access|cannot be scripted|chrome://|restricted url|extensions gallery")
        .expect("restricted-page pattern is valid")
});

/// Persisted configuration could not be read or written
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("storage get `{key}` failed: {message}")]
    Get { key: String, message: String },

    #[error("storage set `{key}` failed: {message}")]
    Set { key: String, message: String },

    #[error("stored value `{key}` is malformed: {message}")]
    Malformed { key: String, message: String },

    #[error("context menu update failed: {0}")]
    Menu(String),
}

/// A clipboard write did not go through
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClipboardError {
    #[error("clipboard permission denied: {0}")]
    PermissionDenied(String),

    #[error("clipboard API unavailable")]
    Unavailable,

    #[error("clipboard write rejected: {0}")]
    Rejected(String),

    #[error("legacy copy command failed: {0}")]
    CommandFailed(String),
}

impl ClipboardError {
    /// Build from a DOMException-style name and message
    pub fn from_dom(name: &str, message: &str) -> ClipboardError {
        match name {
            "NotAllowedError" | "SecurityError" => {
                ClipboardError::PermissionDenied(message.to_string())
            }
            "NotSupportedError" => ClipboardError::Unavailable,
            _ => ClipboardError::Rejected(message.to_string()),
        }
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, ClipboardError::PermissionDenied(_))
    }
}

/// Script injection into a tab failed
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InjectionError {
    #[error("cannot copy from restricted page {0}")]
    RestrictedPage(String),

    #[error("script execution failed: {0}")]
    Script(String),

    #[error("nothing reached the clipboard in tab {0}")]
    NotCopied(i32),
}

impl InjectionError {
    /// Classify a raw platform error message.
    ///
    /// The scripting API reports restricted pages only through its message
    /// text, so this matches known fragments of it.
    pub fn classify(message: &str, url: Option<&str>) -> InjectionError {
        if RESTRICTED_MESSAGE.is_match(message) {
            InjectionError::RestrictedPage(url.unwrap_or("<unknown>").to_string())
        } else {
            InjectionError::Script(message.to_string())
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, InjectionError::RestrictedPage(_))
    }
}
