//! Error types for external collaborators, and the scoped error slots the
//! controller exposes to the host.
//!
//! Collaborator failures never reject a local mutation. They are logged and
//! parked in a `ScopedErrors` slot, where a later message for the same scope
//! replaces the earlier one.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("server unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable")]
    Unavailable,
    #[error("clipboard access denied: {0}")]
    Denied(String),
    #[error("clipboard error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface is not mounted")]
    NotMounted,
    #[error("render failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorScope {
    /// Server commit of local edits.
    Commit,
    /// Row lock or unlock requests.
    Lock,
    Render,
    Clipboard,
}

/// One replaceable message per scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopedErrors {
    slots: BTreeMap<ErrorScope, String>,
}

impl ScopedErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, scope: ErrorScope, message: impl Into<String>) {
        self.slots.insert(scope, message.into());
    }

    pub fn clear(&mut self, scope: ErrorScope) -> bool {
        self.slots.remove(&scope).is_some()
    }

    pub fn get(&self, scope: ErrorScope) -> Option<&str> {
        self.slots.get(&scope).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Active errors in scope order.
    pub fn iter(&self) -> impl Iterator<Item = (ErrorScope, &str)> {
        self.slots.iter().map(|(scope, msg)| (*scope, msg.as_str()))
    }

    pub fn clear_all(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_errors_replace() {
        let mut errors = ScopedErrors::new();
        errors.set(ErrorScope::Commit, "first");
        errors.set(ErrorScope::Commit, "second");
        errors.set(ErrorScope::Lock, "locked");
        assert_eq!(errors.get(ErrorScope::Commit), Some("second"));
        assert_eq!(errors.iter().count(), 2);
        assert!(errors.clear(ErrorScope::Commit));
        assert!(!errors.clear(ErrorScope::Commit));
        assert_eq!(errors.get(ErrorScope::Lock), Some("locked"));
    }

    #[test]
    fn test_error_display() {
        let err = AdapterError::Rejected("row locked".into());
        assert_eq!(err.to_string(), "request rejected: row locked");
        assert_eq!(RenderError::NotMounted.to_string(), "surface is not mounted");
    }
}
