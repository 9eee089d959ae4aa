//! Lifecycle-specific error types

use super::{HandlerState, Phase};
use crate::error::ConfigurationError;
use crate::module::TypeKey;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while starting or stopping modules
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Registration or injection problem
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A hook returned an error
    #[error("{phase} failed for {module}: {source}")]
    HookFailed {
        /// Module whose hook failed
        module: String,
        /// The lifecycle phase that failed
        phase: Phase,
        /// What the hook reported
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A hook did not complete within the configured timeout
    #[error("{phase} timed out for {module} after {timeout:?}")]
    HookTimedOut {
        /// Module whose hook ran too long
        module: String,
        /// The lifecycle phase that timed out
        phase: Phase,
        /// The limit that was exceeded
        timeout: Duration,
    },

    /// Start was cancelled while (or before) the hook ran
    #[error("{phase} cancelled for {module}")]
    HookCancelled {
        /// Module whose hook was cut short
        module: String,
        /// The lifecycle phase that was cancelled
        phase: Phase,
    },

    /// Operation not allowed in the handler's current state
    #[error("Cannot {operation} a handler that is {state}")]
    InvalidState {
        /// The rejected operation, e.g. `"start"`
        operation: &'static str,
        /// State the handler was in
        state: HandlerState,
    },
}

impl LifecycleError {
    /// Create a hook failure error
    pub fn hook_failed(module: TypeKey, phase: Phase, source: anyhow::Error) -> Self {
        Self::HookFailed {
            module: module.name().to_string(),
            phase,
            source: source.into(),
        }
    }

    /// Create a timeout error
    pub fn timed_out(module: TypeKey, phase: Phase, timeout: Duration) -> Self {
        Self::HookTimedOut {
            module: module.name().to_string(),
            phase,
            timeout,
        }
    }

    /// Create a cancellation error
    pub fn cancelled(module: TypeKey, phase: Phase) -> Self {
        Self::HookCancelled {
            module: module.name().to_string(),
            phase,
        }
    }

    pub fn invalid_state(operation: &'static str, state: HandlerState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Whether a lifecycle hook failed, timed out, or was cancelled.
    pub fn is_hook_failure(&self) -> bool {
        matches!(
            self,
            Self::HookFailed { .. } | Self::HookTimedOut { .. } | Self::HookCancelled { .. }
        )
    }

    /// The module a hook failure belongs to.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::HookFailed { module, .. }
            | Self::HookTimedOut { module, .. }
            | Self::HookCancelled { module, .. } => Some(module),
            Self::Configuration(_) | Self::InvalidState { .. } => None,
        }
    }

    /// The phase a hook failure happened in.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::HookFailed { phase, .. }
            | Self::HookTimedOut { phase, .. }
            | Self::HookCancelled { phase, .. } => Some(*phase),
            Self::Configuration(_) | Self::InvalidState { .. } => None,
        }
    }
}

/// A specialized Result type for a single lifecycle operation
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Every error reported by one `start` or `stop` call, in the order they occurred.
///
/// Never empty.
#[derive(Debug)]
pub struct LifecycleErrors(Vec<LifecycleError>);

impl LifecycleErrors {
    /// `Ok` for an empty batch, `Err` otherwise.
    pub(crate) fn into_result(errors: Vec<LifecycleError>) -> std::result::Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }

    pub(crate) fn single(error: LifecycleError) -> Self {
        Self(vec![error])
    }

    pub fn errors(&self) -> &[LifecycleError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<LifecycleError> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LifecycleError> {
        self.0.iter()
    }

    pub fn hook_failures(&self) -> impl Iterator<Item = &LifecycleError> {
        self.0.iter().filter(|e| e.is_hook_failure())
    }

    pub fn configuration_errors(&self) -> impl Iterator<Item = &ConfigurationError> {
        self.0.iter().filter_map(|e| match e {
            LifecycleError::Configuration(inner) => Some(inner),
            _ => None,
        })
    }
}

impl fmt::Display for LifecycleErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lifecycle error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for LifecycleErrors {}

impl IntoIterator for LifecycleErrors {
    type Item = LifecycleError;
    type IntoIter = std::vec::IntoIter<LifecycleError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LifecycleErrors {
    type Item = &'a LifecycleError;
    type IntoIter = std::slice::Iter<'a, LifecycleError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
