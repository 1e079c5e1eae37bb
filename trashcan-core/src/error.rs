use crate::hooks::Transition;
use trashcan_data::{DataError, Entity};

/// Errors surfaced by the registry, scopes and the trash/recover engine.
///
/// The variants tell apart the three outcomes a caller has to handle:
/// - `Configuration`: nothing was written.
/// - `Store`: the backend failed. On a transactional store nothing was committed.
/// - `HookAbort`: a lifecycle hook stopped the call.
#[derive(Debug)]
pub enum TrashError {
    Configuration { model: String, message: String },
    Store(DataError),
    HookAbort {
        hook: String,
        transition: Transition,
        reason: String,
    },
}

impl TrashError {
    /// Configuration error attributed to model `E`.
    pub fn configuration<E: Entity>(message: impl Into<String>) -> Self {
        TrashError::Configuration {
            model: E::model_name().to_string(),
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, TrashError::Configuration { .. })
    }

    pub fn is_store(&self) -> bool {
        matches!(self, TrashError::Store(_))
    }

    pub fn is_hook_abort(&self) -> bool {
        matches!(self, TrashError::HookAbort { .. })
    }

    /// Name `hook` as the origin of an abort that does not name one yet.
    pub(crate) fn attribute_to(self, hook: &str) -> Self {
        match self {
            TrashError::HookAbort {
                hook: origin,
                transition,
                reason,
            } if origin.is_empty() => TrashError::HookAbort {
                hook: hook.to_string(),
                transition,
                reason,
            },
            other => other,
        }
    }
}

impl std::fmt::Display for TrashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrashError::Configuration { model, message } => {
                write!(f, "Configuration error for {model}: {message}")
            }
            TrashError::Store(err) => write!(f, "Store error: {err}"),
            TrashError::HookAbort {
                hook,
                transition,
                reason,
            } => write!(f, "{transition} aborted by hook '{hook}': {reason}"),
        }
    }
}

impl std::error::Error for TrashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrashError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DataError> for TrashError {
    fn from(err: DataError) -> Self {
        TrashError::Store(err)
    }
}
