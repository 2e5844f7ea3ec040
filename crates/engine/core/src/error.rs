//! Common error infrastructure for cadence-core.
//!
//! Admission and skill failures are not errors here: they resolve into normal
//! terminal transitions of the action state machine. The types below cover
//! what must reach a caller: construction-time interrupts, unknown type tags
//! and records that fail to encode or decode.

/// Result alias for fallible core operations; most of them construct actions.
pub type Result<T, E = ActionError> = core::result::Result<T, E>;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller may retry or pick another course
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistency that needs investigation
/// - **Fatal**: persisted state cannot be trusted any more
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with the same or an alternative action.
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - stored state is corrupted.
    Fatal,
}

impl ErrorSeverity {
    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all cadence errors.
pub trait CadenceError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str;
}

/// Errors raised while constructing an action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The action cannot meaningfully exist; the caller must not enqueue it.
    #[error("action interrupted before it was queued: {reason}")]
    Interrupted { reason: String },
}

impl ActionError {
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }
}

impl CadenceError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Interrupted { .. } => "ACTION_INTERRUPTED",
        }
    }
}

/// Errors from the type-tag registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no move registered for type tag `{0}`")]
    UnknownMove(String),

    #[error("no effect registered for type tag `{0}`")]
    UnknownEffect(String),

    #[error("failed to decode `{tag}`: {source}")]
    Decode {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CadenceError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownMove(_) | Self::UnknownEffect(_) => ErrorSeverity::Validation,
            Self::Decode { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownMove(_) => "REGISTRY_UNKNOWN_MOVE",
            Self::UnknownEffect(_) => "REGISTRY_UNKNOWN_EFFECT",
            Self::Decode { .. } => "REGISTRY_DECODE",
        }
    }
}

/// Errors converting live queues and handlers to and from their records.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl PersistError {
    pub fn encode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Encode { what, source }
    }

    pub fn decode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { what, source }
    }
}

impl CadenceError for PersistError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Encode { .. } => ErrorSeverity::Internal,
            Self::Decode { .. } => ErrorSeverity::Fatal,
            Self::Registry(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode { .. } => "PERSIST_ENCODE",
            Self::Decode { .. } => "PERSIST_DECODE",
            Self::Registry(e) => e.error_code(),
        }
    }
}
