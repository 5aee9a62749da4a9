//! Error types used by the mediator, its handlers, and the state layer.
//!
//! - [`MediatorError`]: configuration errors raised by the mediator itself.
//! - [`HandlerError`]: failures of individual handlers; reported, never propagated to publishers.
//! - [`StateError`]: configuration errors raised by the state facade.
//! - [`StorageError`]: failures inside storage backends; logged and swallowed there.
//!
//! All types provide `as_label` (stable snake_case, for logs) and `as_message`.

use thiserror::Error;

/// # Errors produced by the mediator.
///
/// These are caller mistakes the mediator cannot recover from.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediatorError {
    /// Declaring the subtype relation would make a type its own ancestor.
    #[error("subtype declaration {sub} <: {base} would create a cycle")]
    CyclicSubtype {
        /// Declared subtype.
        sub: &'static str,
        /// Declared base type.
        base: &'static str,
    },
}

impl MediatorError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use statevisor::MediatorError;
    ///
    /// let err = MediatorError::CyclicSubtype { sub: "A", base: "A" };
    /// assert_eq!(err.as_label(), "mediator_cyclic_subtype");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MediatorError::CyclicSubtype { .. } => "mediator_cyclic_subtype",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            MediatorError::CyclicSubtype { sub, base } => {
                format!("cyclic subtype: {sub} <: {base}")
            }
        }
    }
}

/// # Errors produced by a single handler invocation.
///
/// Collected per handler during publish; the publish call itself still succeeds.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler reported a failure.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The handler panicked (caught when `MediatorConfig::catch_panics` is set).
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },

    /// The erased subscriber or value did not have the type the handler expects.
    #[error("payload mismatch: expected {expected}")]
    PayloadMismatch {
        /// Expected type name.
        expected: &'static str,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    ///
    /// # Example
    /// ```
    /// use statevisor::HandlerError;
    ///
    /// let err = HandlerError::fail("connection refused");
    /// assert_eq!(err.to_string(), "handler failed: connection refused");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        HandlerError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::PayloadMismatch { .. } => "handler_payload_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::PayloadMismatch { expected } => format!("expected: {expected}"),
        }
    }
}

/// # Errors produced by the state facade.
#[cfg(feature = "state")]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A named commit was given an empty or whitespace-only name.
    #[error("state name must not be blank")]
    EmptyName,
}

#[cfg(feature = "state")]
impl StateError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StateError::EmptyName => "state_empty_name",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StateError::EmptyName => "blank state name".to_string(),
        }
    }
}

/// # Errors produced inside storage backends.
///
/// Backends log these and degrade to "no value"; they never reach the state facade.
#[cfg(feature = "state")]
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// The underlying medium could not be read or written.
    #[error("storage medium unavailable: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be encoded or decoded.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key cannot be represented on this medium.
    #[error("invalid storage key {key:?}")]
    InvalidKey {
        /// Key as given by the caller.
        key: String,
    },

    /// The stored value could not be decoded from the medium's encoding.
    #[error("invalid stored value for {key:?}: {reason}")]
    InvalidValue {
        /// Key as given by the caller.
        key: String,
        /// Decoder error.
        reason: String,
    },

    /// The encoded value exceeds the medium's size limit.
    #[error("value for {key:?} is {len} bytes, limit is {max}")]
    TooLarge {
        /// Key as given by the caller.
        key: String,
        /// Encoded length.
        len: usize,
        /// Configured limit.
        max: usize,
    },
}

#[cfg(feature = "state")]
impl StorageError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StorageError::Io(_) => "storage_io",
            StorageError::Serialize(_) => "storage_serialize",
            StorageError::InvalidKey { .. } => "storage_invalid_key",
            StorageError::InvalidValue { .. } => "storage_invalid_value",
            StorageError::TooLarge { .. } => "storage_too_large",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StorageError::Io(e) => format!("io: {e}"),
            StorageError::Serialize(e) => format!("serde: {e}"),
            StorageError::InvalidKey { key } => format!("invalid key: {key:?}"),
            StorageError::InvalidValue { key, reason } => format!("invalid value: {key:?} ({reason})"),
            StorageError::TooLarge { key, len, max } => {
                format!("too large: {key:?} ({len} > {max})")
            }
        }
    }
}
