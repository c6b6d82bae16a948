// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Error types for robobag.
//!
//! Failures fall into four groups:
//! - structural failures while opening a bag (storage, I/O, no storage units)
//! - decode failures while streaming messages (unknown type, bad payload)
//! - schema failures while loading message definitions
//! - precondition failures (reading a bag that is not open)
//!
//! Manifest problems are never errors; the bag degrades to directory
//! discovery and logs a warning instead.

use thiserror::Error;

/// Errors raised while opening, inspecting or streaming a bag.
#[derive(Debug, Error)]
pub enum BagError {
    /// A read operation was attempted while the bag is not open.
    #[error("Bag is not open: cannot {operation}")]
    NotOpen {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// `open()` was called on a bag that has already been closed.
    #[error("Bag has been closed and cannot be reopened")]
    Closed,

    /// Neither the manifest nor the directory listing yielded a storage file.
    #[error("No storage units found in bag '{location}'")]
    NoStorageUnits {
        /// Bag location used for discovery
        location: String,
    },

    /// The storage engine reported a failure.
    #[error("Storage error in '{path}': {message}")]
    Storage {
        /// Storage unit path, or the engine name when no path applies
        path: String,
        /// Engine message
        message: String,
    },

    /// A channel references a schema the registry cannot resolve.
    #[error("Unknown message type '{type_name}'")]
    UnknownMessageType {
        /// Schema identifier of the channel
        type_name: String,
    },

    /// A message payload could not be decoded.
    #[error("Failed to decode '{type_name}' at offset {offset}: {message}")]
    Decode {
        /// Schema identifier being decoded
        type_name: String,
        /// Byte offset within the payload
        offset: usize,
        /// Reason
        message: String,
    },

    /// A message definition could not be parsed.
    #[error("Invalid schema '{schema_name}': {reason}")]
    Schema {
        /// Schema identifier or file
        schema_name: String,
        /// Reason
        reason: String,
    },

    /// A recording feature this reader does not handle.
    #[error("Unsupported feature: '{feature}'")]
    Unsupported {
        /// What is not supported
        feature: String,
    },

    /// Filesystem failure.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path being accessed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl BagError {
    /// Create a "not open" precondition error.
    pub fn not_open(operation: &'static str) -> Self {
        BagError::NotOpen { operation }
    }

    /// Create a storage error.
    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        BagError::Storage {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an "unknown message type" error.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        BagError::UnknownMessageType {
            type_name: type_name.into(),
        }
    }

    /// Create a payload decode error.
    pub fn decode(type_name: impl Into<String>, offset: usize, message: impl Into<String>) -> Self {
        BagError::Decode {
            type_name: type_name.into(),
            offset,
            message: message.into(),
        }
    }

    /// Create a schema error.
    pub fn schema(schema_name: impl Into<String>, reason: impl Into<String>) -> Self {
        BagError::Schema {
            schema_name: schema_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        BagError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        BagError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for lifecycle misuse (reading before `open()` or after `close()`),
    /// as opposed to a problem with the recorded data.
    pub fn is_precondition(&self) -> bool {
        matches!(self, BagError::NotOpen { .. } | BagError::Closed)
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            BagError::NotOpen { operation } => vec![("operation", operation.to_string())],
            BagError::Closed => vec![],
            BagError::NoStorageUnits { location } => vec![("location", location.clone())],
            BagError::Storage { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            BagError::UnknownMessageType { type_name } => vec![("type", type_name.clone())],
            BagError::Decode {
                type_name,
                offset,
                message,
            } => vec![
                ("type", type_name.clone()),
                ("offset", offset.to_string()),
                ("message", message.clone()),
            ],
            BagError::Schema {
                schema_name,
                reason,
            } => vec![("schema", schema_name.clone()), ("reason", reason.clone())],
            BagError::Unsupported { feature } => vec![("feature", feature.clone())],
            BagError::Io { path, source } => {
                vec![("path", path.clone()), ("source", source.to_string())]
            }
            BagError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl From<rusqlite::Error> for BagError {
    fn from(err: rusqlite::Error) -> Self {
        BagError::Storage {
            path: "sqlite".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for robobag operations.
pub type Result<T> = std::result::Result<T, BagError>;
