//! Error types for backend operations.

use std::io;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while talking to a key-value backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A command was issued against a key holding a different kind of value.
    #[error("WRONGTYPE operation against key {key} holding the wrong kind of value")]
    WrongType {
        /// The offending key.
        key: String,
    },

    /// The value stored at a key is not an integer.
    #[error("value at {key} is not an integer or out of range")]
    NotAnInteger {
        /// The offending key.
        key: String,
    },

    /// The server sent something that is not valid RESP.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered with an error reply.
    #[error("server error: {0}")]
    Server(String),

    /// The server answered with a reply of an unexpected shape.
    #[error("unexpected reply to {command}: {reply}")]
    UnexpectedReply {
        /// The command that was sent.
        command: String,
        /// Debug rendering of the reply.
        reply: String,
    },
}

impl BackendError {
    /// Creates a wrong type error.
    pub fn wrong_type(key: impl Into<String>) -> Self {
        Self::WrongType { key: key.into() }
    }

    /// Creates a not-an-integer error.
    pub fn not_an_integer(key: impl Into<String>) -> Self {
        Self::NotAnInteger { key: key.into() }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
