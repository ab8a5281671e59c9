// Author: Lukas Bower
// Purpose: Error taxonomy surfaced by gateway operations.

use std::io;

use array_proto::{ElementKind, ProtoError};

use crate::validate::{Operation, Residency};

/// Precondition a structurally valid handle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// The handle's element kind is outside the operation's allowed set.
    Kind(ElementKind),
    /// The handle's residency does not satisfy the operation.
    Residency {
        /// Residency the operation requires.
        required: Residency,
        /// Whether the handle is on the device.
        on_device: bool,
    },
    /// The operation has no rule in the active table.
    Disabled,
}

impl core::fmt::Display for Violation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Kind(kind) => write!(f, "element kind {kind} is not supported"),
            Self::Residency {
                required,
                on_device,
            } => {
                let actual = if *on_device { "device" } else { "host" };
                write!(f, "requires {required} residency, array is on {actual}")
            }
            Self::Disabled => f.write_str("operation is disabled by the operation table"),
        }
    }
}

/// Failures raised by the socket transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connecting to the server failed.
    #[error("connect to {addr}: {source}")]
    Connect {
        /// Address that was dialled.
        addr: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Reading or writing a frame failed.
    #[error("transport i/o: {0}")]
    Io(#[from] io::Error),
    /// The server closed the stream before replying.
    #[error("server closed the connection")]
    Closed,
    /// The request could not be serialised.
    #[error("encode request: {0}")]
    Encode(#[source] ProtoError),
}

/// Errors returned by gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A value that is not an array handle was passed where one was required.
    #[error("{operation} expects an array handle, got {found}")]
    Usage {
        /// Operation that was called.
        operation: Operation,
        /// Description of the value supplied.
        found: String,
    },
    /// A valid handle failed the operation's preconditions.
    #[error("{operation}: {violation}")]
    Constraint {
        /// Operation that was called.
        operation: Operation,
        /// Offending property.
        violation: Violation,
    },
    /// The server reported a failure, or replied with something unreadable.
    #[error("server error: {0}")]
    Remote(String),
    /// A bigint transfer failed digest or structural checks.
    #[error("corrupt bigint transfer: {0}")]
    Corruption(#[source] ProtoError),
    /// The transport failed before a reply was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl GatewayError {
    pub(crate) fn constraint(operation: Operation, violation: Violation) -> Self {
        Self::Constraint {
            operation,
            violation,
        }
    }
}
