//! Error types for Conflux.

use crate::packet::Packet;
use std::fmt;
use thiserror::Error;

/// Result type alias using Conflux's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for graph operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A connect or disconnect referenced a node name absent from the graph.
    #[error("node '{0}' not found in graph")]
    NodeNotFound(String),

    /// A connect or disconnect referenced a pin index a node does not have.
    #[error("node '{node}' has no pin at index {index}")]
    PinOutOfRange {
        /// Name of the node whose pin was requested.
        node: String,
        /// The out-of-range pin index.
        index: usize,
    },

    /// A typed connect or disconnect named a pin whose element type differs
    /// from the requested one.
    #[error("pin element type mismatch on node '{node}'")]
    TypeMismatch {
        /// Name of the node whose pin has a different element type.
        node: String,
    },
}

/// Error returned by a failed push, handing the rejected packet back.
///
/// A push never blocks and never drops data: when the pipe refuses the
/// packet, the caller gets it back through this error and may retry or
/// reclaim it, in the style of [`std::sync::mpsc::TrySendError`].
pub enum PushError<T> {
    /// The pipe is at its length or weight cap.
    Full(Packet<T>),
    /// The pin holds no pipe.
    Disconnected(Packet<T>),
}

impl<T> PushError<T> {
    /// Recover the packet that could not be pushed.
    pub fn into_packet(self) -> Packet<T> {
        match self {
            Self::Full(packet) | Self::Disconnected(packet) => packet,
        }
    }

    /// True if the push was refused by a length or weight cap.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    /// True if the push was attempted on a pin with no pipe.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected(_))
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(..) => f.pad("Full(..)"),
            Self::Disconnected(..) => f.pad("Disconnected(..)"),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(..) => f.pad("pipe is at capacity"),
            Self::Disconnected(..) => f.pad("pin is not connected to a pipe"),
        }
    }
}

impl<T> std::error::Error for PushError<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_error_returns_packet() {
        let err = PushError::Full(Packet::new(7_u32));
        assert!(err.is_full());
        assert_eq!(err.into_packet().into_data(), 7);

        let err = PushError::Disconnected(Packet::new(11_u32));
        assert!(err.is_disconnected());
        assert_eq!(err.into_packet().into_data(), 11);
    }

    #[test]
    fn test_error_display() {
        let err = Error::NodeNotFound("missing".into());
        assert_eq!(err.to_string(), "node 'missing' not found in graph");

        let err = Error::PinOutOfRange {
            node: "adder".into(),
            index: 3,
        };
        assert_eq!(err.to_string(), "node 'adder' has no pin at index 3");
    }
}
