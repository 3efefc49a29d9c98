//! Error types for the reactive runtime.

use thiserror::Error;

use crate::graph::{ComputationKind, NodeId};

/// Result alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;

/// Everything that can go wrong while the graph runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A memo or effect body panicked.
    ///
    /// Caught at the node's boundary; other nodes keep running.
    #[error("{kind} {node} panicked: {message}")]
    Computation {
        /// The node whose body failed.
        node: NodeId,
        /// Whether the node is a memo or an effect.
        kind: ComputationKind,
        /// The panic payload, rendered as text.
        message: String,
    },

    /// A flush executed more nodes than the configured ceiling.
    ///
    /// Usually an effect writes a signal it also reads. The flush is
    /// aborted and every queue is emptied.
    #[error("potential infinite loop: flush executed {iterations} computations")]
    InfiniteLoop {
        /// How many computations ran before the flush was aborted.
        iterations: usize,
    },

    /// Marking recursed deeper than the configured ceiling.
    #[error("dependency chain deeper than {depth} while marking observers")]
    MarkDepthExceeded {
        /// The depth at which marking stopped.
        depth: usize,
    },

    /// A cleanup callback panicked while its owner was being cleaned.
    ///
    /// The remaining cleanups of the same owner still run.
    #[error("cleanup of {node} panicked: {message}")]
    Cleanup {
        /// The owner whose cleanup failed.
        node: NodeId,
        /// The panic payload, rendered as text.
        message: String,
    },

    /// A memo was read but has never produced a value.
    #[error("memo {node} has no value: its computation never completed")]
    MemoUnavailable {
        /// The memo that was read.
        node: NodeId,
    },
}

impl ReactiveError {
    /// Whether this error aborted a whole flush rather than a single node.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReactiveError::InfiniteLoop { .. } | ReactiveError::MarkDepthExceeded { .. }
        )
    }
}
