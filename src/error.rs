//! Errors raised by the matching engine.
//!
//! Apart from the two range errors, every variant is an internal invariant
//! violation: the algorithm is deterministic, so any of these means the
//! blossom bookkeeping is wrong and the computation cannot continue.

use thiserror::Error;

/// Result type alias using the engine's error.
pub type Result<T> = std::result::Result<T, MatchingError>;

/// Errors detected while computing a matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchingError {
    /// An edge weight does not fit the dual arithmetic of its type.
    #[error("weight of edge {edge} is outside the supported range")]
    WeightOutOfRange {
        /// Index of the edge in the input list
        edge: usize,
    },

    /// A dual variable or the matching's total weight left the range the
    /// weight type can carry.
    #[error("{0} overflows the weight type")]
    DualOverflow(&'static str),

    /// A vertex or its top-level blossom was labeled twice in one stage.
    #[error("vertex {vertex} (top-level blossom {blossom}) is already labeled")]
    AlreadyLabeled {
        /// The vertex being labeled
        vertex: usize,
        /// Its top-level blossom
        blossom: usize,
    },

    /// The base of an inner blossom must be matched.
    #[error("base {base} of inner blossom {blossom} is unmatched")]
    UnmatchedBase {
        /// The inner blossom
        blossom: usize,
        /// Its base vertex
        base: usize,
    },

    /// A blossom reached through the alternating tree carries no label origin.
    #[error("blossom {blossom} has no label origin")]
    MissingLabelEnd {
        /// The blossom without origin
        blossom: usize,
    },

    /// A blossom carries a label that contradicts its position in the tree.
    #[error("blossom {blossom} has an unexpected label: {reason}")]
    UnexpectedLabel {
        /// The offending blossom or vertex
        blossom: usize,
        /// Which expectation failed
        reason: &'static str,
    },

    /// The slack between two outer blossoms must be even.
    #[error("edge {edge} between outer blossoms has odd slack")]
    OddSlack {
        /// The least-slack edge
        edge: usize,
    },

    /// No blossom id is left in the pool.
    #[error("no unused blossom id left")]
    BlossomPoolExhausted,

    /// Parent/child links between blossoms are inconsistent.
    #[error("blossom nesting is broken at {blossom}: {reason}")]
    BrokenNesting {
        /// The blossom where the inconsistency was found
        blossom: usize,
        /// Which link failed
        reason: &'static str,
    },

    /// No dual update is possible although cardinality is not being maximised.
    #[error("no delta candidate found outside max-cardinality mode")]
    NoDeltaCandidate,

    /// The final mate table is not symmetric.
    #[error("vertex {vertex} is matched to {mate}, which is not matched back")]
    AsymmetricMate {
        /// The vertex
        vertex: usize,
        /// Its recorded mate
        mate: usize,
    },

    /// The dual solution does not certify the matching as optimal.
    #[error("optimality check failed: {0}")]
    NotOptimal(&'static str),
}

/// Return early with `$err` unless `$cond` holds.
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

pub(crate) use ensure;
