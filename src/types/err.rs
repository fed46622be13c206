/*!
Error types used in the library.

Only *refused operations* surface as errors --- a caller asked for something
the current state does not permit, and is expected to cope. Invariant
violations (a formula with an unexpected operator after NNF, an arity
mismatch on term construction) are programming errors and panic instead;
the core never attempts to recover from those.
*/

use crate::types::FunCode;

/// Errors from the signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureError {
    /// A symbol was interned a second time with a different arity.
    ArityConflict {
        /// The code under which the name is already interned.
        code: FunCode,
        /// The arity on record.
        expected: usize,
        /// The arity of the conflicting mention.
        given: usize,
    },
}

/// Errors from the ordering control block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderingError {
    /// The requested precedence tuple contradicts the transitive closure of
    /// the recorded precedence. The precedence is unchanged.
    PrecedenceInconsistent,

    /// Precedence tuples can only be added to a matrix-mode precedence; a
    /// weight-encoded precedence is total from the start.
    NotMatrixMode,
}
