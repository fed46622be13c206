//! Shared scalar types and error types.

pub mod err;

/// A function symbol code. Positive codes name function (and predicate)
/// symbols in a [signature](crate::db::signature::Signature), negative codes
/// name variables.
pub type FunCode = i64;

/// A sort code. The core distinguishes the sort of individuals from the
/// boolean sort of atoms; further sorts may be interned by applications.
pub type SortCode = u32;

/// The sort of individuals, the default for function symbols and variables.
pub const SORT_INDIVIDUAL: SortCode = 0;

/// The boolean sort, carried by atoms (terms with a predicate head).
pub const SORT_BOOL: SortCode = 1;

/// A monotonic creation tick.
///
/// Dates order clauses by the time they entered a set, and stamp the
/// normal-form knowledge of term cells. They are issued by a per-context
/// [Counters](crate::context::Counters) block, never by a process global.
pub type Date = u64;

/// The date before anything was created.
pub const DATE_CREATION: Date = 0;
