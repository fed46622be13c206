/*!
Miscellaneous items related to [logging](log).

Calls to the log macros are made throughout the library.
These are intended to provide useful information for extending the library
and/or fixing issues.

Note, no log implementation is provided.
For more details, see [log].
*/

/// Targets to be used within a [log]! macro.
pub mod targets {
    /// Logs related to the [term bank](crate::db::term_bank).
    pub const TERM_BANK: &str = "term_bank";

    /// Logs related to garbage collection.
    pub const GC: &str = "gc";

    /// Logs related to the [CNF pipeline](crate::procedures::cnf).
    pub const CNF: &str = "cnf";

    /// Logs related to the [discrimination tree](crate::index::pdtree).
    pub const PDT: &str = "pdt_index";

    /// Logs related to the [overlap index](crate::index::overlap).
    pub const OVERLAP: &str = "overlap_index";

    /// Logs related to [rewriting](crate::procedures::rewrite).
    pub const REWRITE: &str = "rewrite";

    /// Logs related to [orderings](crate::ordering).
    pub const ORDERING: &str = "ordering";

    /// Logs related to [clause sets](crate::db::clause_set).
    pub const CLAUSE_SET: &str = "clause_set";
}
