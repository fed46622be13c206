/*!
The variable bank: the pool of variable cells, keyed by (negative) code.

Variables are term cells like any other, stored in the term bank's arena,
but they are never garbage collected and never hash-consed by structure ---
the bank hands out the unique cell for each code. The bank also issues
fresh variables, driven by a counter which the CNF passes reset above the
largest code in use (see
[formula_var_rename](crate::procedures::cnf::formula_var_rename)).
*/

use rustc_hash::FxHashMap;

use crate::{structures::term::TermRef, types::FunCode};

/// The pool of variables of one term bank.
#[derive(Clone, Debug, Default)]
pub struct VarBank {
    by_code: FxHashMap<FunCode, TermRef>,
    v_count: u64,
}

impl VarBank {
    /// The cell for `code`, if one was ever created.
    pub fn get(&self, code: FunCode) -> Option<TermRef> {
        self.by_code.get(&code).copied()
    }

    pub(crate) fn record(&mut self, code: FunCode, cell: TermRef) {
        debug_assert!(code < 0);
        self.by_code.insert(code, cell);
        self.v_count = self.v_count.max(code.unsigned_abs());
    }

    /// The magnitude of the largest variable code known to the bank.
    pub fn v_count(&self) -> u64 {
        self.v_count
    }

    /// Set the fresh-variable counter. The next fresh variable will have
    /// code `-(count + 1)`.
    ///
    /// Callers renaming bound variables must set this above the largest
    /// code occurring in the renamed structure first.
    pub fn set_v_count(&mut self, count: u64) {
        self.v_count = count;
    }

    /// Reset the fresh-variable counter to zero, reusing codes from `-1`
    /// upward. Used when normalizing clause variables to a dense numbering.
    pub fn reset_v_count(&mut self) {
        self.v_count = 0;
    }

    /// The code the next fresh variable will receive, advancing the
    /// counter.
    pub(crate) fn next_fresh_code(&mut self) -> FunCode {
        self.v_count += 1;
        -(self.v_count as FunCode)
    }

    /// All variable cells in the pool.
    pub fn cells(&self) -> impl Iterator<Item = TermRef> + '_ {
        self.by_code.values().copied()
    }
}
