/*!
Term orderings.

The [ordering control block](ocb::Ocb) aggregates everything a comparison
needs: a precedence on function codes (as a matrix of four-valued entries,
or weight-encoded when total), a per-symbol weight assignment, the variable
weight, and the reusable balance accumulator of the linear KBO.

Two comparison engines are provided:
- [kbo](kbo): the textbook recursive Knuth-Bendix ordering, and
- [kbolin](kbolin): the linear-time variant (KBO6), which computes weight
  and variable balances in a single interleaved traversal.

Both implement the same ordering; the test suite holds them to that.
[Weight generation](weightgen) fills the symbol-weight array from the
signature and, for the frequency schemes, an axiom set.
*/

pub mod kbo;
pub mod kbolin;
pub mod ocb;
pub mod weightgen;

/// The result of comparing two terms or two symbols.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareResult {
    /// Strictly greater.
    Greater,
    /// Strictly smaller.
    Less,
    /// Equal.
    Equal,
    /// Not related.
    Uncomparable,
}

impl CompareResult {
    /// The relation with both sides exchanged.
    pub fn inverse(self) -> CompareResult {
        match self {
            CompareResult::Greater => CompareResult::Less,
            CompareResult::Less => CompareResult::Greater,
            other => other,
        }
    }

    /// Translate a total-order comparison.
    pub fn from_ord(ord: std::cmp::Ordering) -> CompareResult {
        match ord {
            std::cmp::Ordering::Greater => CompareResult::Greater,
            std::cmp::Ordering::Less => CompareResult::Less,
            std::cmp::Ordering::Equal => CompareResult::Equal,
        }
    }
}

/// Which comparison engine an OCB drives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderingType {
    /// Textbook recursive KBO.
    Kbo,
    /// Linear KBO (KBO6).
    Kbo6,
    /// The empty ordering: identical terms are equal, nothing else is
    /// related.
    Empty,
}
