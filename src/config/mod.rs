/*!
Configuration of a reasoning context.

A [Config] aggregates the ordering and rewriting parameters a context is
built with. The defaults give quick, deterministic behaviour on the test
suite: linear KBO over a code-order total precedence, select-maximal
weights, no strong right-hand-side instantiation.
*/

use crate::ordering::{weightgen::WeightGenMethod, OrderingType};

/// The primary configuration structure.
#[derive(Clone, Debug)]
pub struct Config {
    /// Which term ordering to use.
    pub ordering: OrderingType,

    /// Encode the precedence as per-symbol weights (total from the start)
    /// instead of an extendable matrix.
    pub prec_by_weight: bool,

    /// How to generate the KBO symbol weights.
    pub weight_gen: WeightGenMethod,

    /// A weight every ordinary constant receives, overriding the
    /// generated one.
    pub const_weight: Option<i64>,

    /// The weight of a variable occurrence.
    pub var_weight: i64,

    /// Complete unbound right-hand-side variables with the designated
    /// minimal constant when testing whether a rule instance rewrites.
    pub rewrite_strong_rhs_inst: bool,

    /// Prefer more general demodulators during index search.
    pub prefer_general: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ordering: OrderingType::Kbo6,
            prec_by_weight: true,
            weight_gen: WeightGenMethod::SelectMaximal,
            const_weight: None,
            var_weight: 1,
            rewrite_strong_rhs_inst: false,
            prefer_general: false,
        }
    }
}
