/*!
A library core for saturation-based equational theorem proving.

ember_fol implements the data structures and algorithms at the heart of a
first-order prover with equality: perfectly shared terms, the translation
of first-order formulas to clause normal form, Knuth-Bendix orderings for
orienting equations, and discrimination-tree driven rewriting. It is a
library for building provers and for investigating their machinery --- the
saturation loop, parsers, proof objects and heuristics are left to the
application.

# Orientation

Everything happens relative to a [context](context::ProverContext), which
owns one [signature](db::signature::Signature), one
[term bank](db::term_bank::TermBank), and the counters that would
otherwise be process globals.

At a high level:
- Terms live in the bank, hash-consed: structurally equal terms are one
  cell, and a [TermRef](structures::term::TermRef) *is* term identity.
- Formulas ([structures::formula]) are clausified by the fixed pass
  sequence in [procedures::cnf].
- Clauses live in [clause sets](db::clause_set::ClauseSet); a set may
  carry a [discrimination tree](index::pdtree::PdTree) over its unit
  equations, making it a demodulator set.
- An [ordering control block](ordering::ocb::Ocb) decides which way
  equations rewrite; [procedures::rewrite] computes leftmost-innermost
  normal forms against the demodulator sets.

# Example

Compare two ground terms under the Knuth-Bendix ordering:

```rust
use ember_fol::{
    context::ProverContext,
    ordering::CompareResult,
    structures::term::DerefKind,
};

let mut ctx = ProverContext::new();
let a = ctx.sig.intern_fun("a", 0).unwrap();
let f = ctx.sig.intern_fun("f", 1).unwrap();

let ta = ctx.bank.constant(&ctx.sig, a);
let fa = ctx.bank.insert(&ctx.sig, f, &[ta]);

let mut ocb = ctx.make_ocb();
let cmp = ocb.compare(&ctx.bank, fa, ta, DerefKind::Never, DerefKind::Never);
assert_eq!(cmp, CompareResult::Greater);
```

# Logs

Calls to [log] macros are made throughout, with targets listed in
[misc::log::targets] to narrow output to one subsystem. No log
implementation is provided.
*/

pub mod config;
pub mod context;
pub mod db;
pub mod index;
pub mod misc;
pub mod ordering;
pub mod procedures;
pub mod structures;
pub mod types;
