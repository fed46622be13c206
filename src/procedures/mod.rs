/*!
The algorithms of the core, factored per concern.

- [cnf]: the formula-to-clause pipeline.
- [rewrite]: leftmost-innermost normalization against demodulator sets.
*/

pub mod cnf;
pub mod rewrite;
