/*!
The owning stores of the core.

- The [signature](signature) maps symbol names to codes.
- The [variable bank](var_bank) pools variable cells.
- The [term bank](term_bank) owns all term cells, hash-consed.
- [Clause sets](clause_set) and [formula sets](formula_set) own clauses
  and formulas, and double as garbage-collection roots.

Ownership flows one way: sets hold clauses, clauses hold literals, literals
hold non-owning term references into the bank. The bank never refers back.
*/

pub mod clause_set;
pub mod formula_set;
pub mod signature;
pub mod term_bank;
pub mod var_bank;
