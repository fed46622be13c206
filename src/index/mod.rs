/*!
Term indexing.

- [pdtree]: perfect discrimination trees for one-way matching --- the
  retrieval structure behind demodulation.
- [overlap]: fingerprint-indexed subterm → clause-position maps --- the
  retrieval structure behind overlap (paramodulation candidate) queries.
*/

pub mod overlap;
pub mod pdtree;
