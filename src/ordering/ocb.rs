/*!
The ordering control block.

An OCB snapshots the signature size at construction and carries, for the
codes covered by the snapshot:

- a precedence --- either a full matrix of four-valued entries (extendable
  one tuple at a time, with the transitive closure maintained and
  inconsistent additions refused atomically), or a weight-encoded total
  precedence;
- the per-symbol KBO weight array and the variable weight;
- a cache of the designated minimal constant per sort;
- the balance accumulator the linear KBO works in.

`$true` is minimal in every precedence. Distinct-object symbols form a
block above all ordinary symbols, ordered among themselves by code.
Symbols interned after the snapshot compare below every covered symbol ---
which is exactly right for the Skolem constants the minimal-constant
search may create.
*/

use rustc_hash::FxHashMap;

use crate::{
    db::{signature::{FuncProps, Signature, SIG_TRUE_CODE}, term_bank::TermBank},
    misc::log::targets,
    ordering::{kbo, kbolin, CompareResult, OrderingType},
    structures::term::{DerefKind, TermRef},
    types::{err::OrderingError, FunCode, SortCode},
};

/// The balance accumulator of the linear KBO.
#[derive(Clone, Debug, Default)]
pub struct KboBalance {
    /// The weight balance: weight added on the left, subtracted on the
    /// right.
    pub wb: i64,
    /// Number of variables with positive occurrence balance.
    pub pos_bal: i64,
    /// Number of variables with negative occurrence balance.
    pub neg_bal: i64,
    /// Largest variable index touched since the last reset.
    pub max_var: usize,
    /// Occurrence balance per variable index.
    pub vb: Vec<i64>,
}

impl KboBalance {
    /// Zero the accumulator. Only the indices touched since the last
    /// reset are cleared.
    pub fn reset(&mut self) {
        for slot in self.vb.iter_mut().take(self.max_var + 1) {
            *slot = 0;
        }
        self.wb = 0;
        self.pos_bal = 0;
        self.neg_bal = 0;
        self.max_var = 0;
    }

    /// The balance slot for a variable index, growing on demand.
    pub fn slot(&mut self, index: usize) -> &mut i64 {
        if index >= self.vb.len() {
            self.vb.resize(index + 1, 0);
        }
        if index > self.max_var {
            self.max_var = index;
        }
        &mut self.vb[index]
    }
}

/// A checkpoint of the precedence, for [backtrack](Ocb::backtrack).
pub type PrecStateHandle = usize;

/// An ordering control block.
#[derive(Clone, Debug)]
pub struct Ocb {
    /// Which comparison engine the block drives.
    pub typ: OrderingType,
    sig_size: FunCode,
    precedence: Option<Vec<CompareResult>>,
    prec_weights: Option<Vec<i64>>,
    weights: Vec<i64>,
    /// The weight every variable occurrence contributes.
    pub var_weight: i64,
    min_constants: FxHashMap<SortCode, FunCode>,
    statestack: Vec<(FunCode, FunCode)>,
    /// Complete unbound right-hand-side variables with the minimal
    /// constant when deciding whether a rule instance rewrites.
    pub rewrite_strong_rhs_inst: bool,
    /// The KBO balance accumulator.
    pub balance: KboBalance,
}

impl Ocb {
    /// A fresh OCB over the current symbols of `sig`. With
    /// `prec_by_weight`, the precedence is weight-encoded and total from
    /// the start (by code order); otherwise it is a matrix holding only
    /// the built-in relations, to be extended tuple by tuple.
    pub fn new(typ: OrderingType, prec_by_weight: bool, sig: &Signature) -> Self {
        let sig_size = sig.f_count();
        let mut ocb = Ocb {
            typ,
            sig_size,
            precedence: None,
            prec_weights: None,
            weights: vec![1; (sig_size + 1) as usize],
            var_weight: 1,
            min_constants: FxHashMap::default(),
            statestack: Vec::new(),
            rewrite_strong_rhs_inst: false,
            balance: KboBalance::default(),
        };

        if prec_by_weight {
            let mut weights = vec![0i64; (sig_size + 1) as usize];
            for f in 1..=sig_size {
                weights[f as usize] = if sig.has_prop(f, FuncProps::DISTINCT_OBJECT) {
                    sig_size + f
                } else {
                    f
                };
            }
            ocb.prec_weights = Some(weights);
        } else {
            let size = (sig_size * sig_size) as usize;
            let mut matrix = vec![CompareResult::Uncomparable; size];
            let at = |f: FunCode, g: FunCode| ((f - 1) * sig_size + (g - 1)) as usize;
            for f in 1..=sig_size {
                matrix[at(f, f)] = CompareResult::Equal;
            }
            // $true is minimal, distinct objects are a block above
            // everything else.
            for f in 1..=sig_size {
                if f != SIG_TRUE_CODE {
                    matrix[at(SIG_TRUE_CODE, f)] = CompareResult::Less;
                    matrix[at(f, SIG_TRUE_CODE)] = CompareResult::Greater;
                }
            }
            for f in 1..=sig_size {
                if !sig.has_prop(f, FuncProps::DISTINCT_OBJECT) {
                    continue;
                }
                for g in 1..=sig_size {
                    if f == g {
                        continue;
                    }
                    let rel = if sig.has_prop(g, FuncProps::DISTINCT_OBJECT) {
                        CompareResult::from_ord(f.cmp(&g))
                    } else {
                        CompareResult::Greater
                    };
                    matrix[at(f, g)] = rel;
                    matrix[at(g, f)] = rel.inverse();
                }
            }
            ocb.precedence = Some(matrix);
        }
        ocb
    }

    /// The signature-size snapshot the block covers.
    pub fn sig_size(&self) -> FunCode {
        self.sig_size
    }

    fn matrix_index(&self, f: FunCode, g: FunCode) -> usize {
        debug_assert!(f >= 1 && f <= self.sig_size && g >= 1 && g <= self.sig_size);
        ((f - 1) * self.sig_size + (g - 1)) as usize
    }

    /// The KBO weight of a symbol. Variables weigh
    /// [var_weight](Ocb::var_weight); symbols past the snapshot weigh 1.
    pub fn fun_weight(&self, f_code: FunCode) -> i64 {
        if f_code < 0 {
            return self.var_weight;
        }
        if f_code > self.sig_size {
            return 1;
        }
        self.weights[f_code as usize]
    }

    /// Set the KBO weight of a covered symbol.
    pub fn set_fun_weight(&mut self, f_code: FunCode, weight: i64) {
        debug_assert!(f_code >= 1 && f_code <= self.sig_size);
        self.weights[f_code as usize] = weight;
    }

    /// Compare two symbols in the precedence.
    pub fn fun_compare(&self, f: FunCode, g: FunCode) -> CompareResult {
        if f == g {
            return CompareResult::Equal;
        }
        // Symbols beyond the snapshot are smaller than every covered
        // symbol, and ordered by code among themselves.
        if f > self.sig_size || g > self.sig_size {
            return if f > self.sig_size && g > self.sig_size {
                CompareResult::from_ord(f.cmp(&g))
            } else if f > self.sig_size {
                CompareResult::Less
            } else {
                CompareResult::Greater
            };
        }
        if let Some(matrix) = &self.precedence {
            return matrix[self.matrix_index(f, g)];
        }
        let weights = self
            .prec_weights
            .as_ref()
            .expect("an OCB carries a matrix or a weight-encoded precedence");
        CompareResult::from_ord(weights[f as usize].cmp(&weights[g as usize]))
    }

    /// The current precedence checkpoint.
    pub fn precedence_state(&self) -> PrecStateHandle {
        self.statestack.len()
    }

    /// Add `rel(f, g)` to the precedence and close it transitively. On
    /// any contradiction with recorded relations the precedence is
    /// restored to its state at entry and the addition is refused.
    pub fn add_precedence_tuple(
        &mut self,
        f: FunCode,
        g: FunCode,
        rel: CompareResult,
    ) -> Result<(), OrderingError> {
        assert!(rel != CompareResult::Uncomparable);
        if self.precedence.is_none() {
            return Err(OrderingError::NotMatrixMode);
        }
        let entry = self.precedence_state();
        match self.add_tuple_rec(f, g, rel) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.backtrack(entry);
                log::debug!(target: targets::ORDERING,
                    "Refused precedence tuple {f} {rel:?} {g}.");
                Err(e)
            }
        }
    }

    fn add_tuple_rec(
        &mut self,
        f: FunCode,
        g: FunCode,
        rel: CompareResult,
    ) -> Result<(), OrderingError> {
        let current = self.fun_compare(f, g);
        if current == rel {
            return Ok(());
        }
        if current != CompareResult::Uncomparable {
            return Err(OrderingError::PrecedenceInconsistent);
        }
        self.statestack.push((f, g));
        let fi = self.matrix_index(f, g);
        let gi = self.matrix_index(g, f);
        let matrix = self.precedence.as_mut().expect("matrix mode");
        matrix[fi] = rel;
        matrix[gi] = rel.inverse();

        for h in 1..=self.sig_size {
            self.trans_compute(f, g, h)?;
            self.trans_compute(h, f, g)?;
        }
        Ok(())
    }

    /// Given `rel(f1, f2)` and `rel(f2, f3)`, derive and record the
    /// relation between `f1` and `f3`, if any.
    fn trans_compute(
        &mut self,
        f1: FunCode,
        f2: FunCode,
        f3: FunCode,
    ) -> Result<(), OrderingError> {
        let rel12 = self.fun_compare(f1, f2);
        let rel23 = self.fun_compare(f2, f3);
        match rel12 {
            CompareResult::Uncomparable => Ok(()),
            CompareResult::Equal => {
                if rel23 != CompareResult::Uncomparable {
                    self.add_tuple_rec(f1, f3, rel23)
                } else {
                    Ok(())
                }
            }
            CompareResult::Greater => match rel23 {
                CompareResult::Equal | CompareResult::Greater => {
                    self.add_tuple_rec(f1, f3, CompareResult::Greater)
                }
                _ => Ok(()),
            },
            CompareResult::Less => match rel23 {
                CompareResult::Equal | CompareResult::Less => {
                    self.add_tuple_rec(f1, f3, CompareResult::Less)
                }
                _ => Ok(()),
            },
        }
    }

    /// Roll the precedence back to `state`.
    pub fn backtrack(&mut self, state: PrecStateHandle) {
        while self.statestack.len() > state {
            let (f, g) = self.statestack.pop().expect("non-empty state stack");
            let fi = self.matrix_index(f, g);
            let gi = self.matrix_index(g, f);
            let matrix = self
                .precedence
                .as_mut()
                .expect("only matrix precedences have state");
            matrix[fi] = CompareResult::Uncomparable;
            matrix[gi] = CompareResult::Uncomparable;
        }
    }

    /// The cached minimal constant for `sort`, if fixed.
    pub fn min_const(&self, sort: SortCode) -> Option<FunCode> {
        self.min_constants.get(&sort).copied()
    }

    /// Fix the minimal constant for `sort` unless already fixed.
    pub fn cond_set_min_const(&mut self, sort: SortCode, cand: FunCode) {
        self.min_constants.entry(sort).or_insert(cand);
    }

    /// The designated minimal constant for `sort`: the precedence-minimal
    /// ordinary constant of that sort, created as a fresh Skolem constant
    /// if none exists. Cached once found.
    pub fn find_min_const(&mut self, sig: &mut Signature, sort: SortCode) -> FunCode {
        if let Some(cand) = self.min_const(sort) {
            return cand;
        }
        let mut cand = 0;
        for f in (sig.internal_symbols() + 1)..=sig.f_count() {
            if sig.is_fun_const(f)
                && sig.result_sort(f) == sort
                && (cand == 0 || self.fun_compare(f, cand) == CompareResult::Less)
            {
                cand = f;
            }
        }
        if cand == 0 {
            cand = sig.fresh_skolem(0, sort);
        }
        self.cond_set_min_const(sort, cand);
        cand
    }

    /// The designated minimum term for `sort`.
    pub fn designated_min_term(
        &mut self,
        sig: &mut Signature,
        bank: &mut TermBank,
        sort: SortCode,
    ) -> TermRef {
        let cand = self.find_min_const(sig, sort);
        bank.min_term(sig, cand)
    }

    /// Compare two terms under the block's engine.
    pub fn compare(
        &mut self,
        bank: &TermBank,
        s: TermRef,
        t: TermRef,
        deref_s: DerefKind,
        deref_t: DerefKind,
    ) -> CompareResult {
        match self.typ {
            OrderingType::Kbo6 => kbolin::kbo6_compare(self, bank, s, t, deref_s, deref_t),
            OrderingType::Kbo => kbo::kbo_compare(self, bank, s, t, deref_s, deref_t),
            OrderingType::Empty => {
                let (s, _) = bank.deref(s, deref_s);
                let (t, _) = bank.deref(t, deref_t);
                if s == t {
                    CompareResult::Equal
                } else {
                    CompareResult::Uncomparable
                }
            }
        }
    }

    /// True if `s` is strictly greater than `t`.
    pub fn greater(
        &mut self,
        bank: &TermBank,
        s: TermRef,
        t: TermRef,
        deref_s: DerefKind,
        deref_t: DerefKind,
    ) -> bool {
        self.compare(bank, s, t, deref_s, deref_t) == CompareResult::Greater
    }

    /// A precedence-maximal function code of `term`. Follows bindings
    /// once. Returns 0 for a variable.
    pub fn term_max_fun_code(&self, bank: &TermBank, term: TermRef) -> FunCode {
        let (term, _) = bank.deref(term, DerefKind::Once);
        let cell = bank.cell(term);
        if cell.is_var() {
            return 0;
        }
        let mut res = cell.f_code;
        for &arg in &cell.args {
            let tmp = self.term_max_fun_code(bank, arg);
            if tmp != 0 && self.fun_compare(tmp, res) == CompareResult::Greater {
                res = tmp;
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig_with(names: &[(&str, usize)]) -> Signature {
        let mut sig = Signature::new();
        for &(name, arity) in names {
            sig.intern_fun(name, arity).unwrap();
        }
        sig
    }

    #[test]
    fn transitive_closure_is_computed() {
        let sig = sig_with(&[("a", 0), ("b", 0), ("c", 0)]);
        let a = sig.code_of("a").unwrap();
        let b = sig.code_of("b").unwrap();
        let c = sig.code_of("c").unwrap();
        let mut ocb = Ocb::new(OrderingType::Kbo6, false, &sig);

        ocb.add_precedence_tuple(a, b, CompareResult::Greater).unwrap();
        ocb.add_precedence_tuple(b, c, CompareResult::Greater).unwrap();
        assert_eq!(ocb.fun_compare(a, c), CompareResult::Greater);
        assert_eq!(ocb.fun_compare(c, a), CompareResult::Less);
    }

    #[test]
    fn inconsistent_addition_is_atomic() {
        let sig = sig_with(&[("a", 0), ("b", 0), ("c", 0), ("d", 0)]);
        let a = sig.code_of("a").unwrap();
        let b = sig.code_of("b").unwrap();
        let c = sig.code_of("c").unwrap();
        let d = sig.code_of("d").unwrap();
        let mut ocb = Ocb::new(OrderingType::Kbo6, false, &sig);

        ocb.add_precedence_tuple(a, b, CompareResult::Greater).unwrap();
        ocb.add_precedence_tuple(c, d, CompareResult::Greater).unwrap();
        let state = ocb.precedence_state();

        // b > c forces a > d; d > a then contradicts.
        ocb.add_precedence_tuple(b, c, CompareResult::Greater).unwrap();
        assert_eq!(ocb.fun_compare(a, d), CompareResult::Greater);
        assert_eq!(
            ocb.add_precedence_tuple(d, a, CompareResult::Greater),
            Err(OrderingError::PrecedenceInconsistent)
        );
        // The failed addition left no trace.
        assert_eq!(ocb.fun_compare(a, d), CompareResult::Greater);

        ocb.backtrack(state);
        assert_eq!(ocb.fun_compare(b, c), CompareResult::Uncomparable);
        assert_eq!(ocb.fun_compare(a, d), CompareResult::Uncomparable);
        assert_eq!(ocb.fun_compare(a, b), CompareResult::Greater);
    }

    #[test]
    fn true_is_minimal() {
        let sig = sig_with(&[("a", 0)]);
        let a = sig.code_of("a").unwrap();
        let ocb = Ocb::new(OrderingType::Kbo6, false, &sig);
        assert_eq!(ocb.fun_compare(SIG_TRUE_CODE, a), CompareResult::Less);

        let ocb = Ocb::new(OrderingType::Kbo6, true, &sig);
        assert_eq!(ocb.fun_compare(SIG_TRUE_CODE, a), CompareResult::Less);
    }
}
