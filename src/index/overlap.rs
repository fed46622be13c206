/*!
The overlap index: subterm → clause-position maps under a fingerprint
index.

The index answers "which clause positions could overlap with this term":
- *into* entries are the non-variable subterms of maximal sides of maximal
  literals --- the positions a rule could rewrite into;
- *from* entries are the top positions of positive, maximal, unselected
  literals (both sides when un-oriented) --- the rule sides themselves.

Positions are *compact*: the running sum of standard weights along the
clause's left-to-right traversal. They are monotonic, cheap to compare,
and can be re-derived during deletion without storing paths.

The first index level is a term fingerprint (top symbols sampled at the
root and the first two argument positions); the second maps the exact
shared term to its clause/position occurrences. Fingerprint compatibility
gives a cheap superset of the unifiable candidates.
*/

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::{
    db::{clause_set::ClauseRef, term_bank::TermBank},
    misc::log::targets,
    structures::{clause::Clause, eqn::Eqn, term::{TermRef, DEFAULT_FWEIGHT}},
    types::FunCode,
};

/// A compact position: accumulated standard weight along the LR traversal
/// of a clause.
pub type CompactPos = u64;

/// One sampled fingerprint position.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FpSym {
    /// A function symbol heads the sampled position.
    Sym(FunCode),
    /// A variable sits at the sampled position.
    Var,
    /// The sampled position is below a variable.
    BelowVar,
    /// The sampled position does not exist.
    Nothing,
}

/// A three-position term fingerprint: root, first argument, second
/// argument.
pub type Fingerprint = [FpSym; 3];

/// Sample the fingerprint of `term`.
pub fn fingerprint(bank: &TermBank, term: TermRef) -> Fingerprint {
    [
        sample(bank, term, None),
        sample(bank, term, Some(0)),
        sample(bank, term, Some(1)),
    ]
}

fn sample(bank: &TermBank, term: TermRef, arg: Option<usize>) -> FpSym {
    let cell = bank.cell(term);
    match arg {
        None => {
            if cell.is_var() {
                FpSym::Var
            } else {
                FpSym::Sym(cell.f_code)
            }
        }
        Some(index) => {
            if cell.is_var() {
                FpSym::BelowVar
            } else {
                match cell.args.get(index) {
                    None => FpSym::Nothing,
                    Some(&sub) => {
                        if bank.is_var(sub) {
                            FpSym::Var
                        } else {
                            FpSym::Sym(bank.cell(sub).f_code)
                        }
                    }
                }
            }
        }
    }
}

/// True if terms with these fingerprint entries could unify.
fn fp_sym_unify_compatible(a: FpSym, b: FpSym) -> bool {
    match (a, b) {
        (FpSym::BelowVar, _) | (_, FpSym::BelowVar) => true,
        (FpSym::Nothing, FpSym::Nothing) => true,
        (FpSym::Nothing, _) | (_, FpSym::Nothing) => false,
        (FpSym::Var, _) | (_, FpSym::Var) => true,
        (FpSym::Sym(f), FpSym::Sym(g)) => f == g,
    }
}

/// True if `a` and `b` admit a unifier, judged by fingerprints alone.
pub fn fp_unify_compatible(a: &Fingerprint, b: &Fingerprint) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(&x, &y)| fp_sym_unify_compatible(x, y))
}

type PosSet = BTreeSet<CompactPos>;
type ClausePosMap = FxHashMap<ClauseRef, PosSet>;
type SubtermMap = FxHashMap<TermRef, ClausePosMap>;

/// The two-level index.
#[derive(Debug, Default)]
pub struct OverlapIndex {
    fp: FxHashMap<Fingerprint, SubtermMap>,
}

impl OverlapIndex {
    /// An empty index.
    pub fn new() -> Self {
        OverlapIndex::default()
    }

    /// True if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.fp.is_empty()
    }

    /// Total number of (clause, position) entries.
    pub fn entry_count(&self) -> usize {
        self.fp
            .values()
            .flat_map(|sub| sub.values())
            .map(|cp| cp.values().map(|set| set.len()).sum::<usize>())
            .sum()
    }

    /// Record that `clause`'s subterm at `pos` is `term`.
    pub fn insert_pos(
        &mut self,
        bank: &TermBank,
        clause: ClauseRef,
        pos: CompactPos,
        term: TermRef,
    ) {
        let print = fingerprint(bank, term);
        self.fp
            .entry(print)
            .or_default()
            .entry(term)
            .or_default()
            .entry(clause)
            .or_default()
            .insert(pos);
    }

    /// Remove the association `clause @ pos -> term`, pruning empty
    /// levels.
    pub fn delete_pos(
        &mut self,
        bank: &TermBank,
        clause: ClauseRef,
        pos: CompactPos,
        term: TermRef,
    ) {
        let print = fingerprint(bank, term);
        let Some(sub) = self.fp.get_mut(&print) else {
            return;
        };
        let Some(clause_map) = sub.get_mut(&term) else {
            return;
        };
        if let Some(set) = clause_map.get_mut(&clause) {
            set.remove(&pos);
            if set.is_empty() {
                clause_map.remove(&clause);
            }
        }
        if clause_map.is_empty() {
            sub.remove(&term);
        }
        if sub.is_empty() {
            self.fp.remove(&print);
        }
    }

    /// Remove every position of `clause` recorded under `term`.
    pub fn delete_clause_occ(&mut self, bank: &TermBank, clause: ClauseRef, term: TermRef) {
        let print = fingerprint(bank, term);
        let Some(sub) = self.fp.get_mut(&print) else {
            return;
        };
        let Some(clause_map) = sub.get_mut(&term) else {
            return;
        };
        clause_map.remove(&clause);
        if clause_map.is_empty() {
            sub.remove(&term);
        }
        if sub.is_empty() {
            self.fp.remove(&print);
        }
    }

    /// The exact occurrences of `term`, as (clause, position) pairs.
    pub fn positions_of(&self, bank: &TermBank, term: TermRef) -> Vec<(ClauseRef, CompactPos)> {
        let print = fingerprint(bank, term);
        let mut result = Vec::new();
        if let Some(clause_map) = self.fp.get(&print).and_then(|sub| sub.get(&term)) {
            for (&clause, positions) in clause_map {
                for &pos in positions {
                    result.push((clause, pos));
                }
            }
        }
        result
    }

    /// All indexed occurrences whose term could unify with `query`,
    /// judged by fingerprints: a superset of the truly unifiable ones,
    /// for the caller to filter.
    pub fn unify_candidates(
        &self,
        bank: &TermBank,
        query: TermRef,
    ) -> Vec<(TermRef, ClauseRef, CompactPos)> {
        let print = fingerprint(bank, query);
        let mut result = Vec::new();
        for (stored_print, sub) in &self.fp {
            if !fp_unify_compatible(&print, stored_print) {
                continue;
            }
            for (&term, clause_map) in sub {
                for (&clause, positions) in clause_map {
                    for &pos in positions {
                        result.push((term, clause, pos));
                    }
                }
            }
        }
        result
    }

    /// Index every paramodulation-into position of `clause`.
    pub fn insert_into_clause(&mut self, bank: &TermBank, cref: ClauseRef, clause: &Clause) {
        let mut collector = Vec::new();
        clause_collect_into_terms_pos(bank, clause, &mut collector);
        for (term, pos) in collector {
            self.insert_pos(bank, cref, pos, term);
        }
        log::trace!(target: targets::OVERLAP, "Indexed into-positions of {}.", clause.ident);
    }

    /// Remove every into-entry of `clause`.
    pub fn delete_into_clause(&mut self, bank: &TermBank, cref: ClauseRef, clause: &Clause) {
        let mut collector = Vec::new();
        clause_collect_into_terms_pos(bank, clause, &mut collector);
        for (term, _) in collector {
            self.delete_clause_occ(bank, cref, term);
        }
    }

    /// Index every paramodulation-from position of `clause`.
    pub fn insert_from_clause(&mut self, bank: &TermBank, cref: ClauseRef, clause: &Clause) {
        let mut collector = Vec::new();
        clause_collect_from_terms_pos(bank, clause, &mut collector);
        for (term, pos) in collector {
            self.insert_pos(bank, cref, pos, term);
        }
        log::trace!(target: targets::OVERLAP, "Indexed from-positions of {}.", clause.ident);
    }

    /// Remove every from-entry of `clause`.
    pub fn delete_from_clause(&mut self, bank: &TermBank, cref: ClauseRef, clause: &Clause) {
        let mut collector = Vec::new();
        clause_collect_from_terms_pos(bank, clause, &mut collector);
        for (term, _) in collector {
            self.delete_clause_occ(bank, cref, term);
        }
    }
}

/// Collect every non-variable subterm of `term` with its compact
/// position, starting at `pos`.
pub fn term_collect_into_terms_pos(
    bank: &TermBank,
    term: TermRef,
    pos: CompactPos,
    acc: &mut Vec<(TermRef, CompactPos)>,
) {
    let cell = bank.cell(term);
    if cell.is_var() {
        return;
    }
    acc.push((term, pos));
    let mut pos = pos + DEFAULT_FWEIGHT;
    for &arg in &cell.args {
        term_collect_into_terms_pos(bank, arg, pos, acc);
        pos += bank.weight(arg);
    }
}

/// Collect the paramodulation-into positions of a literal starting at
/// `litpos`: the left side, and the right side when un-oriented.
pub fn eqn_collect_into_terms_pos(
    bank: &TermBank,
    lit: &Eqn,
    litpos: CompactPos,
    acc: &mut Vec<(TermRef, CompactPos)>,
) {
    term_collect_into_terms_pos(bank, lit.lterm, litpos, acc);
    if !lit.is_oriented() {
        let rpos = litpos + bank.weight(lit.lterm);
        term_collect_into_terms_pos(bank, lit.rterm, rpos, acc);
    }
}

/// Collect the paramodulation-into positions of a clause: subterms of
/// maximal sides of maximal literals.
pub fn clause_collect_into_terms_pos(
    bank: &TermBank,
    clause: &Clause,
    acc: &mut Vec<(TermRef, CompactPos)>,
) {
    let mut pos: CompactPos = 0;
    for lit in &clause.literals {
        if lit.is_maximal() {
            eqn_collect_into_terms_pos(bank, lit, pos, acc);
        }
        pos += lit.standard_weight(bank);
    }
}

/// Collect the paramodulation-from positions of a clause: the sides of
/// positive, maximal, unselected literals usable as rewrite sources.
pub fn clause_collect_from_terms_pos(
    bank: &TermBank,
    clause: &Clause,
    acc: &mut Vec<(TermRef, CompactPos)>,
) {
    let mut pos: CompactPos = 0;
    for lit in &clause.literals {
        if lit.is_maximal() && lit.is_positive() && !lit.is_selected() {
            acc.push((lit.lterm, pos));
            if !lit.is_oriented() {
                acc.push((lit.rterm, pos + bank.weight(lit.lterm)));
            }
        }
        pos += lit.standard_weight(bank);
    }
}
