/*!
Clauses: multisets of equational literals, read as universally closed
disjunctions.

A clause caches its positive/negative literal counts and its standard
weight; the mutating operations below keep the caches exact. Clauses carry
a numeric ident and a creation date, both issued by the per-context
[Counters](crate::context::Counters) --- dates key the age constraints of
the discrimination tree, idents key rewrite links.
*/

use std::cmp::Ordering;

use crate::{
    db::term_bank::TermBank,
    structures::{
        eqn::{Eqn, EqnProps},
        Role,
    },
    types::Date,
};

/// Property bits of a clause.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClauseProps(u16);

impl ClauseProps {
    /// The clause is unchanged since it was created from the input.
    pub const INITIAL: ClauseProps = ClauseProps(1 << 0);

    /// The clause stems from an input formula.
    pub const INPUT: ClauseProps = ClauseProps(1 << 1);

    /// The clause belongs to the set of support.
    pub const SOS: ClauseProps = ClauseProps(1 << 2);

    /// The clause has been processed by the outer loop.
    pub const PROCESSED: ClauseProps = ClauseProps(1 << 3);

    /// The clause is recorded in a demodulator index.
    pub const D_INDEXED: ClauseProps = ClauseProps(1 << 4);

    /// The clause is recorded in a subterm (overlap) index.
    pub const S_INDEXED: ClauseProps = ClauseProps(1 << 5);

    /// True if every bit of `prop` is set.
    pub fn has(self, prop: ClauseProps) -> bool {
        self.0 & prop.0 == prop.0
    }

    /// Set every bit of `prop`.
    pub fn set(&mut self, prop: ClauseProps) {
        self.0 |= prop.0;
    }

    /// Clear every bit of `prop`.
    pub fn clear(&mut self, prop: ClauseProps) {
        self.0 &= !prop.0;
    }
}

/// A clause.
#[derive(Clone, Debug)]
pub struct Clause {
    /// Numeric identity, unique per context.
    pub ident: u64,
    /// The literals.
    pub literals: Vec<Eqn>,
    /// Count of positive literals.
    pub pos_lit_no: usize,
    /// Count of negative literals.
    pub neg_lit_no: usize,
    /// Cached standard weight (sum of literal standard weights).
    pub weight: u64,
    /// Creation date.
    pub date: Date,
    /// Input role, inherited through transformations.
    pub role: Role,
    /// Property bits.
    pub props: ClauseProps,
}

impl Clause {
    /// A clause over `literals`, with counters and weight computed.
    pub fn new(bank: &TermBank, ident: u64, date: Date, literals: Vec<Eqn>, role: Role) -> Self {
        let pos_lit_no = literals.iter().filter(|l| l.is_positive()).count();
        let neg_lit_no = literals.len() - pos_lit_no;
        let weight = literals.iter().map(|l| l.standard_weight(bank)).sum();
        let mut props = ClauseProps::default();
        props.set(ClauseProps::INITIAL);
        Clause {
            ident,
            literals,
            pos_lit_no,
            neg_lit_no,
            weight,
            date,
            role,
            props,
        }
    }

    /// The number of literals.
    pub fn lit_count(&self) -> usize {
        self.literals.len()
    }

    /// True for the empty clause.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// True for a one-literal clause.
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    /// True if every literal is positive.
    pub fn is_positive(&self) -> bool {
        self.neg_lit_no == 0
    }

    /// True if the clause can serve as a demodulator: a positive unit
    /// equation.
    pub fn is_demodulator(&self) -> bool {
        self.is_unit() && self.pos_lit_no == 1 && self.literals[0].is_equational()
    }

    /// Recompute the cached standard weight.
    pub fn recompute_weight(&mut self, bank: &TermBank) {
        self.weight = self
            .literals
            .iter()
            .map(|l| l.standard_weight(bank))
            .sum();
    }

    /// Remove and return the literal at `index`, maintaining counters and
    /// weight. Set-level literal counts are the caller's concern.
    pub fn remove_literal(&mut self, bank: &TermBank, index: usize) -> Eqn {
        let lit = self.literals.remove(index);
        if lit.is_positive() {
            self.pos_lit_no -= 1;
        } else {
            self.neg_lit_no -= 1;
        }
        self.weight -= lit.standard_weight(bank);
        lit
    }

    /// Toggle the sign of the literal at `index`, maintaining counters.
    pub fn flip_literal_sign(&mut self, index: usize) {
        let lit = &mut self.literals[index];
        if lit.is_positive() {
            self.pos_lit_no -= 1;
            self.neg_lit_no += 1;
        } else {
            self.neg_lit_no -= 1;
            self.pos_lit_no += 1;
        }
        lit.flip_sign();
    }

    /// Remove resolved (`t ≠ t`) and duplicate literals. Returns the
    /// number removed and clears [INITIAL](ClauseProps::INITIAL) when
    /// anything was removed.
    pub fn remove_superfluous_literals(&mut self, bank: &TermBank) -> usize {
        let before = self.literals.len();

        self.literals
            .retain(|lit| !(lit.is_negative() && lit.is_trivial()));

        let mut kept: Vec<Eqn> = Vec::with_capacity(self.literals.len());
        for lit in self.literals.drain(..) {
            if !kept.iter().any(|k| k.structurally_equal(&lit)) {
                kept.push(lit);
            }
        }
        self.literals = kept;

        let removed = before - self.literals.len();
        if removed > 0 {
            self.pos_lit_no = self.literals.iter().filter(|l| l.is_positive()).count();
            self.neg_lit_no = self.literals.len() - self.pos_lit_no;
            self.recompute_weight(bank);
            self.props.clear(ClauseProps::INITIAL);
        }
        removed
    }

    /// Canonize the clause: orient each literal by the structural term
    /// order and sort the literals by the canonical literal order.
    pub fn canonize(&mut self, bank: &TermBank) {
        for lit in &mut self.literals {
            lit.canonize(bank);
        }
        self.literals.sort_by(|a, b| a.canon_compare(bank, b));
    }

    /// True if the clause can be simplified by a top-level
    /// simplify-reflect step with the unit clause `simplifier`: some
    /// literal of opposite sign is subsumed by the (possibly flipped)
    /// unit.
    ///
    /// # Panics
    /// If `simplifier` is not a unit clause.
    pub fn unit_simplify_test(
        &self,
        bank: &mut TermBank,
        subst: &mut crate::structures::subst::Subst,
        simplifier: &Clause,
    ) -> bool {
        assert!(simplifier.is_unit());
        let simpl = simplifier.literals[0];
        debug_assert!(simpl.is_negative() || !simpl.is_oriented());

        let positive = simpl.is_positive();
        if positive == self.is_positive() {
            return false;
        }
        self.literals
            .iter()
            .filter(|lit| positive != lit.is_positive())
            .any(|lit| simpl.subsumes(bank, subst, lit))
    }

    /// The canonical clause order: standard weight, then literal count,
    /// then lexicographic canonical literal comparison.
    pub fn struct_weight_compare(&self, bank: &TermBank, other: &Clause) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| self.literals.len().cmp(&other.literals.len()))
            .then_with(|| {
                for (a, b) in self.literals.iter().zip(other.literals.iter()) {
                    match a.canon_compare(bank, b) {
                        Ordering::Equal => continue,
                        unequal => return unequal,
                    }
                }
                Ordering::Equal
            })
    }

    /// Clear the scratch [USED](EqnProps::USED) bit on every literal.
    pub fn clear_used_bits(&mut self) {
        for lit in &mut self.literals {
            lit.props.clear(EqnProps::USED);
        }
    }
}
