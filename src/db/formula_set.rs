/*!
Formula sets.

A formula set owns wrapped formulas in insertion order. Its two jobs beyond
storage: negating the conjectures before clausification, and acting as a
garbage-collection root for the terms its literals reference.
*/

use crate::{
    db::term_bank::GcRoots,
    structures::{
        formula::{Formula, WFormula},
        term::TermRef,
        Role,
    },
};

/// An insertion-ordered store of wrapped formulas.
#[derive(Debug, Default)]
pub struct FormulaSet {
    formulas: Vec<WFormula>,
}

impl FormulaSet {
    /// An empty set.
    pub fn new() -> Self {
        FormulaSet::default()
    }

    /// Number of member formulas.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// True if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Append `formula`.
    pub fn insert(&mut self, formula: WFormula) {
        self.formulas.push(formula);
    }

    /// The members in order.
    pub fn iter(&self) -> impl Iterator<Item = &WFormula> {
        self.formulas.iter()
    }

    /// Mutable access to the members in order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut WFormula> {
        self.formulas.iter_mut()
    }

    /// Negate every conjecture in the set, re-labelling it a negated
    /// conjecture. Returns the number of formulas negated.
    pub fn negate_conjectures(&mut self) -> usize {
        let mut negated = 0;
        let formulas = std::mem::take(&mut self.formulas);
        self.formulas = formulas
            .into_iter()
            .map(|mut wform| {
                if wform.role == Role::Conjecture {
                    wform.formula = Formula::not(wform.formula);
                    wform.role = Role::NegatedConjecture;
                    negated += 1;
                }
                wform
            })
            .collect();
        negated
    }

    /// Drain the members, in order.
    pub fn drain(&mut self) -> impl Iterator<Item = WFormula> + '_ {
        self.formulas.drain(..)
    }
}

impl GcRoots for FormulaSet {
    fn collect_root_terms(&self, acc: &mut Vec<TermRef>) {
        for wform in &self.formulas {
            wform.formula.collect_terms(acc);
        }
    }
}
