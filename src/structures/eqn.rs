/*!
Equational literals.

A literal is an ordered pair of shared terms with a sign. Non-equational
atoms are encoded as equations against `$true`: the literal `p(a)` is
`p(a) = $true`, and `¬p(a)` is `p(a) ≠ $true`. An equational literal never
has `$true` as its right-hand side.

Orientation is a statement about an ordering: once a literal is marked
oriented, `lterm` is strictly greater than `rterm` under the ordering that
oriented it, and rewriting may use the literal left to right without
re-comparing instances.
*/

use std::cmp::Ordering;

use crate::{
    db::term_bank::TermBank,
    structures::{
        subst::{subst_compute_match, Subst},
        term::TermRef,
    },
};

/// Which side of an equation a position refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EqnSide {
    /// The left-hand side.
    Left,
    /// The right-hand side.
    Right,
}

/// Property bits of a literal.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EqnProps(u16);

impl EqnProps {
    /// The literal is positive.
    pub const POSITIVE: EqnProps = EqnProps(1 << 0);

    /// The literal is a proper equation (right-hand side is not `$true`).
    pub const EQU_LIT: EqnProps = EqnProps(1 << 1);

    /// `lterm > rterm` under the active ordering.
    pub const ORIENTED: EqnProps = EqnProps(1 << 2);

    /// The literal is maximal in its clause.
    pub const MAXIMAL: EqnProps = EqnProps(1 << 3);

    /// Maximality information is current.
    pub const MAX_UP_TO_DATE: EqnProps = EqnProps(1 << 4);

    /// The literal has been selected by a selection function.
    pub const SELECTED: EqnProps = EqnProps(1 << 5);

    /// Scratch bit for duplicate suppression.
    pub const USED: EqnProps = EqnProps(1 << 6);

    /// True if every bit of `prop` is set.
    pub fn has(self, prop: EqnProps) -> bool {
        self.0 & prop.0 == prop.0
    }

    /// Set every bit of `prop`.
    pub fn set(&mut self, prop: EqnProps) {
        self.0 |= prop.0;
    }

    /// Clear every bit of `prop`.
    pub fn clear(&mut self, prop: EqnProps) {
        self.0 &= !prop.0;
    }

    /// Toggle every bit of `prop`.
    pub fn flip(&mut self, prop: EqnProps) {
        self.0 ^= prop.0;
    }
}

/// An equational literal over shared terms.
#[derive(Clone, Copy, Debug)]
pub struct Eqn {
    /// Left-hand side.
    pub lterm: TermRef,
    /// Right-hand side; `$true` for non-equational atoms.
    pub rterm: TermRef,
    /// Property bits.
    pub props: EqnProps,
}

impl Eqn {
    /// A literal `lterm = rterm` (or the negation). The equational bit is
    /// derived from the right-hand side.
    pub fn new(bank: &TermBank, lterm: TermRef, rterm: TermRef, positive: bool) -> Self {
        let mut props = EqnProps::default();
        if positive {
            props.set(EqnProps::POSITIVE);
        }
        if rterm != bank.true_term() {
            props.set(EqnProps::EQU_LIT);
        }
        Eqn {
            lterm,
            rterm,
            props,
        }
    }

    /// True if the literal is positive.
    pub fn is_positive(&self) -> bool {
        self.props.has(EqnProps::POSITIVE)
    }

    /// True if the literal is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_positive()
    }

    /// True if the literal is a proper equation.
    pub fn is_equational(&self) -> bool {
        self.props.has(EqnProps::EQU_LIT)
    }

    /// True if `lterm > rterm` under the ordering that oriented the
    /// literal.
    pub fn is_oriented(&self) -> bool {
        self.props.has(EqnProps::ORIENTED)
    }

    /// True if the literal is maximal in its clause.
    pub fn is_maximal(&self) -> bool {
        self.props.has(EqnProps::MAXIMAL)
    }

    /// True if the literal is selected.
    pub fn is_selected(&self) -> bool {
        self.props.has(EqnProps::SELECTED)
    }

    /// Negate the literal in place.
    pub fn flip_sign(&mut self) {
        self.props.flip(EqnProps::POSITIVE);
    }

    /// The negation of the literal.
    pub fn negated(&self) -> Eqn {
        let mut eqn = *self;
        eqn.flip_sign();
        eqn
    }

    /// Standard weight: the sum of both sides' standard weights.
    pub fn standard_weight(&self, bank: &TermBank) -> u64 {
        bank.weight(self.lterm) + bank.weight(self.rterm)
    }

    /// True for `t = t` and `t ≠ t`.
    pub fn is_trivial(&self) -> bool {
        self.lterm == self.rterm
    }

    /// Structural equality: same sign, identical shared sides.
    pub fn structurally_equal(&self, other: &Eqn) -> bool {
        self.is_positive() == other.is_positive()
            && self.lterm == other.lterm
            && self.rterm == other.rterm
    }

    /// Swap the sides of the literal. Clears orientation.
    pub fn swap_sides(&mut self) {
        std::mem::swap(&mut self.lterm, &mut self.rterm);
        self.props.clear(EqnProps::ORIENTED);
    }

    /// Put the structurally greater side on the left. Only proper
    /// equations are reordered; an atom stays on the left of its `$true`.
    pub fn canonize(&mut self, bank: &TermBank) {
        if self.is_equational()
            && bank.structural_cmp(self.lterm, self.rterm) == Ordering::Less
        {
            self.swap_sides();
        }
    }

    /// The canonical literal order: negative before positive, then the
    /// structural term order on left sides, then on right sides.
    pub fn canon_compare(&self, bank: &TermBank, other: &Eqn) -> Ordering {
        self.is_positive()
            .cmp(&other.is_positive())
            .then_with(|| bank.structural_cmp(self.lterm, other.lterm))
            .then_with(|| bank.structural_cmp(self.rterm, other.rterm))
    }

    /// Orient the literal under `ocb`: afterwards, if the sides are
    /// comparable, `lterm` is the strictly greater one and the oriented
    /// bit is set. Returns whether the literal is now oriented.
    pub fn orient(&mut self, ocb: &mut crate::ordering::ocb::Ocb, bank: &TermBank) -> bool {
        use crate::{ordering::CompareResult, structures::term::DerefKind};
        match ocb.compare(bank, self.lterm, self.rterm, DerefKind::Never, DerefKind::Never) {
            CompareResult::Greater => {
                self.props.set(EqnProps::ORIENTED);
                true
            }
            CompareResult::Less => {
                self.swap_sides();
                self.props.set(EqnProps::ORIENTED);
                true
            }
            _ => {
                self.props.clear(EqnProps::ORIENTED);
                false
            }
        }
    }

    /// True if some instance of `self` is `other` (matching both sides
    /// under one substitution, in either side order). The substitution is
    /// restored before returning.
    pub fn subsumes(&self, bank: &mut TermBank, subst: &mut Subst, other: &Eqn) -> bool {
        let snapshot = subst.snapshot();
        if subst_compute_match(bank, self.lterm, other.lterm, subst)
            && subst_compute_match(bank, self.rterm, other.rterm, subst)
        {
            subst.backtrack_to(bank, snapshot);
            return true;
        }
        subst.backtrack_to(bank, snapshot);
        if subst_compute_match(bank, self.lterm, other.rterm, subst)
            && subst_compute_match(bank, self.rterm, other.lterm, subst)
        {
            subst.backtrack_to(bank, snapshot);
            return true;
        }
        subst.backtrack_to(bank, snapshot);
        false
    }
}
