/*!
First-order formulas.

Formulas are owned trees over equational literals: negation, the binary
connectives (including the negated forms, which the simplifier rewrites
away), and the two quantifiers, each binding one variable cell of the term
bank. The CNF passes consume a formula and return the transformed one ---
the ownership-flavoured rendering of the destructive updates the pipeline
performs.

A [WFormula] wraps a formula with an ident, an input role, and property
bits; formula sets hold wrapped formulas.
*/

use crate::{
    db::term_bank::TermBank,
    structures::{eqn::Eqn, term::TermRef, Role},
};

/// Binary connectives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOp {
    /// Disjunction.
    Or,
    /// Conjunction.
    And,
    /// Implication.
    Impl,
    /// Equivalence.
    Equiv,
    /// Exclusive or.
    Xor,
    /// Negated disjunction.
    Nor,
    /// Negated conjunction.
    Nand,
    /// Reverse implication, negated.
    NImpl,
}

/// Quantifiers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quantifier {
    /// Universal.
    All,
    /// Existential.
    Ex,
}

/// A first-order formula.
#[derive(Clone, Debug)]
pub enum Formula {
    /// A literal leaf.
    Lit(Eqn),
    /// Negation.
    Not(Box<Formula>),
    /// A binary connective.
    Bin(BinOp, Box<Formula>, Box<Formula>),
    /// A quantifier binding one variable.
    Quant(Quantifier, TermRef, Box<Formula>),
}

impl Formula {
    /// Negation of `f`.
    pub fn not(f: Formula) -> Formula {
        Formula::Not(Box::new(f))
    }

    /// `op(lhs, rhs)`.
    pub fn bin(op: BinOp, lhs: Formula, rhs: Formula) -> Formula {
        Formula::Bin(op, Box::new(lhs), Box::new(rhs))
    }

    /// `q var. body`.
    pub fn quant(q: Quantifier, var: TermRef, body: Formula) -> Formula {
        Formula::Quant(q, var, Box::new(body))
    }

    /// The propositional constant `⊤` or `⊥`.
    pub fn prop_const(bank: &TermBank, positive: bool) -> Formula {
        Formula::Lit(Eqn::new(
            bank,
            bank.true_term(),
            bank.true_term(),
            positive,
        ))
    }

    /// True for a literal leaf.
    pub fn is_literal(&self) -> bool {
        matches!(self, Formula::Lit(_))
    }

    /// True for `⊤` (positive) or `⊥` (negative).
    pub fn is_prop_const(&self, bank: &TermBank, positive: bool) -> bool {
        match self {
            Formula::Lit(eqn) => {
                eqn.lterm == bank.true_term()
                    && eqn.rterm == bank.true_term()
                    && eqn.is_positive() == positive
            }
            _ => false,
        }
    }

    /// True for `⊤`.
    pub fn is_prop_true(&self, bank: &TermBank) -> bool {
        self.is_prop_const(bank, true)
    }

    /// True for `⊥`.
    pub fn is_prop_false(&self, bank: &TermBank) -> bool {
        self.is_prop_const(bank, false)
    }

    /// True for a quantified formula.
    pub fn is_quantified(&self) -> bool {
        matches!(self, Formula::Quant(..))
    }

    /// Structural equality over shared literals.
    pub fn equal(&self, other: &Formula) -> bool {
        match (self, other) {
            (Formula::Lit(a), Formula::Lit(b)) => a.structurally_equal(b),
            (Formula::Not(a), Formula::Not(b)) => a.equal(b),
            (Formula::Bin(op_a, a1, a2), Formula::Bin(op_b, b1, b2)) => {
                op_a == op_b && a1.equal(b1) && a2.equal(b2)
            }
            (Formula::Quant(qa, va, a), Formula::Quant(qb, vb, b)) => {
                qa == qb && va == vb && a.equal(b)
            }
            _ => false,
        }
    }

    /// True if `var` occurs free in the formula.
    pub fn var_is_free(&self, bank: &TermBank, var: TermRef) -> bool {
        match self {
            Formula::Lit(eqn) => {
                bank.var_occurs(eqn.lterm, var, crate::structures::term::DerefKind::Never)
                    || bank.var_occurs(eqn.rterm, var, crate::structures::term::DerefKind::Never)
            }
            Formula::Not(sub) => sub.var_is_free(bank, var),
            Formula::Bin(_, lhs, rhs) => {
                lhs.var_is_free(bank, var) || rhs.var_is_free(bank, var)
            }
            Formula::Quant(_, bound, sub) => *bound != var && sub.var_is_free(bank, var),
        }
    }

    /// Collect the free variables of the formula in occurrence order.
    pub fn collect_free_vars(&self, bank: &TermBank, acc: &mut Vec<TermRef>) {
        fn walk(f: &Formula, bank: &TermBank, bound: &mut Vec<TermRef>, acc: &mut Vec<TermRef>) {
            match f {
                Formula::Lit(eqn) => {
                    let mut vars = Vec::new();
                    bank.collect_vars(eqn.lterm, &mut vars);
                    bank.collect_vars(eqn.rterm, &mut vars);
                    for var in vars {
                        if !bound.contains(&var) && !acc.contains(&var) {
                            acc.push(var);
                        }
                    }
                }
                Formula::Not(sub) => walk(sub, bank, bound, acc),
                Formula::Bin(_, lhs, rhs) => {
                    walk(lhs, bank, bound, acc);
                    walk(rhs, bank, bound, acc);
                }
                Formula::Quant(_, var, sub) => {
                    bound.push(*var);
                    walk(sub, bank, bound, acc);
                    bound.pop();
                }
            }
        }
        walk(self, bank, &mut Vec::new(), acc);
    }

    /// Push every term reference held by the formula onto `acc` (literal
    /// sides and bound variables). Used for GC rooting.
    pub fn collect_terms(&self, acc: &mut Vec<TermRef>) {
        match self {
            Formula::Lit(eqn) => {
                acc.push(eqn.lterm);
                acc.push(eqn.rterm);
            }
            Formula::Not(sub) => sub.collect_terms(acc),
            Formula::Bin(_, lhs, rhs) => {
                lhs.collect_terms(acc);
                rhs.collect_terms(acc);
            }
            Formula::Quant(_, var, sub) => {
                acc.push(*var);
                sub.collect_terms(acc);
            }
        }
    }

    /// The most negative variable code occurring in the formula, or 0.
    pub fn min_var_code(&self, bank: &TermBank) -> i64 {
        match self {
            Formula::Lit(eqn) => bank
                .min_var_code(eqn.lterm)
                .min(bank.min_var_code(eqn.rterm)),
            Formula::Not(sub) => sub.min_var_code(bank),
            Formula::Bin(_, lhs, rhs) => lhs.min_var_code(bank).min(rhs.min_var_code(bank)),
            Formula::Quant(_, var, sub) => bank
                .cell(*var)
                .f_code
                .min(sub.min_var_code(bank)),
        }
    }
}

/// Property bits of a wrapped formula.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FormulaProps(u16);

impl FormulaProps {
    /// The formula came from the input problem.
    pub const INPUT: FormulaProps = FormulaProps(1 << 0);

    /// The formula is unchanged since input.
    pub const INITIAL: FormulaProps = FormulaProps(1 << 1);

    /// True if every bit of `prop` is set.
    pub fn has(self, prop: FormulaProps) -> bool {
        self.0 & prop.0 == prop.0
    }

    /// Set every bit of `prop`.
    pub fn set(&mut self, prop: FormulaProps) {
        self.0 |= prop.0;
    }
}

/// A formula with identity, role, and properties.
#[derive(Clone, Debug)]
pub struct WFormula {
    /// Numeric identity, unique per context.
    pub ident: u64,
    /// The input role.
    pub role: Role,
    /// Property bits.
    pub props: FormulaProps,
    /// The formula itself.
    pub formula: Formula,
}

impl WFormula {
    /// Wrap `formula` with the given ident and role.
    pub fn new(ident: u64, role: Role, formula: Formula) -> Self {
        let mut props = FormulaProps::default();
        props.set(FormulaProps::INPUT);
        props.set(FormulaProps::INITIAL);
        WFormula {
            ident,
            role,
            props,
            formula,
        }
    }
}
