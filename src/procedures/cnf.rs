/*!
The formula-to-CNF pipeline.

A fixed sequence of passes, each total on well-formed input and
equivalence-preserving under the universal closure:

1. [simplify](formula_simplify) --- the propositional rewrite catalogue;
   also eliminates the exotic connectives (xor, nand, nor, reverse
   implication).
2. [NNF](formula_nnf) --- negation pushed to the literals, equivalences
   expanded by polarity.
3. [miniscoping](formula_miniscope) --- quantifiers moved inward.
4. [variable renaming](formula_var_rename) --- every bound variable
   replaced by a fresh one, so later passes may treat equal subterms as
   context-free.
5. [outer Skolemization](formula_skolemize_outermost) --- existentials
   replaced by Skolem terms over the enclosing universal context.
6. [quantifier shifting](formula_shift_quantors) --- the remaining
   universals lifted out of conjunctions and disjunctions.
7. [distribution](formula_distribute_disjunctions) --- `∨` over `∧` until
   the matrix is conjunctive.
8. [clause extraction](formula_to_cnf) --- the top-level conjunction split
   into clauses, literals deduplicated, variables renumbered densely.

A malformed formula (an operator that cannot occur at its position after
the preceding passes) is a programming error and panics.
*/

use rustc_hash::FxHashMap;

use crate::{
    context::Counters,
    db::{
        clause_set::ClauseSet, formula_set::FormulaSet, signature::Signature,
        term_bank::TermBank,
    },
    misc::log::targets,
    structures::{
        clause::{Clause, ClauseProps},
        eqn::Eqn,
        formula::{BinOp, Formula, Quantifier, WFormula},
        term::TermRef,
        Role,
    },
};

/// Maximally simplify a formula by the propositional catalogue. Returns
/// the simplified formula and whether anything changed.
pub fn formula_simplify(bank: &TermBank, f: Formula) -> (Formula, bool) {
    let mut modified = false;

    // Subformulas first.
    let f = match f {
        Formula::Lit(eqn) => Formula::Lit(eqn),
        Formula::Not(sub) => {
            let (sub, m) = formula_simplify(bank, *sub);
            modified |= m;
            Formula::not(sub)
        }
        Formula::Bin(op, lhs, rhs) => {
            let (lhs, ml) = formula_simplify(bank, *lhs);
            let (rhs, mr) = formula_simplify(bank, *rhs);
            modified |= ml | mr;
            Formula::bin(op, lhs, rhs)
        }
        Formula::Quant(q, var, sub) => {
            let (sub, m) = formula_simplify(bank, *sub);
            modified |= m;
            Formula::quant(q, var, sub)
        }
    };

    // Then the root.
    match f {
        Formula::Not(sub) => match *sub {
            Formula::Lit(eqn) => (Formula::Lit(eqn.negated()), true),
            other => (Formula::not(other), modified),
        },

        Formula::Bin(BinOp::Or, lhs, rhs) => {
            if lhs.is_prop_false(bank) {
                (*rhs, true)
            } else if rhs.is_prop_false(bank) {
                (*lhs, true)
            } else if lhs.is_prop_true(bank) || rhs.is_prop_true(bank) {
                (Formula::prop_const(bank, true), true)
            } else if lhs.equal(&rhs) {
                (*lhs, true)
            } else {
                (Formula::Bin(BinOp::Or, lhs, rhs), modified)
            }
        }

        Formula::Bin(BinOp::And, lhs, rhs) => {
            if lhs.is_prop_true(bank) {
                (*rhs, true)
            } else if rhs.is_prop_true(bank) {
                (*lhs, true)
            } else if lhs.is_prop_false(bank) || rhs.is_prop_false(bank) {
                (Formula::prop_const(bank, false), true)
            } else if lhs.equal(&rhs) {
                (*lhs, true)
            } else {
                (Formula::Bin(BinOp::And, lhs, rhs), modified)
            }
        }

        Formula::Bin(BinOp::Equiv, lhs, rhs) => {
            if lhs.is_prop_true(bank) {
                (*rhs, true)
            } else if rhs.is_prop_true(bank) {
                (*lhs, true)
            } else if lhs.is_prop_false(bank) {
                let (neg, _) = formula_simplify(bank, Formula::not(*rhs));
                (neg, true)
            } else if rhs.is_prop_false(bank) {
                let (neg, _) = formula_simplify(bank, Formula::not(*lhs));
                (neg, true)
            } else if lhs.equal(&rhs) {
                (Formula::prop_const(bank, true), true)
            } else {
                (Formula::Bin(BinOp::Equiv, lhs, rhs), modified)
            }
        }

        Formula::Bin(BinOp::Impl, lhs, rhs) => {
            if lhs.is_prop_true(bank) {
                (*rhs, true)
            } else if lhs.is_prop_false(bank) {
                (Formula::prop_const(bank, true), true)
            } else if rhs.is_prop_false(bank) {
                let (neg, _) = formula_simplify(bank, Formula::not(*lhs));
                (neg, true)
            } else if rhs.is_prop_true(bank) {
                (Formula::prop_const(bank, true), true)
            } else if lhs.equal(&rhs) {
                (Formula::prop_const(bank, true), true)
            } else {
                (Formula::Bin(BinOp::Impl, lhs, rhs), modified)
            }
        }

        Formula::Bin(BinOp::Xor, lhs, rhs) => {
            let rewritten = Formula::not(Formula::Bin(BinOp::Equiv, lhs, rhs));
            let (simplified, _) = formula_simplify(bank, rewritten);
            (simplified, true)
        }

        Formula::Bin(BinOp::Nor, lhs, rhs) => {
            let rewritten = Formula::not(Formula::Bin(BinOp::Or, lhs, rhs));
            let (simplified, _) = formula_simplify(bank, rewritten);
            (simplified, true)
        }

        Formula::Bin(BinOp::Nand, lhs, rhs) => {
            let rewritten = Formula::not(Formula::Bin(BinOp::And, lhs, rhs));
            let (simplified, _) = formula_simplify(bank, rewritten);
            (simplified, true)
        }

        Formula::Bin(BinOp::NImpl, lhs, rhs) => {
            let rewritten = Formula::not(Formula::Bin(BinOp::Impl, rhs, lhs));
            let (simplified, _) = formula_simplify(bank, rewritten);
            (simplified, true)
        }

        Formula::Quant(q, var, sub) => {
            if !sub.var_is_free(bank, var) {
                (*sub, true)
            } else {
                (Formula::Quant(q, var, sub), modified)
            }
        }

        literal => (literal, modified),
    }
}

/// Apply the NNF transformations possible at the root, repeatedly.
fn root_nnf(mut f: Formula, polarity: i32) -> (Formula, bool) {
    let mut modified = false;
    loop {
        match f {
            Formula::Not(sub) => match *sub {
                Formula::Lit(eqn) => {
                    f = Formula::Lit(eqn.negated());
                    modified = true;
                }
                Formula::Not(inner) => {
                    f = *inner;
                    modified = true;
                }
                Formula::Bin(BinOp::Or, lhs, rhs) => {
                    f = Formula::bin(BinOp::And, Formula::not(*lhs), Formula::not(*rhs));
                    modified = true;
                }
                Formula::Bin(BinOp::And, lhs, rhs) => {
                    f = Formula::bin(BinOp::Or, Formula::not(*lhs), Formula::not(*rhs));
                    modified = true;
                }
                Formula::Quant(Quantifier::All, var, sub) => {
                    f = Formula::quant(Quantifier::Ex, var, Formula::not(*sub));
                    modified = true;
                }
                Formula::Quant(Quantifier::Ex, var, sub) => {
                    f = Formula::quant(Quantifier::All, var, Formula::not(*sub));
                    modified = true;
                }
                other => {
                    return (Formula::not(other), modified);
                }
            },

            Formula::Bin(BinOp::Impl, lhs, rhs) => {
                f = Formula::bin(BinOp::Or, Formula::not(*lhs), *rhs);
                modified = true;
            }

            Formula::Bin(BinOp::Equiv, lhs, rhs) => {
                debug_assert!(polarity == 1 || polarity == -1);
                f = if polarity == 1 {
                    Formula::bin(
                        BinOp::And,
                        Formula::bin(BinOp::Impl, (*lhs).clone(), (*rhs).clone()),
                        Formula::bin(BinOp::Impl, *rhs, *lhs),
                    )
                } else {
                    Formula::bin(
                        BinOp::Or,
                        Formula::bin(BinOp::And, (*lhs).clone(), (*rhs).clone()),
                        Formula::bin(BinOp::And, Formula::not(*lhs), Formula::not(*rhs)),
                    )
                };
                modified = true;
            }

            other => return (other, modified),
        }
    }
}

/// Transform a simplified formula into negation normal form. The polarity
/// of the whole formula is 1; it flips under negation and drives the
/// equivalence expansion.
pub fn formula_nnf(f: Formula, polarity: i32) -> (Formula, bool) {
    let mut modified = false;
    let mut f = f;
    let mut normalform = false;

    while !normalform {
        normalform = true;
        let (rooted, m) = root_nnf(f, polarity);
        modified |= m;

        f = match rooted {
            Formula::Lit(eqn) => Formula::Lit(eqn),
            Formula::Not(sub) => {
                let (sub, m) = formula_nnf(*sub, -polarity);
                modified |= m;
                normalform &= !m;
                Formula::not(sub)
            }
            Formula::Quant(q, var, sub) => {
                let (sub, m) = formula_nnf(*sub, polarity);
                modified |= m;
                normalform &= !m;
                Formula::quant(q, var, sub)
            }
            Formula::Bin(op @ (BinOp::And | BinOp::Or), lhs, rhs) => {
                let (lhs, ml) = formula_nnf(*lhs, polarity);
                let (rhs, mr) = formula_nnf(*rhs, polarity);
                modified |= ml | mr;
                normalform &= !(ml | mr);
                Formula::bin(op, lhs, rhs)
            }
            _ => panic!("formula not simplified before NNF"),
        };
    }
    (f, modified)
}

/// Move quantifiers inward: past a binary operand the bound variable does
/// not occur in, and distributing `∀` over `∧` and `∃` over `∨`. Runs to
/// a fixpoint.
pub fn formula_miniscope(bank: &TermBank, f: Formula) -> (Formula, bool) {
    let mut modified = false;

    let f = match f {
        Formula::Quant(q, var, sub) => match *sub {
            Formula::Bin(op @ (BinOp::And | BinOp::Or), lhs, rhs) => {
                if !lhs.var_is_free(bank, var) {
                    modified = true;
                    Formula::bin(op, *lhs, Formula::quant(q, var, *rhs))
                } else if !rhs.var_is_free(bank, var) {
                    modified = true;
                    Formula::bin(op, Formula::quant(q, var, *lhs), *rhs)
                } else if op == BinOp::And && q == Quantifier::All {
                    modified = true;
                    Formula::bin(
                        BinOp::And,
                        Formula::quant(Quantifier::All, var, *lhs),
                        Formula::quant(Quantifier::All, var, *rhs),
                    )
                } else if op == BinOp::Or && q == Quantifier::Ex {
                    modified = true;
                    Formula::bin(
                        BinOp::Or,
                        Formula::quant(Quantifier::Ex, var, *lhs),
                        Formula::quant(Quantifier::Ex, var, *rhs),
                    )
                } else {
                    Formula::quant(q, var, Formula::bin(op, *lhs, *rhs))
                }
            }
            other => Formula::quant(q, var, other),
        },
        other => other,
    };

    // Recurse into the (possibly reshaped) subformulas.
    let f = match f {
        Formula::Lit(eqn) => Formula::Lit(eqn),
        Formula::Not(sub) => {
            let (sub, m) = formula_miniscope(bank, *sub);
            modified |= m;
            Formula::not(sub)
        }
        Formula::Bin(op, lhs, rhs) => {
            let (lhs, ml) = formula_miniscope(bank, *lhs);
            let (rhs, mr) = formula_miniscope(bank, *rhs);
            modified |= ml | mr;
            Formula::bin(op, lhs, rhs)
        }
        Formula::Quant(q, var, sub) => {
            let (sub, m) = formula_miniscope(bank, *sub);
            modified |= m;
            Formula::quant(q, var, sub)
        }
    };

    if modified {
        let (f, _) = formula_miniscope(bank, f);
        (f, true)
    } else {
        (f, false)
    }
}

/// Replace every bound variable by a freshly issued one.
///
/// Precondition: the variable bank's counter is above the largest
/// variable code in `f` (see [VarBank::set_v_count](crate::db::var_bank::VarBank::set_v_count)).
pub fn formula_var_rename(sig: &Signature, bank: &mut TermBank, f: Formula) -> Formula {
    match f {
        Formula::Lit(eqn) => {
            let lterm = bank.insert_instantiated(sig, eqn.lterm);
            let rterm = bank.insert_instantiated(sig, eqn.rterm);
            Formula::Lit(Eqn {
                lterm,
                rterm,
                props: eqn.props,
            })
        }
        Formula::Not(sub) => Formula::not(formula_var_rename(sig, bank, *sub)),
        Formula::Bin(op, lhs, rhs) => {
            let lhs = formula_var_rename(sig, bank, *lhs);
            let rhs = formula_var_rename(sig, bank, *rhs);
            Formula::bin(op, lhs, rhs)
        }
        Formula::Quant(q, var, sub) => {
            let outer = bank.cell(var).binding;
            let fresh = bank.fresh_var();
            debug_assert_ne!(fresh, var);
            bank.cell_mut(var).binding = Some(fresh);
            let sub = formula_var_rename(sig, bank, *sub);
            bank.cell_mut(var).binding = outer;
            Formula::quant(q, fresh, sub)
        }
    }
}

/// Skolemize outermost: each existential becomes a Skolem term over the
/// current universal context. The formula is read as its universal
/// closure --- globally free variables join the context. Assumes every
/// quantifier binds a distinct variable (established by
/// [formula_var_rename]).
pub fn formula_skolemize_outermost(
    sig: &mut Signature,
    bank: &mut TermBank,
    f: Formula,
) -> (Formula, bool) {
    let mut context = Vec::new();
    f.collect_free_vars(bank, &mut context);
    let mut modified = false;
    let f = rek_skolemize(sig, bank, f, &mut context, &mut modified);
    (f, modified)
}

fn rek_skolemize(
    sig: &mut Signature,
    bank: &mut TermBank,
    f: Formula,
    context: &mut Vec<TermRef>,
    modified: &mut bool,
) -> Formula {
    match f {
        Formula::Lit(eqn) => {
            let lterm = bank.insert_instantiated(sig, eqn.lterm);
            let rterm = bank.insert_instantiated(sig, eqn.rterm);
            Formula::Lit(Eqn {
                lterm,
                rterm,
                props: eqn.props,
            })
        }
        Formula::Quant(Quantifier::Ex, var, sub) => {
            debug_assert!(bank.cell(var).binding.is_none());
            let sort = bank.cell(var).sort;
            let sk_code = sig.fresh_skolem(context.len(), sort);
            let sk_term = bank.insert(sig, sk_code, context);
            bank.cell_mut(var).binding = Some(sk_term);
            let sub = rek_skolemize(sig, bank, *sub, context, modified);
            bank.cell_mut(var).binding = None;
            *modified = true;
            sub
        }
        Formula::Quant(Quantifier::All, var, sub) => {
            context.push(var);
            let sub = rek_skolemize(sig, bank, *sub, context, modified);
            context.pop();
            Formula::quant(Quantifier::All, var, sub)
        }
        Formula::Not(sub) => Formula::not(rek_skolemize(sig, bank, *sub, context, modified)),
        Formula::Bin(op, lhs, rhs) => {
            let lhs = rek_skolemize(sig, bank, *lhs, context, modified);
            let rhs = rek_skolemize(sig, bank, *rhs, context, modified);
            Formula::bin(op, lhs, rhs)
        }
    }
}

/// Lift the remaining universal quantifiers out of conjunctions and
/// disjunctions. Sound because the preceding rename pass made bound
/// variables unique.
pub fn formula_shift_quantors(bank: &TermBank, f: Formula) -> Formula {
    let f = match f {
        Formula::Bin(op, lhs, rhs) => {
            let lhs = formula_shift_quantors(bank, *lhs);
            let rhs = formula_shift_quantors(bank, *rhs);
            Formula::bin(op, lhs, rhs)
        }
        Formula::Quant(q, var, sub) => Formula::quant(q, var, formula_shift_quantors(bank, *sub)),
        other => other,
    };

    match f {
        Formula::Bin(op @ (BinOp::And | BinOp::Or), lhs, rhs) => match (*lhs, *rhs) {
            (Formula::Quant(Quantifier::All, var, body), rhs) => {
                debug_assert!(!rhs.var_is_free(bank, var));
                formula_shift_quantors(
                    bank,
                    Formula::quant(Quantifier::All, var, Formula::bin(op, *body, rhs)),
                )
            }
            (lhs, Formula::Quant(Quantifier::All, var, body)) => {
                debug_assert!(!lhs.var_is_free(bank, var));
                formula_shift_quantors(
                    bank,
                    Formula::quant(Quantifier::All, var, Formula::bin(op, lhs, *body)),
                )
            }
            (lhs, rhs) => Formula::bin(op, lhs, rhs),
        },
        f @ (Formula::Quant(Quantifier::All, ..) | Formula::Lit(_)) => f,
        _ => panic!("formula not in skolemized NNF when shifting quantifiers"),
    }
}

/// Distribute `∨` over `∧` until the matrix is a conjunction of
/// disjunctions of literals.
pub fn formula_distribute_disjunctions(f: Formula, modified: &mut bool) -> Formula {
    let f = match f {
        Formula::Bin(op, lhs, rhs) => {
            let lhs = formula_distribute_disjunctions(*lhs, modified);
            let rhs = formula_distribute_disjunctions(*rhs, modified);
            Formula::bin(op, lhs, rhs)
        }
        Formula::Quant(q, var, sub) => {
            Formula::quant(q, var, formula_distribute_disjunctions(*sub, modified))
        }
        other => other,
    };

    match f {
        Formula::Bin(BinOp::Or, lhs, rhs) => match (*lhs, *rhs) {
            (Formula::Bin(BinOp::And, a, b), rhs) => {
                *modified = true;
                let first = Formula::bin(BinOp::Or, *a, rhs.clone());
                let second = Formula::bin(BinOp::Or, *b, rhs);
                formula_distribute_disjunctions(Formula::bin(BinOp::And, first, second), modified)
            }
            (lhs, Formula::Bin(BinOp::And, a, b)) => {
                *modified = true;
                let first = Formula::bin(BinOp::Or, *a, lhs.clone());
                let second = Formula::bin(BinOp::Or, *b, lhs);
                formula_distribute_disjunctions(Formula::bin(BinOp::And, first, second), modified)
            }
            (lhs, rhs) => Formula::bin(BinOp::Or, lhs, rhs),
        },
        f @ (Formula::Quant(Quantifier::All, ..) | Formula::Bin(BinOp::And, ..) | Formula::Lit(_)) => {
            f
        }
        _ => panic!("formula not distributable"),
    }
}

/// Rebuild `term` with variables renamed according to `map`.
fn rename_term(
    sig: &Signature,
    bank: &mut TermBank,
    term: TermRef,
    map: &FxHashMap<TermRef, TermRef>,
) -> TermRef {
    let cell = bank.cell(term);
    if cell.is_var() {
        return map.get(&term).copied().unwrap_or(term);
    }
    if cell.args.is_empty() {
        return term;
    }
    let f_code = cell.f_code;
    let args = cell.args.clone();
    let renamed: Vec<TermRef> = args
        .iter()
        .map(|&arg| rename_term(sig, bank, arg, map))
        .collect();
    if renamed == args {
        term
    } else {
        bank.insert(sig, f_code, &renamed)
    }
}

/// Turn a disjunction of literals into a clause: collect the literals,
/// drop duplicates, and renumber the variables densely from `-1`.
fn formula_collect_clause(
    sig: &Signature,
    bank: &mut TermBank,
    counters: &mut Counters,
    f: &Formula,
    role: Role,
) -> Clause {
    let mut literals: Vec<Eqn> = Vec::new();
    let mut stack = vec![f];
    while let Some(f) = stack.pop() {
        match f {
            Formula::Lit(eqn) => {
                if !literals.iter().any(|known| known.structurally_equal(eqn)) {
                    literals.push(*eqn);
                }
            }
            Formula::Bin(BinOp::Or, lhs, rhs) => {
                stack.push(rhs.as_ref());
                stack.push(lhs.as_ref());
            }
            _ => panic!("formula does not describe a clause"),
        }
    }

    // Dense variable numbering, in order of first occurrence.
    let mut vars = Vec::new();
    for lit in &literals {
        bank.collect_vars(lit.lterm, &mut vars);
        bank.collect_vars(lit.rterm, &mut vars);
    }
    let mut map = FxHashMap::default();
    for (at, &var) in vars.iter().enumerate() {
        let fresh = bank.variable(-(at as i64 + 1));
        if fresh != var {
            map.insert(var, fresh);
        }
    }
    let literals = literals
        .into_iter()
        .map(|lit| Eqn {
            lterm: rename_term(sig, bank, lit.lterm, &map),
            rterm: rename_term(sig, bank, lit.rterm, &map),
            props: lit.props,
        })
        .collect();

    let ident = counters.next_clause_ident();
    let date = counters.tick_date();
    let mut clause = Clause::new(bank, ident, date, literals, role);
    clause.props.set(ClauseProps::INPUT);
    clause
}

/// Split a formula in conjunctive normal form into clauses inserted into
/// `set`, inheriting `role`. Returns the number of clauses produced.
pub fn formula_to_cnf(
    sig: &Signature,
    bank: &mut TermBank,
    counters: &mut Counters,
    f: &Formula,
    role: Role,
    set: &mut ClauseSet,
) -> usize {
    // Skip the quantifier prefix.
    let mut matrix = f;
    while let Formula::Quant(Quantifier::All, _, sub) = matrix {
        matrix = sub.as_ref();
    }

    let mut produced = 0;
    let mut stack = vec![matrix];
    while let Some(f) = stack.pop() {
        match f {
            Formula::Bin(BinOp::And, lhs, rhs) => {
                stack.push(lhs.as_ref());
                stack.push(rhs.as_ref());
            }
            disjunction => {
                let clause = formula_collect_clause(sig, bank, counters, disjunction, role);
                set.insert(bank, clause);
                produced += 1;
            }
        }
    }
    produced
}

/// Run the full pipeline on a wrapped formula, leaving the transformed
/// formula in place. Returns whether the formula changed before
/// distribution.
pub fn wformula_conjunctive_nf(
    sig: &mut Signature,
    bank: &mut TermBank,
    wform: &mut WFormula,
) -> bool {
    let f = std::mem::replace(&mut wform.formula, Formula::prop_const(bank, true));

    let (f, simplified) = formula_simplify(bank, f);
    let (f, nnfed) = formula_nnf(f, 1);
    let (f, miniscoped) = formula_miniscope(bank, f);

    let max_var = f.min_var_code(bank);
    bank.vars.set_v_count(max_var.unsigned_abs());
    let f = formula_var_rename(sig, bank, f);

    let (f, _) = formula_skolemize_outermost(sig, bank, f);
    let f = formula_shift_quantors(bank, f);
    let mut distributed = false;
    let f = formula_distribute_disjunctions(f, &mut distributed);

    wform.formula = f;
    simplified || nnfed || miniscoped
}

/// Transform one wrapped formula into clauses in `set`.
pub fn wformula_cnf(
    sig: &mut Signature,
    bank: &mut TermBank,
    counters: &mut Counters,
    wform: &mut WFormula,
    set: &mut ClauseSet,
) -> usize {
    wformula_conjunctive_nf(sig, bank, wform);
    let produced = formula_to_cnf(sig, bank, counters, &wform.formula, wform.role, set);
    log::debug!(target: targets::CNF, "Formula {} produced {produced} clauses.", wform.ident);
    produced
}

/// Transform every formula of `fset` into clauses in `cset`. Returns the
/// number of clauses produced.
pub fn formula_set_cnf(
    sig: &mut Signature,
    bank: &mut TermBank,
    counters: &mut Counters,
    fset: &mut FormulaSet,
    cset: &mut ClauseSet,
) -> usize {
    let mut produced = 0;
    for wform in fset.iter_mut() {
        produced += wformula_cnf(sig, bank, counters, wform, cset);
    }
    produced
}
