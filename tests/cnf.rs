use ember_fol::{
    context::ProverContext,
    db::clause_set::ClauseSet,
    db::formula_set::FormulaSet,
    procedures::cnf::{
        formula_miniscope, formula_nnf, formula_set_cnf, formula_simplify, wformula_cnf,
    },
    structures::{
        clause::Clause,
        eqn::Eqn,
        formula::{BinOp, Formula, Quantifier, WFormula},
        term::TermRef,
        Role,
    },
};

/// A positive literal for the atom `pred(args…)`.
fn atom(ctx: &mut ProverContext, pred: &str, args: &[TermRef]) -> Formula {
    let code = ctx.sig.intern_pred(pred, args.len()).unwrap();
    let term = ctx.bank.insert(&ctx.sig, code, args);
    Formula::Lit(Eqn::new(&ctx.bank, term, ctx.bank.true_term(), true))
}

fn clause_atoms(ctx: &ProverContext, clause: &Clause) -> Vec<(String, bool)> {
    clause
        .literals
        .iter()
        .map(|lit| {
            let head = ctx.bank.cell(lit.lterm).f_code;
            (ctx.sig.name_of(head).to_owned(), lit.is_positive())
        })
        .collect()
}

mod simplification {
    use super::*;

    #[test]
    fn idempotence_and_units() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let p = atom(&mut ctx, "p", &[x]);

        let (res, changed) = formula_simplify(
            &ctx.bank,
            Formula::bin(BinOp::Or, p.clone(), p.clone()),
        );
        assert!(changed);
        assert!(res.equal(&p));

        let (res, _) = formula_simplify(
            &ctx.bank,
            Formula::bin(BinOp::Or, p.clone(), Formula::prop_const(&ctx.bank, true)),
        );
        assert!(res.is_prop_true(&ctx.bank));

        let (res, _) = formula_simplify(
            &ctx.bank,
            Formula::bin(BinOp::And, p.clone(), Formula::prop_const(&ctx.bank, false)),
        );
        assert!(res.is_prop_false(&ctx.bank));

        let (res, _) = formula_simplify(
            &ctx.bank,
            Formula::bin(BinOp::Equiv, p.clone(), p.clone()),
        );
        assert!(res.is_prop_true(&ctx.bank));

        let (res, _) = formula_simplify(
            &ctx.bank,
            Formula::not(Formula::prop_const(&ctx.bank, true)),
        );
        assert!(res.is_prop_false(&ctx.bank));
    }

    #[test]
    fn implication_to_false_negates() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let p = atom(&mut ctx, "p", &[x]);

        let (res, _) = formula_simplify(
            &ctx.bank,
            Formula::bin(BinOp::Impl, p, Formula::prop_const(&ctx.bank, false)),
        );
        match res {
            Formula::Lit(eqn) => assert!(eqn.is_negative()),
            other => panic!("expected a negated literal, got {other:?}"),
        }
    }

    #[test]
    fn vacuous_quantifiers_are_dropped() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let y = ctx.bank.variable(-2);
        let p = atom(&mut ctx, "p", &[x]);

        let (res, changed) =
            formula_simplify(&ctx.bank, Formula::quant(Quantifier::All, y, p.clone()));
        assert!(changed);
        assert!(res.equal(&p));
    }

    #[test]
    fn xor_becomes_negated_equivalence() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let p = atom(&mut ctx, "p", &[x]);

        // p <~> p simplifies through ~(p <=> p) to falsity.
        let (res, _) = formula_simplify(
            &ctx.bank,
            Formula::bin(BinOp::Xor, p.clone(), p),
        );
        assert!(res.is_prop_false(&ctx.bank));
    }
}

mod negation_normal_form {
    use super::*;

    #[test]
    fn negation_reaches_the_literals() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let p = atom(&mut ctx, "p", &[x]);
        let q = atom(&mut ctx, "q", &[x]);

        // ~(p & q) becomes ~p | ~q.
        let f = Formula::not(Formula::bin(BinOp::And, p, q));
        let (f, changed) = formula_nnf(f, 1);
        assert!(changed);
        match f {
            Formula::Bin(BinOp::Or, lhs, rhs) => {
                assert!(matches!(*lhs, Formula::Lit(eqn) if eqn.is_negative()));
                assert!(matches!(*rhs, Formula::Lit(eqn) if eqn.is_negative()));
            }
            other => panic!("expected a disjunction, got {other:?}"),
        }
    }

    #[test]
    fn negated_quantifiers_dualize() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let p = atom(&mut ctx, "p", &[x]);

        let f = Formula::not(Formula::quant(Quantifier::All, x, p));
        let (f, _) = formula_nnf(f, 1);
        match f {
            Formula::Quant(Quantifier::Ex, _, body) => {
                assert!(matches!(*body, Formula::Lit(eqn) if eqn.is_negative()));
            }
            other => panic!("expected an existential, got {other:?}"),
        }
    }

    /// The equivalence expansion is polarity-dependent: positively it
    /// yields the two implications, negatively the two "both or neither"
    /// clauses.
    #[test]
    fn equivalence_by_polarity() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let p = atom(&mut ctx, "p", &[x]);
        let q = atom(&mut ctx, "q", &[x]);

        fn leaf_sign(f: &Formula) -> bool {
            match f {
                Formula::Lit(eqn) => eqn.is_positive(),
                other => panic!("expected a literal, got {other:?}"),
            }
        }
        fn or_signs(f: &Formula) -> Vec<bool> {
            match f {
                Formula::Bin(BinOp::Or, a, b) => vec![leaf_sign(a), leaf_sign(b)],
                other => panic!("expected a disjunction, got {other:?}"),
            }
        }
        fn sign_pattern(f: &Formula) -> Vec<Vec<bool>> {
            match f {
                Formula::Bin(BinOp::And, a, b) => vec![or_signs(a), or_signs(b)],
                other => panic!("expected a conjunction, got {other:?}"),
            }
        }

        // p <=> q at positive polarity: (~p | q) & (~q | p).
        let (pos, _) = formula_nnf(Formula::bin(BinOp::Equiv, p.clone(), q.clone()), 1);
        assert_eq!(sign_pattern(&pos), vec![vec![false, true], vec![false, true]]);

        // ~(p <=> q): (~p | ~q) & (p | q).
        let (neg, _) = formula_nnf(Formula::not(Formula::bin(BinOp::Equiv, p, q)), 1);
        assert_eq!(sign_pattern(&neg), vec![vec![false, false], vec![true, true]]);
    }
}

mod miniscoping {
    use super::*;

    #[test]
    fn quantifier_moves_past_a_closed_operand() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let c = ctx.sig.intern_fun("c", 0).unwrap();
        let tc = ctx.bank.constant(&ctx.sig, c);

        let px = atom(&mut ctx, "p", &[x]);
        let qc = atom(&mut ctx, "q", &[tc]);

        // !x. (q(c) & p(x)) --- x is free only on the right.
        let f = Formula::quant(
            Quantifier::All,
            x,
            Formula::bin(BinOp::And, qc.clone(), px),
        );
        let (f, changed) = formula_miniscope(&ctx.bank, f);
        assert!(changed);
        match f {
            Formula::Bin(BinOp::And, lhs, rhs) => {
                assert!(lhs.equal(&qc));
                assert!(rhs.is_quantified());
            }
            other => panic!("expected the conjunction at the top, got {other:?}"),
        }
    }
}

mod clausification {
    use super::*;

    /// `(!x. (p(x) => q(x))) & p(c)` produces `~p(X) | q(X)` and `p(c)`.
    #[test]
    fn implication_and_unit() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let c = ctx.sig.intern_fun("c", 0).unwrap();
        let tc = ctx.bank.constant(&ctx.sig, c);

        let px = atom(&mut ctx, "p", &[x]);
        let qx = atom(&mut ctx, "q", &[x]);
        let pc = atom(&mut ctx, "p", &[tc]);

        let f = Formula::bin(
            BinOp::And,
            Formula::quant(Quantifier::All, x, Formula::bin(BinOp::Impl, px, qx)),
            pc,
        );

        let mut wform = WFormula::new(1, Role::Axiom, f);
        let mut set = ClauseSet::new();
                let produced = wformula_cnf(
            &mut ctx.sig,
            &mut ctx.bank,
            &mut ctx.counters,
            &mut wform,
            &mut set,
        );
        assert_eq!(produced, 2);

        let clauses: Vec<&Clause> = set.iter().map(|(_, clause)| clause).collect();
        let mut saw_implication = false;
        let mut saw_unit = false;
        for clause in clauses {
            assert_eq!(clause.role, Role::Axiom);
            match clause.lit_count() {
                2 => {
                    let atoms = clause_atoms(&ctx, clause);
                    assert!(atoms.contains(&("p".to_owned(), false)));
                    assert!(atoms.contains(&("q".to_owned(), true)));
                    // Both literals use the same, densely renumbered
                    // variable.
                    let args: Vec<TermRef> = clause
                        .literals
                        .iter()
                        .map(|lit| ctx.bank.cell(lit.lterm).args[0])
                        .collect();
                    assert_eq!(args[0], args[1]);
                    assert_eq!(ctx.bank.cell(args[0]).f_code, -1);
                    saw_implication = true;
                }
                1 => {
                    let lit = &clause.literals[0];
                    assert!(lit.is_positive());
                    assert_eq!(ctx.bank.cell(lit.lterm).args[0], tc);
                    saw_unit = true;
                }
                n => panic!("unexpected clause of {n} literals"),
            }
        }
        assert!(saw_implication && saw_unit);
    }

    /// Skolemization introduces one fresh unary symbol per existential.
    #[test]
    fn skolem_symbols_are_fresh_per_formula() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let y = ctx.bank.variable(-2);
        let rxy = atom(&mut ctx, "r", &[x, y]);

        let f = Formula::quant(
            Quantifier::All,
            x,
            Formula::quant(Quantifier::Ex, y, rxy),
        );

        let mut set = ClauseSet::new();
                let mut wform = WFormula::new(1, Role::Axiom, f);
        wformula_cnf(&mut ctx.sig, &mut ctx.bank, &mut ctx.counters, &mut wform, &mut set);

        let sk1 = ctx.sig.code_of("sk1").expect("first skolem symbol");
        assert_eq!(ctx.sig.arity(sk1), 1);

        let (_, clause) = set.iter().next().expect("one clause");
        assert_eq!(clause.lit_count(), 1);
        let lit = &clause.literals[0];
        let args = ctx.bank.cell(lit.lterm).args.clone();
        assert_eq!(args.len(), 2);
        // r(X, sk1(X)) for the clause's own variable X.
        assert!(ctx.bank.cell(args[0]).is_var());
        let sk_term = ctx.bank.cell(args[1]);
        assert_eq!(sk_term.f_code, sk1);
        assert_eq!(sk_term.args[0], args[0]);

        // A second formula gets its own symbol of the same shape.
        let u = ctx.bank.variable(-1);
        let v = ctx.bank.variable(-2);
        let ruv = atom(&mut ctx, "r", &[u, v]);
        let g = Formula::quant(
            Quantifier::All,
            u,
            Formula::quant(Quantifier::Ex, v, ruv),
        );
        let mut wform = WFormula::new(2, Role::Axiom, g);
        wformula_cnf(&mut ctx.sig, &mut ctx.bank, &mut ctx.counters, &mut wform, &mut set);

        let sk2 = ctx.sig.code_of("sk2").expect("second skolem symbol");
        assert_eq!(ctx.sig.arity(sk2), 1);
    }

    /// Distribution turns a disjunction over a conjunction into two
    /// clauses sharing the disjunct.
    #[test]
    fn distribution_shares_the_disjunct() {
        let mut ctx = ProverContext::new();
        let x = ctx.bank.variable(-1);
        let p = atom(&mut ctx, "p", &[x]);
        let q = atom(&mut ctx, "q", &[x]);
        let r = atom(&mut ctx, "r", &[x]);

        // p | (q & r) yields {p | q, p | r}.
        let f = Formula::quant(
            Quantifier::All,
            x,
            Formula::bin(BinOp::Or, p, Formula::bin(BinOp::And, q, r)),
        );
        let mut set = ClauseSet::new();
                let mut wform = WFormula::new(1, Role::Axiom, f);
        let produced =
            wformula_cnf(&mut ctx.sig, &mut ctx.bank, &mut ctx.counters, &mut wform, &mut set);
        assert_eq!(produced, 2);
        for (_, clause) in set.iter() {
            assert_eq!(clause.lit_count(), 2);
            let atoms = clause_atoms(&ctx, clause);
            assert!(atoms.contains(&("p".to_owned(), true)));
        }
    }

    /// Conjecture negation flips the role, and the CNF of the negated
    /// conjecture carries it.
    #[test]
    fn conjecture_roles_survive() {
        let mut ctx = ProverContext::new();
        let c = ctx.sig.intern_fun("c", 0).unwrap();
        let tc = ctx.bank.constant(&ctx.sig, c);
        let pc = atom(&mut ctx, "p", &[tc]);

        let mut fset = FormulaSet::new();
        fset.insert(WFormula::new(1, Role::Conjecture, pc));
        assert_eq!(fset.negate_conjectures(), 1);

        let mut cset = ClauseSet::new();
                formula_set_cnf(
            &mut ctx.sig,
            &mut ctx.bank,
            &mut ctx.counters,
            &mut fset,
            &mut cset,
        );

        assert_eq!(cset.len(), 1);
        let (_, clause) = cset.iter().next().expect("one clause");
        assert_eq!(clause.role, Role::NegatedConjecture);
        assert_eq!(clause.lit_count(), 1);
        assert!(clause.literals[0].is_negative());
    }

    /// Duplicate literals are suppressed during collection.
    #[test]
    fn duplicate_literals_collapse() {
        let mut ctx = ProverContext::new();
        let c = ctx.sig.intern_fun("c", 0).unwrap();
        let tc = ctx.bank.constant(&ctx.sig, c);
        let pc = atom(&mut ctx, "p", &[tc]);

        // p(c) | q(c) | p(c) --- the duplicate survives simplification
        // (only directly equal operands fold) and is dropped at
        // extraction.
        let q = atom(&mut ctx, "q", &[tc]);
        let f = Formula::bin(
            BinOp::Or,
            Formula::bin(BinOp::Or, pc.clone(), q),
            pc,
        );

        let mut set = ClauseSet::new();
        let mut wform = WFormula::new(1, Role::Axiom, f);
        wformula_cnf(
            &mut ctx.sig,
            &mut ctx.bank,
            &mut ctx.counters,
            &mut wform,
            &mut set,
        );

        let (_, clause) = set.iter().next().expect("one clause");
        assert_eq!(clause.lit_count(), 2);
    }
}
