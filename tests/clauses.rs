use ember_fol::{
    context::ProverContext,
    db::clause_set::ClauseSet,
    index::overlap::OverlapIndex,
    structures::{
        clause::{Clause, ClauseProps},
        eqn::{Eqn, EqnProps},
        subst::Subst,
        term::TermRef,
        Role,
    },
};

fn new_clause(ctx: &mut ProverContext, literals: Vec<Eqn>) -> Clause {
    let ident = ctx.counters.next_clause_ident();
    let date = ctx.counters.tick_date();
    Clause::new(&ctx.bank, ident, date, literals, Role::Axiom)
}

fn pos_atom(ctx: &mut ProverContext, pred: &str, args: &[TermRef]) -> Eqn {
    let code = ctx.sig.intern_pred(pred, args.len()).unwrap();
    let term = ctx.bank.insert(&ctx.sig, code, args);
    Eqn::new(&ctx.bank, term, ctx.bank.true_term(), true)
}

mod literal_housekeeping {
    use super::*;

    #[test]
    fn superfluous_literals_are_removed() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);

        let pa = pos_atom(&mut ctx, "p", &[ta]);
        let qa = pos_atom(&mut ctx, "q", &[ta]);
        let resolved = Eqn::new(&ctx.bank, ta, ta, false);

        // p(a) | p(a) | a != a | q(a)  --- one duplicate, one resolved.
        let mut clause = new_clause(&mut ctx, vec![pa, pa, resolved, qa]);
        assert_eq!(clause.lit_count(), 4);
        assert!(clause.props.has(ClauseProps::INITIAL));

        let removed = clause.remove_superfluous_literals(&ctx.bank);
        assert_eq!(removed, 2);
        assert_eq!(clause.lit_count(), 2);
        assert_eq!(clause.pos_lit_no, 2);
        assert_eq!(clause.neg_lit_no, 0);
        assert!(!clause.props.has(ClauseProps::INITIAL));

        // A trivial positive equation is kept: it makes the clause true,
        // not redundant literal-wise.
        let trivial = Eqn::new(&ctx.bank, ta, ta, true);
        let mut clause = new_clause(&mut ctx, vec![trivial]);
        assert_eq!(clause.remove_superfluous_literals(&ctx.bank), 0);
        assert_eq!(clause.lit_count(), 1);
    }

    #[test]
    fn counters_track_removals_and_flips() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);

        let pa = pos_atom(&mut ctx, "p", &[ta]);
        let qa = pos_atom(&mut ctx, "q", &[ta]).negated();
        let mut clause = new_clause(&mut ctx, vec![pa, qa]);
        assert_eq!((clause.pos_lit_no, clause.neg_lit_no), (1, 1));

        clause.flip_literal_sign(0);
        assert_eq!((clause.pos_lit_no, clause.neg_lit_no), (0, 2));

        let weight_before = clause.weight;
        let removed = clause.remove_literal(&ctx.bank, 1);
        assert_eq!(clause.lit_count(), 1);
        assert_eq!(clause.neg_lit_no, 1);
        assert_eq!(
            clause.weight,
            weight_before - removed.standard_weight(&ctx.bank)
        );
    }

    /// A non-orientable positive unit simplifies a clause holding a
    /// negative instance of it (the simplify-reflect precondition).
    #[test]
    fn unit_simplify_test_detects_instances() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let f = ctx.sig.intern_fun("f", 2).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);
        let x = ctx.bank.variable(-1);
        let y = ctx.bank.variable(-2);

        // Simplifier: f(x, y) = f(y, x).
        let fxy = ctx.bank.insert(&ctx.sig, f, &[x, y]);
        let fyx = ctx.bank.insert(&ctx.sig, f, &[y, x]);
        let simplifier_eqn = Eqn::new(&ctx.bank, fxy, fyx, true);
        let simplifier = new_clause(&mut ctx, vec![simplifier_eqn]);

        // Clause: f(a, a) != f(a, a) | p(a).
        let faa = ctx.bank.insert(&ctx.sig, f, &[ta, ta]);
        let neg = Eqn::new(&ctx.bank, faa, faa, false);
        let pa = pos_atom(&mut ctx, "p", &[ta]);
        let clause = new_clause(&mut ctx, vec![neg, pa]);

        let mut subst = Subst::new();
        assert!(clause.unit_simplify_test(&mut ctx.bank, &mut subst, &simplifier));
        assert!(subst.is_empty());

        // An all-positive clause is not touched by a positive unit.
        let q_atom = pos_atom(&mut ctx, "q", &[ta]);
        let pos_only = new_clause(&mut ctx, vec![q_atom]);
        assert!(!pos_only.unit_simplify_test(&mut ctx.bank, &mut subst, &simplifier));
    }
}

mod canonization {
    use super::*;

    #[test]
    fn literals_orient_and_sort() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let g = ctx.sig.intern_fun("g", 1).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);
        let ga = ctx.bank.insert(&ctx.sig, g, &[ta]);

        // a = g(a) puts the heavier side left when canonized.
        let light_first = Eqn::new(&ctx.bank, ta, ga, true);
        let pa = pos_atom(&mut ctx, "p", &[ta]).negated();
        let mut clause = new_clause(&mut ctx, vec![light_first, pa]);
        clause.canonize(&ctx.bank);

        // Negative literals come first in the canonical order.
        assert!(clause.literals[0].is_negative());
        let eq = &clause.literals[1];
        assert_eq!(eq.lterm, ga);
        assert_eq!(eq.rterm, ta);
    }

    #[test]
    fn sets_sort_by_weight_then_structure() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let g = ctx.sig.intern_fun("g", 1).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);
        let ga = ctx.bank.insert(&ctx.sig, g, &[ta]);
        let gga = ctx.bank.insert(&ctx.sig, g, &[ga]);

        let heavy_eqn = Eqn::new(&ctx.bank, gga, ta, true);
        let heavy = new_clause(&mut ctx, vec![heavy_eqn]);
        let light_eqn = Eqn::new(&ctx.bank, ga, ta, true);
        let light = new_clause(&mut ctx, vec![light_eqn]);

        let mut set = ClauseSet::new();
        set.insert(&ctx.bank, heavy);
        set.insert(&ctx.bank, light);
        set.canonize(&ctx.bank);

        let weights: Vec<u64> = set.iter().map(|(_, clause)| clause.weight).collect();
        assert!(weights.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}

mod overlap_index {
    use super::*;

    fn maximal_rule(ctx: &mut ProverContext, l: TermRef, r: TermRef) -> Clause {
        let mut eqn = Eqn::new(&ctx.bank, l, r, true);
        eqn.props.set(EqnProps::MAXIMAL);
        eqn.props.set(EqnProps::ORIENTED);
        new_clause(ctx, vec![eqn])
    }

    /// Into-positions cover the non-variable subterms of maximal sides;
    /// deletion returns the index to its previous state.
    #[test]
    fn insert_delete_roundtrip() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let g = ctx.sig.intern_fun("g", 1).unwrap();
        let f = ctx.sig.intern_fun("f", 2).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);
        let x = ctx.bank.variable(-1);
        let ga = ctx.bank.insert(&ctx.sig, g, &[ta]);
        let lhs = ctx.bank.insert(&ctx.sig, f, &[ga, x]);

        let clause = maximal_rule(&mut ctx, lhs, ta);
        let mut set = ClauseSet::new();
        let cref = set.insert(&ctx.bank, clause);

        let mut index = OverlapIndex::new();
        index.insert_into_clause(&ctx.bank, cref, set.get(cref));

        // f(g(a), x), g(a), a --- the variable is skipped.
        assert_eq!(index.entry_count(), 3);
        assert_eq!(index.positions_of(&ctx.bank, lhs).len(), 1);
        assert_eq!(index.positions_of(&ctx.bank, ga).len(), 1);
        assert!(index.positions_of(&ctx.bank, x).is_empty());

        index.delete_into_clause(&ctx.bank, cref, set.get(cref));
        assert!(index.is_empty());
    }

    #[test]
    fn from_positions_cover_unoriented_sides() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let b = ctx.sig.intern_fun("b", 0).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);
        let tb = ctx.bank.constant(&ctx.sig, b);

        let mut eqn = Eqn::new(&ctx.bank, ta, tb, true);
        eqn.props.set(EqnProps::MAXIMAL);
        let clause = new_clause(&mut ctx, vec![eqn]);
        let mut set = ClauseSet::new();
        let cref = set.insert(&ctx.bank, clause);

        let mut index = OverlapIndex::new();
        index.insert_from_clause(&ctx.bank, cref, set.get(cref));

        // Un-oriented: both sides are rewrite sources.
        assert_eq!(index.entry_count(), 2);
        assert_eq!(index.positions_of(&ctx.bank, ta).len(), 1);
        let rhs_positions = index.positions_of(&ctx.bank, tb);
        assert_eq!(rhs_positions.len(), 1);
        assert_eq!(rhs_positions[0].1, ctx.bank.weight(ta));

        index.delete_from_clause(&ctx.bank, cref, set.get(cref));
        assert!(index.is_empty());
    }

    #[test]
    fn fingerprints_admit_unifiable_candidates() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let b = ctx.sig.intern_fun("b", 0).unwrap();
        let f = ctx.sig.intern_fun("f", 2).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);
        let tb = ctx.bank.constant(&ctx.sig, b);
        let x = ctx.bank.variable(-1);

        let fab = ctx.bank.insert(&ctx.sig, f, &[ta, tb]);
        let fxb = ctx.bank.insert(&ctx.sig, f, &[x, tb]);
        let fba = ctx.bank.insert(&ctx.sig, f, &[tb, ta]);

        let clause = maximal_rule(&mut ctx, fab, ta);
        let mut set = ClauseSet::new();
        let cref = set.insert(&ctx.bank, clause);
        let mut index = OverlapIndex::new();
        index.insert_into_clause(&ctx.bank, cref, set.get(cref));

        // f(x, b) could unify with the indexed f(a, b); f(b, a) cannot.
        let candidates = index.unify_candidates(&ctx.bank, fxb);
        assert!(candidates.iter().any(|&(term, _, _)| term == fab));
        let candidates = index.unify_candidates(&ctx.bank, fba);
        assert!(!candidates.iter().any(|&(term, _, _)| term == fab));
    }
}

mod garbage_collection {
    use super::*;

    #[test]
    fn clause_sets_root_their_terms() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let g = ctx.sig.intern_fun("g", 1).unwrap();
        let ta = ctx.bank.constant(&ctx.sig, a);
        let ga = ctx.bank.insert(&ctx.sig, g, &[ta]);
        let gga = ctx.bank.insert(&ctx.sig, g, &[ga]);

        let keep_eqn = Eqn::new(&ctx.bank, ga, ta, true);
        let keep = new_clause(&mut ctx, vec![keep_eqn]);
        let mut set = ClauseSet::new();
        set.insert(&ctx.bank, keep);

        // g(g(a)) is reachable from nothing and is collected; the
        // clause's terms survive.
        let freed = ctx.bank.gc(&[&set]);
        assert_eq!(freed, 1);
        assert_eq!(ctx.bank.cell(ga).args, vec![ta]);

        // Re-creating the collected term yields a fresh, again-shared
        // cell.
        let gga_again = ctx.bank.insert(&ctx.sig, g, &[ga]);
        assert_ne!(gga_again, gga);
        assert_eq!(
            ctx.bank.insert(&ctx.sig, g, &[ga]),
            gga_again
        );
    }
}
