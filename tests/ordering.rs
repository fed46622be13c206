use ember_fol::{
    context::ProverContext,
    db::signature::Signature,
    db::term_bank::TermBank,
    ordering::{
        kbo::kbo_compare, kbolin::kbo6_compare, ocb::Ocb, weightgen, CompareResult, OrderingType,
    },
    structures::term::{DerefKind, TermRef},
    types::FunCode,
};

const NEVER: DerefKind = DerefKind::Never;

/// A signature with `a, b : 0` and `f : 1`, plus a matrix OCB with
/// precedence `a < b < f` and all weights 1.
fn ground_setup() -> (Signature, TermBank, Ocb, FunCode, FunCode, FunCode) {
    let mut sig = Signature::new();
    let a = sig.intern_fun("a", 0).unwrap();
    let b = sig.intern_fun("b", 0).unwrap();
    let f = sig.intern_fun("f", 1).unwrap();
    let bank = TermBank::new(&sig);

    let mut ocb = Ocb::new(OrderingType::Kbo6, false, &sig);
    weightgen::generate_weights(
        &mut ocb,
        &sig,
        &bank,
        None,
        weightgen::WeightGenMethod::Constant,
        None,
    );
    ocb.add_precedence_tuple(b, a, CompareResult::Greater).unwrap();
    ocb.add_precedence_tuple(f, b, CompareResult::Greater).unwrap();

    (sig, bank, ocb, a, b, f)
}

mod ground_comparison {
    use super::*;

    #[test]
    fn constants_and_unary_spines() {
        let (sig, mut bank, mut ocb, a, b, f) = ground_setup();
        let ta = bank.constant(&sig, a);
        let tb = bank.constant(&sig, b);
        let fa = bank.insert(&sig, f, &[ta]);
        let fb = bank.insert(&sig, f, &[tb]);
        let ffa = bank.insert(&sig, f, &[fa]);

        assert_eq!(ocb.compare(&bank, fa, fb, NEVER, NEVER), CompareResult::Less);
        assert_eq!(ocb.compare(&bank, ffa, fb, NEVER, NEVER), CompareResult::Greater);
        assert_eq!(ocb.compare(&bank, ta, ta, NEVER, NEVER), CompareResult::Equal);
    }

    /// With a total precedence and positive weights the ordering is total
    /// on ground terms, and antisymmetric.
    #[test]
    fn totality_on_ground_terms() {
        let (sig, mut bank, mut ocb, a, b, f) = ground_setup();
        let ta = bank.constant(&sig, a);
        let tb = bank.constant(&sig, b);

        let mut terms = vec![ta, tb];
        let depth1: Vec<TermRef> = terms
            .iter()
            .map(|&t| bank.insert(&sig, f, &[t]))
            .collect();
        terms.extend(&depth1);
        let depth2: Vec<TermRef> = depth1
            .iter()
            .map(|&t| bank.insert(&sig, f, &[t]))
            .collect();
        terms.extend(&depth2);

        for &s in &terms {
            for &t in &terms {
                let st = ocb.compare(&bank, s, t, NEVER, NEVER);
                let ts = ocb.compare(&bank, t, s, NEVER, NEVER);
                assert_ne!(st, CompareResult::Uncomparable, "ground pair uncomparable");
                assert_eq!(st, ts.inverse());
                if s == t {
                    assert_eq!(st, CompareResult::Equal);
                } else {
                    assert_ne!(st, CompareResult::Equal);
                }
            }
        }
    }
}

mod variable_condition {
    use super::*;

    #[test]
    fn variables_against_their_superterms() {
        let (sig, mut bank, mut ocb, _, _, f) = ground_setup();
        let x = bank.variable(-1);
        let y = bank.variable(-2);
        let fx = bank.insert(&sig, f, &[x]);

        assert_eq!(ocb.compare(&bank, fx, x, NEVER, NEVER), CompareResult::Greater);
        assert_eq!(ocb.compare(&bank, x, fx, NEVER, NEVER), CompareResult::Less);
        assert_eq!(
            ocb.compare(&bank, x, y, NEVER, NEVER),
            CompareResult::Uncomparable
        );
    }

    #[test]
    fn unbalanced_variables_block_comparison() {
        let mut sig = Signature::new();
        let g = sig.intern_fun("g", 2).unwrap();
        let mut bank = TermBank::new(&sig);
        let mut ocb = Ocb::new(OrderingType::Kbo6, true, &sig);

        let x = bank.variable(-1);
        let y = bank.variable(-2);
        let gxx = bank.insert(&sig, g, &[x, x]);
        let gxy = bank.insert(&sig, g, &[x, y]);

        // g(x, x) is heavier in x but lacks the y of g(x, y).
        assert_eq!(
            ocb.compare(&bank, gxx, gxy, NEVER, NEVER),
            CompareResult::Uncomparable
        );
        assert_eq!(
            ocb.compare(&bank, gxy, gxx, NEVER, NEVER),
            CompareResult::Uncomparable
        );
    }
}

mod precedence_state {
    use super::*;
    use ember_fol::types::err::OrderingError;

    #[test]
    fn rollback_restores_the_snapshot() {
        let mut sig = Signature::new();
        let codes: Vec<FunCode> = ["p", "q", "r", "s"]
            .iter()
            .map(|name| sig.intern_fun(name, 0).unwrap())
            .collect();
        let mut ocb = Ocb::new(OrderingType::Kbo6, false, &sig);

        let state0 = ocb.precedence_state();
        ocb.add_precedence_tuple(codes[0], codes[1], CompareResult::Greater)
            .unwrap();
        let state1 = ocb.precedence_state();
        ocb.add_precedence_tuple(codes[1], codes[2], CompareResult::Greater)
            .unwrap();
        ocb.add_precedence_tuple(codes[2], codes[3], CompareResult::Equal)
            .unwrap();

        // Derived by closure.
        assert_eq!(ocb.fun_compare(codes[0], codes[2]), CompareResult::Greater);
        assert_eq!(ocb.fun_compare(codes[1], codes[3]), CompareResult::Greater);

        // A cycle is refused and leaves no trace.
        assert_eq!(
            ocb.add_precedence_tuple(codes[2], codes[0], CompareResult::Greater),
            Err(OrderingError::PrecedenceInconsistent)
        );
        assert_eq!(ocb.fun_compare(codes[0], codes[2]), CompareResult::Greater);

        ocb.backtrack(state1);
        assert_eq!(ocb.fun_compare(codes[0], codes[1]), CompareResult::Greater);
        assert_eq!(
            ocb.fun_compare(codes[1], codes[2]),
            CompareResult::Uncomparable
        );

        ocb.backtrack(state0);
        assert_eq!(
            ocb.fun_compare(codes[0], codes[1]),
            CompareResult::Uncomparable
        );
    }
}

mod linear_vs_textbook {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    struct TermGen {
        rng: SmallRng,
        consts: Vec<FunCode>,
        unaries: Vec<FunCode>,
        binaries: Vec<FunCode>,
    }

    impl TermGen {
        fn random_term(&mut self, bank: &mut TermBank, sig: &Signature, depth: usize) -> TermRef {
            if depth == 0 || self.rng.gen_range(0..4) == 0 {
                if self.rng.gen_bool(0.4) {
                    let var = -(self.rng.gen_range(1..=3) as FunCode);
                    return bank.variable(var);
                }
                let code = self.consts[self.rng.gen_range(0..self.consts.len())];
                return bank.constant(sig, code);
            }
            if self.rng.gen_bool(0.5) {
                let code = self.unaries[self.rng.gen_range(0..self.unaries.len())];
                let arg = self.random_term(bank, sig, depth - 1);
                bank.insert(sig, code, &[arg])
            } else {
                let code = self.binaries[self.rng.gen_range(0..self.binaries.len())];
                let lhs = self.random_term(bank, sig, depth - 1);
                let rhs = self.random_term(bank, sig, depth - 1);
                bank.insert(sig, code, &[lhs, rhs])
            }
        }
    }

    /// The linear KBO6 agrees with the textbook definition on ten
    /// thousand random term pairs.
    #[test]
    fn agreement_on_random_pairs() {
        let mut sig = Signature::new();
        let consts = vec![
            sig.intern_fun("a", 0).unwrap(),
            sig.intern_fun("b", 0).unwrap(),
            sig.intern_fun("c", 0).unwrap(),
        ];
        let unaries = vec![
            sig.intern_fun("f", 1).unwrap(),
            sig.intern_fun("g", 1).unwrap(),
        ];
        let binaries = vec![
            sig.intern_fun("h", 2).unwrap(),
            sig.intern_fun("k", 2).unwrap(),
        ];
        let mut bank = TermBank::new(&sig);

        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut ocb = Ocb::new(OrderingType::Kbo6, true, &sig);
        for f in 1..=sig.f_count() {
            ocb.set_fun_weight(f, rng.gen_range(1..=3));
        }

        let mut gen = TermGen {
            rng: SmallRng::seed_from_u64(0xace),
            consts,
            unaries,
            binaries,
        };

        for round in 0..10_000 {
            let s = gen.random_term(&mut bank, &sig, 3);
            let t = gen.random_term(&mut bank, &sig, 3);
            let linear = kbo6_compare(&mut ocb, &bank, s, t, NEVER, NEVER);
            let textbook = kbo_compare(&ocb, &bank, s, t, NEVER, NEVER);
            assert_eq!(linear, textbook, "divergence in round {round}");

            let flipped = kbo6_compare(&mut ocb, &bank, t, s, NEVER, NEVER);
            assert_eq!(linear, flipped.inverse(), "asymmetry in round {round}");
        }
    }
}

mod weight_generation {
    use super::*;
    use ember_fol::ordering::weightgen::WeightGenMethod;

    #[test]
    fn arity_weights_follow_the_signature() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let f = ctx.sig.intern_fun("f", 1).unwrap();
        let g = ctx.sig.intern_fun("g", 3).unwrap();

        let mut ocb = Ocb::new(OrderingType::Kbo6, true, &ctx.sig);
        weightgen::generate_weights(
            &mut ocb,
            &ctx.sig,
            &ctx.bank,
            None,
            WeightGenMethod::Arity,
            None,
        );
        assert_eq!(ocb.fun_weight(a), 1);
        assert_eq!(ocb.fun_weight(f), 2);
        assert_eq!(ocb.fun_weight(g), 4);
    }

    #[test]
    fn constant_override_applies_to_constants_only() {
        let mut ctx = ProverContext::new();
        let a = ctx.sig.intern_fun("a", 0).unwrap();
        let f = ctx.sig.intern_fun("f", 2).unwrap();

        let mut ocb = Ocb::new(OrderingType::Kbo6, true, &ctx.sig);
        weightgen::generate_weights(
            &mut ocb,
            &ctx.sig,
            &ctx.bank,
            None,
            WeightGenMethod::Constant,
            Some(7),
        );
        assert_eq!(ocb.fun_weight(a), 7);
        assert_eq!(ocb.fun_weight(f), 1);
    }
}
