/*!
Weight generation for the Knuth-Bendix ordering.

Each scheme fills the OCB's symbol-weight array deterministically from the
signature and, for the frequency-based schemes, from an axiom clause set.
A constant-weight override, when given, replaces the weight of every
ordinary constant afterwards. `$true` always receives the variable weight.
*/

use crate::{
    db::{clause_set::ClauseSet, signature::{Signature, SIG_TRUE_CODE}, term_bank::TermBank},
    ordering::{ocb::Ocb, CompareResult},
    structures::term::TermRef,
    types::FunCode,
};

/// The default weight unit.
pub const W_DEFAULT_WEIGHT: i64 = 1;

/// Base weight of the modified-arity schemes.
pub const W_TO_BASEWEIGHT: i64 = 4;

/// Deterministic weight assignment schemes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeightGenMethod {
    /// All symbols weigh the default.
    Constant,
    /// Default weights, except the first maximal non-constant symbol
    /// weighs 0.
    SelectMaximal,
    /// `w(f) = arity(f) + 1`.
    Arity,
    /// As [Arity](WeightGenMethod::Arity), 0 for the first maximal symbol.
    ArityMax0,
    /// `w(f) = arity(f) + 4`; variables weigh the constant weight.
    ModArity,
    /// As [ModArity](WeightGenMethod::ModArity), 0 for the first maximal
    /// symbol.
    ModArityMax0,
    /// `w(f) = arity(f)² + 1`.
    AritySq,
    /// As [AritySq](WeightGenMethod::AritySq), 0 for the first maximal
    /// symbol.
    AritySqMax0,
    /// `w(f) = maxarity + 1 - arity(f)`.
    InvArity,
    /// As [InvArity](WeightGenMethod::InvArity), 0 for the first maximal
    /// symbol.
    InvArityMax0,
    /// `w(f) = |{g | g < f}| + 1`.
    Precedence,
    /// `w(f) = |{g | g > f}| + 1`.
    PrecedenceInv,
    /// `w(f)` is the occurrence count of `f` in the axioms.
    Frequency,
    /// `w(f)` is the maximal occurrence count plus one, minus the count of
    /// `f`.
    InvFrequency,
    /// `w(f)` is the rank of `f` in the frequency-induced quasi-order.
    FrequencyRank,
    /// `w(f)` is the inverse rank of `f` in the frequency-induced
    /// quasi-order.
    InvFrequencyRank,
}

/// Fill the weight array of `ocb` according to `method`. `const_weight`,
/// when given, overrides the weight of every ordinary constant.
pub fn generate_weights(
    ocb: &mut Ocb,
    sig: &Signature,
    bank: &TermBank,
    axioms: Option<&ClauseSet>,
    method: WeightGenMethod,
    const_weight: Option<i64>,
) {
    ocb.set_fun_weight(SIG_TRUE_CODE, 1);

    match method {
        WeightGenMethod::Constant => generate_constant_weights(ocb),
        WeightGenMethod::SelectMaximal => {
            generate_constant_weights(ocb);
            set_maximal_0(ocb, sig);
        }
        WeightGenMethod::ModArity | WeightGenMethod::ModArityMax0 => {
            generate_arity_weights(ocb, sig, method);
            ocb.var_weight = const_weight.unwrap_or(W_TO_BASEWEIGHT);
        }
        WeightGenMethod::Arity
        | WeightGenMethod::ArityMax0
        | WeightGenMethod::AritySq
        | WeightGenMethod::AritySqMax0
        | WeightGenMethod::InvArity
        | WeightGenMethod::InvArityMax0 => generate_arity_weights(ocb, sig, method),
        WeightGenMethod::Precedence => generate_precedence_weights(ocb, false),
        WeightGenMethod::PrecedenceInv => generate_precedence_weights(ocb, true),
        WeightGenMethod::Frequency => {
            let freq = symbol_frequencies(ocb, bank, axioms);
            for f in (SIG_TRUE_CODE + 1)..=ocb.sig_size() {
                ocb.set_fun_weight(f, freq[f as usize].max(1) * W_DEFAULT_WEIGHT);
            }
        }
        WeightGenMethod::InvFrequency => {
            let freq = symbol_frequencies(ocb, bank, axioms);
            let max_count = freq
                .iter()
                .skip((SIG_TRUE_CODE + 1) as usize)
                .copied()
                .max()
                .unwrap_or(1)
                .max(1)
                + 1;
            for f in (SIG_TRUE_CODE + 1)..=ocb.sig_size() {
                ocb.set_fun_weight(f, (max_count - freq[f as usize].max(1)) * W_DEFAULT_WEIGHT);
            }
        }
        WeightGenMethod::FrequencyRank => generate_freqrank_weights(ocb, bank, axioms, false),
        WeightGenMethod::InvFrequencyRank => generate_freqrank_weights(ocb, bank, axioms, true),
    }

    if let Some(const_weight) = const_weight {
        for f in (SIG_TRUE_CODE + 1)..=ocb.sig_size() {
            if sig.arity(f) == 0 {
                ocb.set_fun_weight(f, const_weight);
            }
        }
    }
    ocb.set_fun_weight(SIG_TRUE_CODE, ocb.var_weight);
}

fn generate_constant_weights(ocb: &mut Ocb) {
    for f in (SIG_TRUE_CODE + 1)..=ocb.sig_size() {
        ocb.set_fun_weight(f, W_DEFAULT_WEIGHT);
    }
}

/// Give the first non-constant symbol that is precedence-maximal weight 0.
fn set_maximal_0(ocb: &mut Ocb, sig: &Signature) {
    for f in (SIG_TRUE_CODE + 1)..=ocb.sig_size() {
        if sig.arity(f) == 0 {
            continue;
        }
        let maximal =
            (1..=ocb.sig_size()).all(|g| ocb.fun_compare(f, g) != CompareResult::Less);
        if maximal {
            ocb.set_fun_weight(f, 0);
            break;
        }
    }
}

fn generate_arity_weights(ocb: &mut Ocb, sig: &Signature, method: WeightGenMethod) {
    let max_arity = (1..=ocb.sig_size())
        .map(|f| sig.arity(f) as i64)
        .max()
        .unwrap_or(0);
    for f in (SIG_TRUE_CODE + 1)..=ocb.sig_size() {
        let arity = sig.arity(f) as i64;
        let weight = match method {
            WeightGenMethod::Arity | WeightGenMethod::ArityMax0 => arity + 1,
            WeightGenMethod::ModArity | WeightGenMethod::ModArityMax0 => arity + W_TO_BASEWEIGHT,
            WeightGenMethod::AritySq | WeightGenMethod::AritySqMax0 => arity * arity + 1,
            WeightGenMethod::InvArity | WeightGenMethod::InvArityMax0 => max_arity - arity + 1,
            _ => unreachable!("not an arity scheme"),
        };
        ocb.set_fun_weight(f, weight * W_DEFAULT_WEIGHT);
    }
    if matches!(
        method,
        WeightGenMethod::ArityMax0
            | WeightGenMethod::ModArityMax0
            | WeightGenMethod::AritySqMax0
            | WeightGenMethod::InvArityMax0
    ) {
        set_maximal_0(ocb, sig);
    }
}

fn generate_precedence_weights(ocb: &mut Ocb, inverted: bool) {
    let below = if inverted {
        CompareResult::Less
    } else {
        CompareResult::Greater
    };
    for f in (SIG_TRUE_CODE + 1)..=ocb.sig_size() {
        let count = (1..=ocb.sig_size())
            .filter(|&g| ocb.fun_compare(f, g) == below)
            .count() as i64;
        ocb.set_fun_weight(f, (count + 1) * W_DEFAULT_WEIGHT);
    }
}

fn generate_freqrank_weights(
    ocb: &mut Ocb,
    bank: &TermBank,
    axioms: Option<&ClauseSet>,
    inverted: bool,
) {
    let freq = symbol_frequencies(ocb, bank, axioms);
    let mut codes: Vec<FunCode> = ((SIG_TRUE_CODE + 1)..=ocb.sig_size()).collect();
    codes.sort_by_key(|&f| (freq[f as usize], f));
    if inverted {
        codes.reverse();
    }

    let mut rank = 0;
    let mut last_freq = 0;
    let mut first = true;
    for f in codes {
        if first || freq[f as usize] != last_freq {
            rank += 1;
            last_freq = freq[f as usize];
            first = false;
        }
        ocb.set_fun_weight(f, rank * W_DEFAULT_WEIGHT);
    }
}

/// Occurrence counts of every covered symbol in the axioms.
fn symbol_frequencies(ocb: &Ocb, bank: &TermBank, axioms: Option<&ClauseSet>) -> Vec<i64> {
    let mut freq = vec![0i64; (ocb.sig_size() + 1) as usize];
    let Some(axioms) = axioms else {
        return freq;
    };
    for (_, clause) in axioms.iter() {
        for lit in &clause.literals {
            count_symbols(bank, lit.lterm, &mut freq);
            count_symbols(bank, lit.rterm, &mut freq);
        }
    }
    freq
}

fn count_symbols(bank: &TermBank, term: TermRef, freq: &mut Vec<i64>) {
    let cell = bank.cell(term);
    if cell.f_code > 0 && (cell.f_code as usize) < freq.len() {
        freq[cell.f_code as usize] += 1;
    }
    for &arg in &cell.args {
        count_symbols(bank, arg, freq);
    }
}
