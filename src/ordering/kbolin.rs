/*!
The linear Knuth-Bendix ordering (KBO6).

One interleaved traversal computes the weight balance and the per-variable
occurrence balances of both terms while recursing for the lexicographic
comparison. The balance accumulator lives in the
[OCB](crate::ordering::ocb::Ocb) and is reset at the top of every
comparison.

The variable condition is evaluated at the end, from the balances:
`s > t` can only hold if no variable has a negative balance, `s < t` only
if none has a positive one.
*/

use crate::{
    db::term_bank::TermBank,
    ordering::{ocb::Ocb, CompareResult},
    structures::term::{DerefKind, TermRef},
};

/// Compare `s` and `t` in the Knuth-Bendix ordering. Resets and uses the
/// OCB's balance accumulator.
pub fn kbo6_compare(
    ocb: &mut Ocb,
    bank: &TermBank,
    s: TermRef,
    t: TermRef,
    deref_s: DerefKind,
    deref_t: DerefKind,
) -> CompareResult {
    ocb.balance.reset();
    kbo6cmp(ocb, bank, s, t, deref_s, deref_t)
}

/// True if `s > t` in the Knuth-Bendix ordering.
pub fn kbo6_greater(
    ocb: &mut Ocb,
    bank: &TermBank,
    s: TermRef,
    t: TermRef,
    deref_s: DerefKind,
    deref_t: DerefKind,
) -> bool {
    kbo6_compare(ocb, bank, s, t, deref_s, deref_t) == CompareResult::Greater
}

/// Update the balances for a variable met on the left-hand side.
fn inc_vb(ocb: &mut Ocb, bank: &TermBank, var: TermRef) {
    let index = (-bank.cell(var).f_code) as usize;
    ocb.balance.wb += ocb.var_weight;
    let slot = ocb.balance.slot(index);
    if *slot == 0 {
        *slot += 1;
        ocb.balance.pos_bal += 1;
    } else if *slot == -1 {
        *slot += 1;
        ocb.balance.neg_bal -= 1;
    } else {
        *slot += 1;
    }
}

/// Update the balances for a variable met on the right-hand side.
fn dec_vb(ocb: &mut Ocb, bank: &TermBank, var: TermRef) {
    let index = (-bank.cell(var).f_code) as usize;
    ocb.balance.wb -= ocb.var_weight;
    let slot = ocb.balance.slot(index);
    if *slot == 0 {
        *slot -= 1;
        ocb.balance.neg_bal += 1;
    } else if *slot == 1 {
        *slot -= 1;
        ocb.balance.pos_bal -= 1;
    } else {
        *slot -= 1;
    }
}

/// Account for the top cell of `t` (not dereferenced) on the given side.
fn local_vb_update(ocb: &mut Ocb, bank: &TermBank, t: TermRef, lhs: bool) {
    let cell = bank.cell(t);
    if lhs {
        if cell.is_var() {
            inc_vb(ocb, bank, t);
        } else {
            ocb.balance.wb += ocb.fun_weight(cell.f_code);
        }
    } else if cell.is_var() {
        dec_vb(ocb, bank, t);
    } else {
        ocb.balance.wb -= ocb.fun_weight(cell.f_code);
    }
}

/// Accumulate the balances of `t` while checking whether `var` occurs in
/// it.
fn mfyvwbc(
    ocb: &mut Ocb,
    bank: &TermBank,
    t: TermRef,
    deref_t: DerefKind,
    var: TermRef,
    lhs: bool,
) -> bool {
    let (t, deref_t) = bank.deref(t, deref_t);
    local_vb_update(ocb, bank, t, lhs);

    if t == var {
        return true;
    }
    let args = bank.cell(t).args.clone();
    let mut res = false;
    for arg in args {
        res |= mfyvwbc(ocb, bank, arg, deref_t, var, lhs);
    }
    res
}

/// Accumulate the balances of `t`.
fn mfyvwb(ocb: &mut Ocb, bank: &TermBank, t: TermRef, deref_t: DerefKind, lhs: bool) {
    let (t, deref_t) = bank.deref(t, deref_t);
    local_vb_update(ocb, bank, t, lhs);

    // Variables have no arguments, so no separate test is needed.
    let args = bank.cell(t).args.clone();
    for arg in args {
        mfyvwb(ocb, bank, arg, deref_t, lhs);
    }
}

/// Lexicographic comparison of the argument lists of `s` and `t`,
/// accumulating balances for all arguments.
fn kbo6cmplex(
    ocb: &mut Ocb,
    bank: &TermBank,
    s: TermRef,
    t: TermRef,
    deref_s: DerefKind,
    deref_t: DerefKind,
) -> CompareResult {
    let s_args = bank.cell(s).args.clone();
    let t_args = bank.cell(t).args.clone();
    debug_assert_eq!(s_args.len(), t_args.len());

    let mut res = CompareResult::Equal;
    for (&sa, &ta) in s_args.iter().zip(t_args.iter()) {
        if res == CompareResult::Equal {
            res = kbo6cmp(ocb, bank, sa, ta, deref_s, deref_t);
        } else {
            mfyvwb(ocb, bank, sa, deref_s, true);
            mfyvwb(ocb, bank, ta, deref_t, false);
        }
    }
    res
}

fn kbo6cmp(
    ocb: &mut Ocb,
    bank: &TermBank,
    s: TermRef,
    t: TermRef,
    deref_s: DerefKind,
    deref_t: DerefKind,
) -> CompareResult {
    let (mut s, mut deref_s) = bank.deref(s, deref_s);
    let (mut t, mut deref_t) = bank.deref(t, deref_t);

    // Pacman lemma: strip a common spine of equal unary symbols.
    while bank.cell(s).arity() == 1 && bank.cell(s).f_code == bank.cell(t).f_code {
        let sn = bank.cell(s).args[0];
        let tn = bank.cell(t).args[0];
        let (sd, sdk) = bank.deref(sn, deref_s);
        let (td, tdk) = bank.deref(tn, deref_t);
        s = sd;
        deref_s = sdk;
        t = td;
        deref_t = tdk;
    }

    let s_is_var = bank.cell(s).is_var();
    let t_is_var = bank.cell(t).is_var();

    if s_is_var {
        if t_is_var {
            inc_vb(ocb, bank, s);
            dec_vb(ocb, bank, t);
            if s == t {
                CompareResult::Equal
            } else {
                CompareResult::Uncomparable
            }
        } else {
            let contained = mfyvwbc(ocb, bank, t, deref_t, s, false);
            inc_vb(ocb, bank, s);
            if contained {
                CompareResult::Less
            } else {
                CompareResult::Uncomparable
            }
        }
    } else if t_is_var {
        let contained = mfyvwbc(ocb, bank, s, deref_s, t, true);
        dec_vb(ocb, bank, t);
        if contained {
            CompareResult::Greater
        } else {
            CompareResult::Uncomparable
        }
    } else {
        let s_code = bank.cell(s).f_code;
        let t_code = bank.cell(t).f_code;
        let lex = if s_code == t_code {
            kbo6cmplex(ocb, bank, s, t, deref_s, deref_t)
        } else {
            mfyvwb(ocb, bank, s, deref_s, true);
            mfyvwb(ocb, bank, t, deref_t, false);
            CompareResult::Uncomparable
        };

        let g_or_n = if ocb.balance.neg_bal != 0 {
            CompareResult::Uncomparable
        } else {
            CompareResult::Greater
        };
        let l_or_n = if ocb.balance.pos_bal != 0 {
            CompareResult::Uncomparable
        } else {
            CompareResult::Less
        };

        if ocb.balance.wb > 0 {
            g_or_n
        } else if ocb.balance.wb < 0 {
            l_or_n
        } else {
            match ocb.fun_compare(s_code, t_code) {
                CompareResult::Greater => g_or_n,
                CompareResult::Less => l_or_n,
                _ if s_code != t_code => CompareResult::Uncomparable,
                _ => match lex {
                    CompareResult::Equal => CompareResult::Equal,
                    CompareResult::Greater => g_or_n,
                    CompareResult::Less => l_or_n,
                    CompareResult::Uncomparable => CompareResult::Uncomparable,
                },
            }
        }
    }
}
