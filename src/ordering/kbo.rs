/*!
The textbook Knuth-Bendix ordering.

The refined definition implemented here:

`s >KBO t` iff `Var(s, x) >= Var(t, x)` for every variable `x`, and
- `w(s) > w(t)`, or
- `w(s) = w(t)` and `Head(s) > Head(t)`, or
- `w(s) = w(t)`, `Head(s) = Head(t)`, and the argument lists compare
  greater lexicographically,

where `Var(r, x)` counts the occurrences of `x` in `r`. Variable-against-
term comparisons reduce to the subterm relation.

This engine recomputes weights and occurrence counts per comparison; the
[linear variant](crate::ordering::kbolin) folds them into one traversal.
Both must agree, and the test suite compares them on random term pairs.
*/

use rustc_hash::FxHashMap;

use crate::{
    db::term_bank::TermBank,
    ordering::{ocb::Ocb, CompareResult},
    structures::term::{DerefKind, TermRef},
};

/// Compare `s` and `t` in the Knuth-Bendix ordering.
pub fn kbo_compare(
    ocb: &Ocb,
    bank: &TermBank,
    s: TermRef,
    t: TermRef,
    deref_s: DerefKind,
    deref_t: DerefKind,
) -> CompareResult {
    let (s, deref_s) = bank.deref(s, deref_s);
    let (t, deref_t) = bank.deref(t, deref_t);

    if bank.cell(s).is_var() || bank.cell(t).is_var() {
        return compare_vars(bank, s, t, deref_s, deref_t);
    }

    let ws = term_weight(ocb, bank, s, deref_s);
    let wt = term_weight(ocb, bank, t, deref_t);

    let mut occ_s = FxHashMap::default();
    let mut occ_t = FxHashMap::default();
    var_occurrences(bank, s, deref_s, &mut occ_s);
    var_occurrences(bank, t, deref_t, &mut occ_t);
    let ge_vars = dominates(&occ_s, &occ_t);
    let le_vars = dominates(&occ_t, &occ_s);

    let greater_if = |cond: bool| {
        if cond {
            CompareResult::Greater
        } else {
            CompareResult::Uncomparable
        }
    };
    let less_if = |cond: bool| {
        if cond {
            CompareResult::Less
        } else {
            CompareResult::Uncomparable
        }
    };

    if ws > wt {
        return greater_if(ge_vars);
    }
    if ws < wt {
        return less_if(le_vars);
    }

    let s_code = bank.cell(s).f_code;
    let t_code = bank.cell(t).f_code;
    match ocb.fun_compare(s_code, t_code) {
        CompareResult::Greater => greater_if(ge_vars),
        CompareResult::Less => less_if(le_vars),
        CompareResult::Uncomparable => CompareResult::Uncomparable,
        CompareResult::Equal => {
            let s_args = bank.cell(s).args.clone();
            let t_args = bank.cell(t).args.clone();
            for (&sa, &ta) in s_args.iter().zip(t_args.iter()) {
                match kbo_compare(ocb, bank, sa, ta, deref_s, deref_t) {
                    CompareResult::Equal => continue,
                    CompareResult::Greater => return greater_if(ge_vars),
                    CompareResult::Less => return less_if(le_vars),
                    CompareResult::Uncomparable => return CompareResult::Uncomparable,
                }
            }
            CompareResult::Equal
        }
    }
}

/// Comparison when at least one side is a variable: equality, or the
/// subterm relation, or nothing.
fn compare_vars(
    bank: &TermBank,
    s: TermRef,
    t: TermRef,
    deref_s: DerefKind,
    deref_t: DerefKind,
) -> CompareResult {
    if bank.cell(t).is_var() {
        if s == t {
            CompareResult::Equal
        } else if bank.var_occurs(s, t, deref_s) {
            CompareResult::Greater
        } else {
            CompareResult::Uncomparable
        }
    } else {
        debug_assert!(bank.cell(s).is_var());
        if bank.var_occurs(t, s, deref_t) {
            CompareResult::Less
        } else {
            CompareResult::Uncomparable
        }
    }
}

/// The KBO weight of `t`: symbol weight plus argument weights.
fn term_weight(ocb: &Ocb, bank: &TermBank, t: TermRef, deref: DerefKind) -> i64 {
    let (t, deref) = bank.deref(t, deref);
    let cell = bank.cell(t);
    let mut weight = ocb.fun_weight(cell.f_code);
    for &arg in &cell.args {
        weight += term_weight(ocb, bank, arg, deref);
    }
    weight
}

/// Count variable occurrences in `t` into `occ`.
fn var_occurrences(
    bank: &TermBank,
    t: TermRef,
    deref: DerefKind,
    occ: &mut FxHashMap<TermRef, i64>,
) {
    let (t, deref) = bank.deref(t, deref);
    let cell = bank.cell(t);
    if cell.is_var() {
        *occ.entry(t).or_insert(0) += 1;
        return;
    }
    for &arg in &cell.args {
        var_occurrences(bank, arg, deref, occ);
    }
}

/// True if `left` counts at least `right` everywhere.
fn dominates(left: &FxHashMap<TermRef, i64>, right: &FxHashMap<TermRef, i64>) -> bool {
    right
        .iter()
        .all(|(var, &count)| left.get(var).copied().unwrap_or(0) >= count)
}
