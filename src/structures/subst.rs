/*!
Substitutions as backtrackable binding trails.

A substitution does not own a mapping of its own: bindings live in the
variable cells of the term bank, and the substitution records which
variables were bound, in order, so that any prefix can be undone. Every
binding made through a [Subst] is undone by a matching
[backtrack](Subst::backtrack_to) --- all exit paths of matching and
discrimination-tree search restore the trail to the snapshot they took on
entry.
*/

use crate::{
    db::term_bank::TermBank,
    structures::term::TermRef,
};

/// A position in the binding trail, taken by [snapshot](Subst::snapshot).
pub type SubstSnapshot = usize;

/// A backtrackable variable-binding trail.
#[derive(Debug, Default)]
pub struct Subst {
    trail: Vec<TermRef>,
}

impl Subst {
    /// An empty substitution.
    pub fn new() -> Self {
        Subst::default()
    }

    /// The number of live bindings.
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    /// True if no bindings are live.
    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// The current trail position, for later backtracking.
    pub fn snapshot(&self) -> SubstSnapshot {
        self.trail.len()
    }

    /// Bind `var` to `term` and record the binding.
    ///
    /// # Panics
    /// If `var` is not an unbound variable.
    pub fn bind(&mut self, bank: &mut TermBank, var: TermRef, term: TermRef) {
        let cell = bank.cell_mut(var);
        assert!(cell.is_var() && cell.binding.is_none());
        cell.binding = Some(term);
        self.trail.push(var);
    }

    /// Undo the most recent binding. Returns false on an empty trail.
    pub fn backtrack_single(&mut self, bank: &mut TermBank) -> bool {
        match self.trail.pop() {
            None => false,
            Some(var) => {
                bank.cell_mut(var).binding = None;
                true
            }
        }
    }

    /// Undo bindings down to `snapshot`.
    pub fn backtrack_to(&mut self, bank: &mut TermBank, snapshot: SubstSnapshot) {
        while self.trail.len() > snapshot {
            self.backtrack_single(bank);
        }
    }

    /// Undo every binding.
    pub fn backtrack(&mut self, bank: &mut TermBank) {
        self.backtrack_to(bank, 0);
    }

    /// True if every live binding maps a variable to a variable,
    /// injectively.
    pub fn is_renaming(&self, bank: &TermBank) -> bool {
        for (i, &var) in self.trail.iter().enumerate() {
            let image = match bank.cell(var).binding {
                Some(image) => image,
                None => return false,
            };
            if !bank.is_var(image) {
                return false;
            }
            for &other in &self.trail[..i] {
                if bank.cell(other).binding == Some(image) {
                    return false;
                }
            }
        }
        true
    }

    /// Bind every unbound variable of `term` to `filler`, recording the
    /// bindings. Used by strong right-hand-side instantiation, with the
    /// designated minimum constant as filler.
    pub fn complete_instance(&mut self, bank: &mut TermBank, term: TermRef, filler: TermRef) {
        let mut vars = Vec::new();
        bank.collect_vars(term, &mut vars);
        for var in vars {
            self.bind(bank, var, filler);
        }
    }
}

/// Extend `subst` to a match of `matcher` onto `to_match`, i.e. a binding
/// of the variables of `matcher` such that the instantiated matcher is
/// identical to `to_match`. On failure the substitution is restored to its
/// state at entry. Variables never match boolean-sorted terms (atoms).
pub fn subst_compute_match(
    bank: &mut TermBank,
    matcher: TermRef,
    to_match: TermRef,
    subst: &mut Subst,
) -> bool {
    let snapshot = subst.snapshot();
    let mut pairs = vec![(matcher, to_match)];

    while let Some((pat, target)) = pairs.pop() {
        let pat_cell = bank.cell(pat);
        if pat_cell.is_var() {
            match pat_cell.binding {
                Some(bound) => {
                    if bound != target {
                        subst.backtrack_to(bank, snapshot);
                        return false;
                    }
                }
                None => {
                    if bank.sort(target) != pat_cell.sort {
                        subst.backtrack_to(bank, snapshot);
                        return false;
                    }
                    subst.bind(bank, pat, target);
                }
            }
            continue;
        }
        let target_cell = bank.cell(target);
        if pat_cell.f_code != target_cell.f_code
            || pat_cell.weight > target_cell.weight
        {
            subst.backtrack_to(bank, snapshot);
            return false;
        }
        for i in 0..pat_cell.args.len() {
            pairs.push((pat_cell.args[i], target_cell.args[i]));
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::signature::Signature;

    #[test]
    fn match_binds_and_backtracks() {
        let mut sig = Signature::new();
        let a = sig.intern_fun("a", 0).unwrap();
        let f = sig.intern_fun("f", 2).unwrap();
        let mut bank = TermBank::new(&sig);

        let ta = bank.constant(&sig, a);
        let x = bank.variable(-1);
        let y = bank.variable(-2);
        let pattern = bank.insert(&sig, f, &[x, y]);
        let target = bank.insert(&sig, f, &[ta, ta]);

        let mut subst = Subst::new();
        assert!(subst_compute_match(&mut bank, pattern, target, &mut subst));
        assert_eq!(bank.cell(x).binding, Some(ta));
        assert_eq!(bank.insert_instantiated(&sig, pattern), target);
        assert!(!subst.is_renaming(&bank));

        subst.backtrack(&mut bank);
        assert_eq!(bank.cell(x).binding, None);
        assert_eq!(bank.cell(y).binding, None);
    }

    #[test]
    fn mismatch_restores_partial_bindings() {
        let mut sig = Signature::new();
        let a = sig.intern_fun("a", 0).unwrap();
        let b = sig.intern_fun("b", 0).unwrap();
        let f = sig.intern_fun("f", 2).unwrap();
        let mut bank = TermBank::new(&sig);

        let ta = bank.constant(&sig, a);
        let tb = bank.constant(&sig, b);
        let x = bank.variable(-1);
        // f(x, x) does not match f(a, b).
        let pattern = bank.insert(&sig, f, &[x, x]);
        let target = bank.insert(&sig, f, &[ta, tb]);

        let mut subst = Subst::new();
        assert!(!subst_compute_match(&mut bank, pattern, target, &mut subst));
        assert!(subst.is_empty());
        assert_eq!(bank.cell(x).binding, None);
    }
}
