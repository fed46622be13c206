/*!
The term bank: hash-consed storage for perfectly shared terms.

Every term of the reasoning context lives in exactly one cell of the bank's
arena; insertion of a structurally equal term returns the existing
reference. Equality of shared terms is reference equality, and the cached
standard weight is computed once, on insertion.

# Garbage collection

The bank collects by mark and sweep. Roots are supplied explicitly at
collection time by anything implementing [GcRoots] --- clause sets, formula
sets --- together with terms pinned through [pin](TermBank::pin). Marking
follows argument vectors, live bindings, and rewrite links; variables and
the propositional constants are always retained. Sweeping removes dead
cells from the arena (invalidating their keys) and rebuilds the
hash-consing buckets.

GC must not run while a term under construction is reachable from nowhere;
pin such terms or finish building first.
*/

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::{
    db::{signature::Signature, var_bank::VarBank},
    misc::log::targets,
    structures::term::{
        DerefKind, TermCell, TermProps, TermRef, RwData, DEFAULT_FWEIGHT, DEFAULT_VWEIGHT,
    },
    types::{FunCode, SortCode, SORT_INDIVIDUAL},
};

use super::signature::{SIG_FALSE_CODE, SIG_TRUE_CODE};

/// A provider of garbage-collection roots.
pub trait GcRoots {
    /// Push every term reference the implementor keeps alive onto `acc`.
    /// Only top references are required; marking walks subterms itself.
    fn collect_root_terms(&self, acc: &mut Vec<TermRef>);
}

impl GcRoots for &[TermRef] {
    fn collect_root_terms(&self, acc: &mut Vec<TermRef>) {
        acc.extend_from_slice(self);
    }
}

/// Hash-consed term storage with a variable pool.
#[derive(Clone, Debug)]
pub struct TermBank {
    cells: SlotMap<TermRef, TermCell>,
    shared: FxHashMap<(FunCode, Box<[TermRef]>), TermRef>,
    /// The variable pool.
    pub vars: VarBank,
    true_term: TermRef,
    false_term: TermRef,
    pinned: Vec<TermRef>,
    insertions: u64,
}

impl TermBank {
    /// A fresh bank holding the propositional constants of `sig`.
    pub fn new(sig: &Signature) -> Self {
        let mut bank = TermBank {
            cells: SlotMap::with_key(),
            shared: FxHashMap::default(),
            vars: VarBank::default(),
            true_term: TermRef::default(),
            false_term: TermRef::default(),
            pinned: Vec::new(),
            insertions: 0,
        };
        bank.true_term = bank.insert(sig, SIG_TRUE_CODE, &[]);
        bank.false_term = bank.insert(sig, SIG_FALSE_CODE, &[]);
        bank
    }

    /// The shared `$true` term.
    pub fn true_term(&self) -> TermRef {
        self.true_term
    }

    /// The shared `$false` term.
    pub fn false_term(&self) -> TermRef {
        self.false_term
    }

    /// The cell of `term`.
    ///
    /// # Panics
    /// If `term` has been collected --- holding a reference across a GC
    /// without rooting it is a programming error.
    pub fn cell(&self, term: TermRef) -> &TermCell {
        self.cells.get(term).expect("dangling term reference")
    }

    /// Mutable access to the cell of `term`.
    pub fn cell_mut(&mut self, term: TermRef) -> &mut TermCell {
        self.cells.get_mut(term).expect("dangling term reference")
    }

    /// True if `term` is a variable.
    pub fn is_var(&self, term: TermRef) -> bool {
        self.cell(term).is_var()
    }

    /// The cached standard weight of `term`.
    pub fn weight(&self, term: TermRef) -> u64 {
        self.cell(term).weight
    }

    /// The number of live cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total insertions performed (shared or fresh).
    pub fn insertions(&self) -> u64 {
        self.insertions
    }

    /// The unique variable cell for `code` (which must be negative),
    /// creating it on first mention.
    pub fn variable(&mut self, code: FunCode) -> TermRef {
        assert!(code < 0, "variable codes are negative");
        if let Some(cell) = self.vars.get(code) {
            return cell;
        }
        let cell = self.cells.insert(TermCell {
            f_code: code,
            args: Vec::new(),
            weight: DEFAULT_VWEIGHT,
            sort: SORT_INDIVIDUAL,
            props: TermProps::default(),
            binding: None,
            rw: RwData::default(),
        });
        self.vars.record(code, cell);
        cell
    }

    /// The next fresh variable by counter. After a counter reset this may
    /// return an existing cell; "fresh" is relative to the codes below the
    /// counter.
    pub fn fresh_var(&mut self) -> TermRef {
        let code = self.vars.next_fresh_code();
        self.variable(code)
    }

    /// Insert `f(args…)`, returning the shared reference. The arguments
    /// must already be shared references into this bank.
    ///
    /// # Panics
    /// If `f_code` is not a positive code of `sig` with arity
    /// `args.len()`.
    pub fn insert(&mut self, sig: &Signature, f_code: FunCode, args: &[TermRef]) -> TermRef {
        assert!(f_code > 0, "applications need a function code");
        assert_eq!(
            sig.arity(f_code),
            args.len(),
            "arity mismatch inserting {}",
            sig.name_of(f_code)
        );
        self.insertions += 1;

        let key = (f_code, args.to_vec().into_boxed_slice());
        if let Some(&shared) = self.shared.get(&key) {
            return shared;
        }

        let weight =
            DEFAULT_FWEIGHT + args.iter().map(|&a| self.cell(a).weight).sum::<u64>();
        let sort = sig.result_sort(f_code);
        let cell = self.cells.insert(TermCell {
            f_code,
            args: args.to_vec(),
            weight,
            sort,
            props: TermProps::default(),
            binding: None,
            rw: RwData::default(),
        });
        self.shared.insert(key, cell);
        cell
    }

    /// Read through the binding of `term` according to `deref`. Returns
    /// the cell to use and the policy to continue with below it.
    pub fn deref(&self, mut term: TermRef, mut deref: DerefKind) -> (TermRef, DerefKind) {
        match deref {
            DerefKind::Never => {}
            DerefKind::Once => {
                let cell = self.cell(term);
                if cell.is_var() {
                    if let Some(bound) = cell.binding {
                        term = bound;
                        deref = DerefKind::Never;
                    }
                }
            }
            DerefKind::Always => {
                while let Some(bound) = self.cell(term).binding {
                    term = bound;
                }
            }
        }
        (term, deref)
    }

    /// Insert a copy of `term` with every variable binding applied
    /// transitively. Unbound variables are kept. Binding cycles are
    /// impossible by construction (bindings are created by matching and
    /// removed on backtracking).
    pub fn insert_instantiated(&mut self, sig: &Signature, term: TermRef) -> TermRef {
        let cell = self.cell(term);
        if cell.is_var() {
            return match cell.binding {
                Some(bound) => self.insert_instantiated(sig, bound),
                None => term,
            };
        }
        if cell.args.is_empty() {
            return term;
        }
        let f_code = cell.f_code;
        let old_args = cell.args.clone();
        let mut args = Vec::with_capacity(old_args.len());
        let mut changed = false;
        for arg in old_args {
            let shared = self.insert_instantiated(sig, arg);
            changed = changed || shared != arg;
            args.push(shared);
        }
        if changed {
            self.insert(sig, f_code, &args)
        } else {
            term
        }
    }

    /// The designated minimum term for a sort: the constant `const_code`
    /// as a shared term.
    pub fn min_term(&mut self, sig: &Signature, const_code: FunCode) -> TermRef {
        self.insert(sig, const_code, &[])
    }

    /// True if the variable `var` occurs in `term` (under `deref`).
    pub fn var_occurs(&self, term: TermRef, var: TermRef, deref: DerefKind) -> bool {
        let (term, deref) = self.deref(term, deref);
        if term == var {
            return true;
        }
        self.cell(term)
            .args
            .iter()
            .any(|&arg| self.var_occurs(arg, var, deref))
    }

    /// True if `term` contains a variable without a binding.
    pub fn has_unbound_vars(&self, term: TermRef) -> bool {
        let cell = self.cell(term);
        if cell.is_var() {
            return match cell.binding {
                Some(bound) => self.has_unbound_vars(bound),
                None => true,
            };
        }
        cell.args.iter().any(|&arg| self.has_unbound_vars(arg))
    }

    /// Collect the distinct unbound variables of `term` in first-occurrence
    /// order.
    pub fn collect_vars(&self, term: TermRef, acc: &mut Vec<TermRef>) {
        let cell = self.cell(term);
        if cell.is_var() {
            match cell.binding {
                Some(bound) => self.collect_vars(bound, acc),
                None => {
                    if !acc.contains(&term) {
                        acc.push(term);
                    }
                }
            }
            return;
        }
        for &arg in &cell.args {
            self.collect_vars(arg, acc);
        }
    }

    /// The most negative variable code occurring in `term`, or 0.
    pub fn min_var_code(&self, term: TermRef) -> FunCode {
        let cell = self.cell(term);
        if cell.is_var() {
            return cell.f_code;
        }
        cell.args
            .iter()
            .map(|&arg| self.min_var_code(arg))
            .min()
            .unwrap_or(0)
    }

    /// A total structural order on shared terms: by standard weight, then
    /// by top function code, then lexicographically on arguments. Used for
    /// literal orientation and clause canonization.
    pub fn structural_cmp(&self, s: TermRef, t: TermRef) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        if s == t {
            return Ordering::Equal;
        }
        let sc = self.cell(s);
        let tc = self.cell(t);
        sc.weight
            .cmp(&tc.weight)
            .then_with(|| sc.f_code.cmp(&tc.f_code))
            .then_with(|| {
                for (&sa, &ta) in sc.args.iter().zip(tc.args.iter()) {
                    match self.structural_cmp(sa, ta) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                Ordering::Equal
            })
    }

    /// Pin `term` as a GC root until [unpin](TermBank::unpin).
    pub fn pin(&mut self, term: TermRef) {
        self.pinned.push(term);
    }

    /// Remove one pin of `term`.
    pub fn unpin(&mut self, term: TermRef) {
        if let Some(at) = self.pinned.iter().rposition(|&t| t == term) {
            self.pinned.swap_remove(at);
        }
    }

    /// Mark and sweep. Returns the number of cells freed.
    pub fn gc(&mut self, roots: &[&dyn GcRoots]) -> usize {
        let mut pending: Vec<TermRef> = Vec::new();
        for provider in roots {
            provider.collect_root_terms(&mut pending);
        }
        pending.extend_from_slice(&self.pinned);
        pending.push(self.true_term);
        pending.push(self.false_term);
        pending.extend(self.vars.cells());

        let mut marked: FxHashSet<TermRef> = FxHashSet::default();
        while let Some(term) = pending.pop() {
            if !marked.insert(term) {
                continue;
            }
            let cell = self.cell(term);
            pending.extend_from_slice(&cell.args);
            if let Some(bound) = cell.binding {
                pending.push(bound);
            }
            if let Some(link) = cell.rw.link {
                pending.push(link.replace);
            }
        }

        let before = self.cells.len();
        self.cells.retain(|key, _| marked.contains(&key));
        self.shared.retain(|_, &mut cell| marked.contains(&cell));
        let freed = before - self.cells.len();
        log::debug!(target: targets::GC, "Swept {freed} of {before} cells.");
        freed
    }
}

/// Convenience constructors used pervasively by tests and drivers.
impl TermBank {
    /// Insert the constant `code`.
    pub fn constant(&mut self, sig: &Signature, code: FunCode) -> TermRef {
        self.insert(sig, code, &[])
    }

    /// The result sort of `term`.
    pub fn sort(&self, term: TermRef) -> SortCode {
        self.cell(term).sort
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Signature, TermBank) {
        let mut sig = Signature::new();
        sig.intern_fun("a", 0).unwrap();
        sig.intern_fun("f", 1).unwrap();
        sig.intern_fun("g", 2).unwrap();
        let bank = TermBank::new(&sig);
        (sig, bank)
    }

    #[test]
    fn insertion_shares() {
        let (sig, mut bank) = setup();
        let a = sig.code_of("a").unwrap();
        let f = sig.code_of("f").unwrap();

        let ta1 = bank.constant(&sig, a);
        let ta2 = bank.constant(&sig, a);
        assert_eq!(ta1, ta2);

        let fa1 = bank.insert(&sig, f, &[ta1]);
        let fa2 = bank.insert(&sig, f, &[ta2]);
        assert_eq!(fa1, fa2);
        assert_ne!(fa1, ta1);
    }

    #[test]
    fn weights_are_cached_bottom_up() {
        let (sig, mut bank) = setup();
        let a = sig.code_of("a").unwrap();
        let g = sig.code_of("g").unwrap();

        let ta = bank.constant(&sig, a);
        let x = bank.variable(-1);
        let gax = bank.insert(&sig, g, &[ta, x]);
        assert_eq!(bank.weight(ta), DEFAULT_FWEIGHT);
        assert_eq!(bank.weight(x), DEFAULT_VWEIGHT);
        assert_eq!(
            bank.weight(gax),
            DEFAULT_FWEIGHT + DEFAULT_FWEIGHT + DEFAULT_VWEIGHT
        );
    }

    #[test]
    fn instantiation_follows_bindings() {
        let (sig, mut bank) = setup();
        let a = sig.code_of("a").unwrap();
        let f = sig.code_of("f").unwrap();

        let ta = bank.constant(&sig, a);
        let x = bank.variable(-1);
        let fx = bank.insert(&sig, f, &[x]);
        let fa = bank.insert(&sig, f, &[ta]);

        bank.cell_mut(x).binding = Some(ta);
        assert_eq!(bank.insert_instantiated(&sig, fx), fa);
        bank.cell_mut(x).binding = None;
        assert_eq!(bank.insert_instantiated(&sig, fx), fx);
    }

    #[test]
    fn gc_retains_roots_and_variables() {
        let (sig, mut bank) = setup();
        let a = sig.code_of("a").unwrap();
        let f = sig.code_of("f").unwrap();

        let ta = bank.constant(&sig, a);
        let fa = bank.insert(&sig, f, &[ta]);
        let ffa = bank.insert(&sig, f, &[fa]);
        let x = bank.variable(-1);

        let roots = [ffa];
        let roots_slice: &[TermRef] = &roots[..];
        let freed = bank.gc(&[&roots_slice]);
        assert_eq!(freed, 0);

        let roots = [fa];
        let roots_slice: &[TermRef] = &roots[..];
        let freed = bank.gc(&[&roots_slice]);
        assert_eq!(freed, 1);
        assert_eq!(bank.cell(fa).args, vec![ta]);
        assert!(bank.vars.get(-1).is_some());
        let _ = x;

        // Re-insertion after the sweep shares with the surviving cell.
        let fa2 = bank.insert(&sig, f, &[ta]);
        assert_eq!(fa, fa2);
    }
}
