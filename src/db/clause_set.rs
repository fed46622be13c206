/*!
Clause sets.

A clause set owns its clauses (in a keyed arena, iterated in insertion
order), tracks the total literal count and the largest creation date of its
members, and may carry a demodulator index: a
[perfect discrimination tree](crate::index::pdtree::PdTree) over the
maximal sides of its positive unit equations. Sets with an index are what
the [rewriter](crate::procedures::rewrite) consumes.

Sets are garbage-collection roots: see
[GcRoots](crate::db::term_bank::GcRoots).
*/

use slotmap::{new_key_type, SlotMap};

use crate::{
    db::term_bank::{GcRoots, TermBank},
    index::pdtree::{ClausePos, PdTree},
    misc::log::targets,
    structures::{
        clause::{Clause, ClauseProps},
        eqn::EqnSide,
        term::TermRef,
    },
    types::{Date, DATE_CREATION},
};

new_key_type! {
    /// A key of a clause within one clause set.
    pub struct ClauseRef;
}

/// An insertion-ordered, optionally indexed clause store.
#[derive(Debug, Default)]
pub struct ClauseSet {
    clauses: SlotMap<ClauseRef, Clause>,
    order: Vec<ClauseRef>,
    /// Total number of literals over all member clauses.
    pub literal_count: u64,
    /// The largest creation date of any member, the "date" of the set as a
    /// demodulator collection.
    pub date: Date,
    /// The demodulator index, if this set serves as a rewrite-rule set.
    pub demod_index: Option<PdTree>,
}

impl ClauseSet {
    /// An empty, unindexed set.
    pub fn new() -> Self {
        ClauseSet::default()
    }

    /// An empty set with a demodulator index attached.
    pub fn with_demod_index() -> Self {
        ClauseSet {
            demod_index: Some(PdTree::new()),
            ..ClauseSet::default()
        }
    }

    /// Number of member clauses.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The clause behind `cref`.
    pub fn get(&self, cref: ClauseRef) -> &Clause {
        &self.clauses[cref]
    }

    /// Mutable access to the clause behind `cref`.
    pub fn get_mut(&mut self, cref: ClauseRef) -> &mut Clause {
        &mut self.clauses[cref]
    }

    /// The member keys in insertion (or, after canonization, sorted)
    /// order.
    pub fn refs(&self) -> impl Iterator<Item = ClauseRef> + '_ {
        self.order.iter().copied()
    }

    /// The members in order.
    pub fn iter(&self) -> impl Iterator<Item = (ClauseRef, &Clause)> {
        self.order.iter().map(move |&cref| (cref, &self.clauses[cref]))
    }

    /// Insert `clause`, indexing it as a demodulator if the set carries an
    /// index and the clause is a positive unit equation. Returns the
    /// clause's key.
    pub fn insert(&mut self, bank: &TermBank, clause: Clause) -> ClauseRef {
        self.literal_count += clause.lit_count() as u64;
        self.date = self.date.max(clause.date);
        let date = clause.date;
        let demod = clause.is_demodulator();
        let oriented = demod && clause.literals[0].is_oriented();
        let (lterm, rterm) = if demod {
            (clause.literals[0].lterm, clause.literals[0].rterm)
        } else {
            (TermRef::default(), TermRef::default())
        };

        let cref = self.clauses.insert(clause);
        self.order.push(cref);

        if let Some(index) = &mut self.demod_index {
            if demod {
                index.insert(
                    bank,
                    lterm,
                    date,
                    ClausePos {
                        clause: cref,
                        literal: 0,
                        side: EqnSide::Left,
                    },
                );
                if !oriented {
                    index.insert(
                        bank,
                        rterm,
                        date,
                        ClausePos {
                            clause: cref,
                            literal: 0,
                            side: EqnSide::Right,
                        },
                    );
                }
                self.clauses[cref].props.set(ClauseProps::D_INDEXED);
                log::trace!(target: targets::CLAUSE_SET,
                    "Indexed demodulator {}.", self.clauses[cref].ident);
            }
        }
        cref
    }

    /// Remove and return the clause behind `cref`, unindexing it first.
    pub fn extract(&mut self, bank: &TermBank, cref: ClauseRef) -> Option<Clause> {
        if !self.clauses.contains_key(cref) {
            return None;
        }
        if self.clauses[cref].props.has(ClauseProps::D_INDEXED) {
            let lit = self.clauses[cref].literals[0];
            if let Some(index) = &mut self.demod_index {
                index.delete(bank, &self.clauses, lit.lterm, cref);
                if !lit.is_oriented() {
                    index.delete(bank, &self.clauses, lit.rterm, cref);
                }
            }
            self.clauses[cref].props.clear(ClauseProps::D_INDEXED);
        }
        let clause = self.clauses.remove(cref)?;
        self.literal_count -= clause.lit_count() as u64;
        if let Some(at) = self.order.iter().position(|&c| c == cref) {
            self.order.remove(at);
        }
        Some(clause)
    }

    /// Remove resolved and duplicate literals from every member. Returns
    /// the number of literals removed.
    ///
    /// Only meaningful for unindexed sets (the demodulator index stores
    /// positions into literals).
    pub fn remove_superfluous_literals(&mut self, bank: &TermBank) -> u64 {
        debug_assert!(self.demod_index.is_none());
        let mut removed = 0;
        for &cref in &self.order {
            removed += self.clauses[cref].remove_superfluous_literals(bank) as u64;
        }
        self.literal_count -= removed;
        removed
    }

    /// Canonize the set: remove superfluous literals, canonize every
    /// member, and sort the members by the canonical clause order.
    pub fn canonize(&mut self, bank: &TermBank) {
        debug_assert!(self.demod_index.is_none());
        let mut removed = 0;
        for &cref in &self.order {
            let clause = &mut self.clauses[cref];
            removed += clause.remove_superfluous_literals(bank) as u64;
            clause.canonize(bank);
        }
        self.literal_count -= removed;

        let ClauseSet { clauses, order, .. } = self;
        order.sort_by(|&a, &b| clauses[a].struct_weight_compare(bank, &clauses[b]));
    }

    /// Split borrow of the clause arena and the demodulator index, for
    /// the rewriter's search loop.
    pub fn demod_parts(&mut self) -> (&SlotMap<ClauseRef, Clause>, Option<&mut PdTree>) {
        (&self.clauses, self.demod_index.as_mut())
    }
}

impl GcRoots for ClauseSet {
    fn collect_root_terms(&self, acc: &mut Vec<TermRef>) {
        for (_, clause) in self.iter() {
            for lit in &clause.literals {
                acc.push(lit.lterm);
                acc.push(lit.rterm);
            }
        }
    }
}

/// The largest date over a prefix of demodulator sets, the freshness bound
/// the rewriter compares normal-form dates against.
pub fn clause_set_list_max_date(demodulators: &[&mut ClauseSet], level: usize) -> Date {
    demodulators
        .iter()
        .take(level)
        .map(|set| set.date)
        .max()
        .unwrap_or(DATE_CREATION)
}
