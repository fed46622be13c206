/*!
Leftmost-innermost rewriting over shared terms.

Rewriting consults an array of demodulator sets indexed by
[RewriteLevel]: the rule set alone, or rules followed by unorientable
equations. Every rewrite step leaves a *rewrite link* on the replaced
cell, so later encounters of the same shared term chase the chain instead
of searching again, and every term that survives a normalization attempt
is stamped with the demodulators' date --- a term whose stamp is current is
not searched at all.

A matching demodulator is accepted only if its instance is a rewrite
rule: the literal is oriented, or the instantiated left side is greater
than the instantiated right side under the OCB's ordering, with unbound
right-side variables either refusing the match (counted in the
statistics) or, under strong instantiation, bound to the designated
minimal constant of their sort.

# Normal-form caveat

The stamped date records that *this* procedure found no further step, not
that no step exists: a term rewritten below the top by a rule that was
later displaced by an equation may be stamped while an equation step
still applies. Callers that need full normal forms re-normalize when the
demodulator sets change --- exactly what the date comparison triggers.
*/

use crate::{
    context::Statistics,
    db::{
        clause_set::{clause_set_list_max_date, ClauseSet},
        signature::Signature,
        term_bank::TermBank,
    },
    index::pdtree::ClausePos,
    misc::log::targets,
    ordering::ocb::Ocb,
    structures::{
        clause::{Clause, ClauseProps},
        eqn::{Eqn, EqnProps, EqnSide},
        subst::Subst,
        term::{DerefKind, RwCause, RwLink, TermRef},
    },
    types::Date,
};

/// How much rewriting a normalization may use.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd)]
pub enum RewriteLevel {
    /// No rewriting at all.
    NoRewrite,
    /// Oriented rules only.
    RuleOnly,
    /// Rules, then unorientable equations.
    Full,
}

impl RewriteLevel {
    /// How many demodulator sets the level consults.
    pub fn sets(self) -> usize {
        match self {
            RewriteLevel::NoRewrite => 0,
            RewriteLevel::RuleOnly => 1,
            RewriteLevel::Full => 2,
        }
    }

    /// The normal-form date slot of the level.
    ///
    /// # Panics
    /// For [NoRewrite](RewriteLevel::NoRewrite), which stamps nothing.
    pub fn adr(self) -> usize {
        self.sets() - 1
    }
}

struct RwCtx<'a> {
    ocb: &'a mut Ocb,
    sig: &'a mut Signature,
    bank: &'a mut TermBank,
    stats: &'a mut Statistics,
    demod_date: Date,
    level: RewriteLevel,
    prefer_general: bool,
    sos_rewritten: bool,
}

/// Chase top-level rewrite links to the current representative, noting
/// whether any link stems from a set-of-support clause.
fn follow_top_rw_chain(bank: &TermBank, mut term: TermRef, sos_rewritten: &mut bool) -> TermRef {
    while let Some(RwLink {
        replace,
        cause: RwCause::Top { sos, .. },
    }) = bank.cell(term).rw.link
    {
        if sos {
            *sos_rewritten = true;
        }
        term = replace;
    }
    term
}

/// True if `lside → rside` instantiated by the live bindings is a rewrite
/// rule. Assumes the uninstantiated sides are uncomparable. May extend
/// `subst` (kept on success, undone on failure).
fn instance_is_rule(
    ctx: &mut RwCtx,
    lside: TermRef,
    rside: TermRef,
    subst: &mut Subst,
) -> bool {
    let snapshot = subst.snapshot();
    if ctx.ocb.rewrite_strong_rhs_inst {
        let sort = ctx.bank.sort(rside);
        let min_term = ctx.ocb.designated_min_term(ctx.sig, ctx.bank, sort);
        subst.complete_instance(ctx.bank, rside, min_term);
    } else if ctx.bank.has_unbound_vars(rside) {
        ctx.stats.rewrite_unbound_var_fails += 1;
        return false;
    }
    if subst.is_renaming(ctx.bank) {
        subst.backtrack_to(ctx.bank, snapshot);
        return false;
    }
    if ctx
        .ocb
        .greater(ctx.bank, lside, rside, DerefKind::Once, DerefKind::Once)
    {
        true
    } else {
        subst.backtrack_to(ctx.bank, snapshot);
        false
    }
}

/// Search one demodulator set for a rule instance rewriting `term` at the
/// top. On success the accepted position is returned and `subst` holds
/// the match.
fn indexed_find_demodulator(
    ctx: &mut RwCtx,
    set: &mut ClauseSet,
    term: TermRef,
    date: Date,
    subst: &mut Subst,
) -> Option<ClausePos> {
    debug_assert!(!ctx.bank.cell(term).is_top_rewritten());
    ctx.stats.rewrite_attempts += 1;

    let prefer_general = ctx.prefer_general;
    let (clauses, index) = set.demod_parts();
    let index = index.expect("demodulator sets carry an index");

    index.search_init(ctx.bank, term, date, prefer_general);
    let mut found = None;
    while let Some(pos) = index.find_next_demodulator(ctx.bank, subst) {
        let clause = &clauses[pos.clause];
        let eqn = clause.literals[pos.literal];

        // A term already normal with respect to this demodulator's date
        // cannot be rewritten by it.
        let full_nf = ctx.bank.cell(term).rw.nf_date[RewriteLevel::Full.adr()];
        if full_nf >= clause.date {
            continue;
        }

        let accepted = match pos.side {
            EqnSide::Left => {
                eqn.is_oriented() || instance_is_rule(ctx, eqn.lterm, eqn.rterm, subst)
            }
            EqnSide::Right => {
                debug_assert!(!eqn.is_oriented());
                instance_is_rule(ctx, eqn.rterm, eqn.lterm, subst)
            }
        };
        if accepted {
            found = Some(pos);
            break;
        }
    }
    index.search_exit();
    found
}

/// Rewrite `term` at the root with the first accepted rule of `set`.
/// Returns the replacement, or `term` if nothing fired.
fn rewrite_with_clause_set(
    ctx: &mut RwCtx,
    set: &mut ClauseSet,
    term: TermRef,
    date: Date,
) -> TermRef {
    debug_assert!(!ctx.bank.cell(term).is_var());

    let mut subst = Subst::new();
    let found = indexed_find_demodulator(ctx, set, term, date, &mut subst);

    let result = match found {
        None => term,
        Some(pos) => {
            ctx.stats.rewrite_successes += 1;
            let clause = set.get(pos.clause);
            let eqn = clause.literals[pos.literal];
            let replacement_side = match pos.side {
                EqnSide::Left => eqn.rterm,
                EqnSide::Right => eqn.lterm,
            };
            let demod = clause.ident;
            let sos = clause.props.has(ClauseProps::SOS);

            let replacement = ctx.bank.insert_instantiated(ctx.sig, replacement_side);
            ctx.bank.cell_mut(term).rw.link = Some(RwLink {
                replace: replacement,
                cause: RwCause::Top { demod, sos },
            });
            log::trace!(target: targets::REWRITE,
                "Rewrote a term at the top with demodulator {demod}.");
            replacement
        }
    };
    subst.backtrack(ctx.bank);
    result
}

/// Try a top-level step through the demodulator sets the level admits,
/// rules before equations.
fn rewrite_with_clause_setlist(
    ctx: &mut RwCtx,
    demods: &mut [&mut ClauseSet],
    term: TermRef,
) -> TermRef {
    debug_assert!(ctx.level != RewriteLevel::NoRewrite);
    let nf_slot = ctx.level.adr();
    for at in 0..ctx.level.sets() {
        let nf_date = ctx.bank.cell(term).rw.nf_date[nf_slot];
        if nf_date < demods[at].date {
            let result = rewrite_with_clause_set(ctx, &mut *demods[at], term, nf_date);
            if result != term {
                return result;
            }
        }
    }
    term
}

/// Compute the leftmost-innermost normal form of `term` (see the module
/// documentation for the exact contract).
fn term_li_normalform(
    ctx: &mut RwCtx,
    demods: &mut [&mut ClauseSet],
    term: TermRef,
) -> TermRef {
    if ctx.level == RewriteLevel::NoRewrite {
        return term;
    }
    let mut term = {
        let mut sos = ctx.sos_rewritten;
        let chased = follow_top_rw_chain(ctx.bank, term, &mut sos);
        ctx.sos_rewritten = sos;
        chased
    };
    debug_assert!(!ctx.bank.cell(term).is_top_rewritten());

    {
        let cell = ctx.bank.cell(term);
        if !cell.is_rewritten() && cell.rw.nf_date[ctx.level.adr()] >= ctx.demod_date {
            return term;
        }
        if cell.is_var() {
            debug_assert!(!cell.is_rewritten());
            return term;
        }
    }

    let mut modified = true;
    while modified {
        modified = false;

        // Normalize the arguments, re-sharing the cell if any moved.
        let cell = ctx.bank.cell(term);
        let f_code = cell.f_code;
        let args = cell.args.clone();
        let mut new_args = Vec::with_capacity(args.len());
        let mut child_moved = false;
        for &arg in &args {
            let normal = term_li_normalform(ctx, demods, arg);
            child_moved = child_moved || normal != arg;
            new_args.push(normal);
        }
        if child_moved {
            let new_term = ctx.bank.insert(ctx.sig, f_code, &new_args);
            debug_assert_ne!(new_term, term);
            ctx.bank.cell_mut(term).rw.link = Some(RwLink {
                replace: new_term,
                cause: RwCause::Subterm,
            });
            term = new_term;
            modified = true;
        }

        // A step at the top, then chase whatever chain now exists.
        if !ctx.bank.cell(term).is_var() {
            if !ctx.bank.cell(term).is_top_rewritten() {
                rewrite_with_clause_setlist(ctx, demods, term);
            }
            let mut sos = ctx.sos_rewritten;
            let new_term = follow_top_rw_chain(ctx.bank, term, &mut sos);
            ctx.sos_rewritten = sos;
            modified = modified || new_term != term;
            term = new_term;
        }
    }

    if !ctx.bank.cell(term).is_rewritten() {
        let demod_date = ctx.demod_date;
        let cell = ctx.bank.cell_mut(term);
        cell.rw.nf_date[RewriteLevel::RuleOnly.adr()] = demod_date;
        if ctx.level == RewriteLevel::Full {
            cell.rw.nf_date[RewriteLevel::Full.adr()] = demod_date;
        }
    }
    term
}

/// Normalize both sides of a literal. Clears the literal's
/// maximality-current flag when a side that decides maximality moved.
/// Returns whether the literal changed.
fn eqn_li_normalform(ctx: &mut RwCtx, demods: &mut [&mut ClauseSet], eqn: &mut Eqn) -> bool {
    let l_old = eqn.lterm;
    eqn.lterm = term_li_normalform(ctx, demods, l_old);
    if l_old != eqn.lterm {
        eqn.props.clear(EqnProps::MAX_UP_TO_DATE);
    }

    let r_old = eqn.rterm;
    eqn.rterm = term_li_normalform(ctx, demods, r_old);
    if r_old != eqn.rterm && !eqn.is_oriented() {
        eqn.props.clear(EqnProps::MAX_UP_TO_DATE);
    }

    l_old != eqn.lterm || r_old != eqn.rterm
}

/// Compute the leftmost-innermost normal form of `term` with respect to
/// `demods` up to `level`.
pub fn term_compute_li_normalform(
    ocb: &mut Ocb,
    sig: &mut Signature,
    bank: &mut TermBank,
    stats: &mut Statistics,
    term: TermRef,
    demods: &mut [&mut ClauseSet],
    level: RewriteLevel,
    prefer_general: bool,
) -> TermRef {
    let mut ctx = RwCtx {
        ocb: &mut *ocb,
        sig: &mut *sig,
        bank: &mut *bank,
        stats: &mut *stats,
        demod_date: clause_set_list_max_date(demods, level.sets()),
        level,
        prefer_general,
        sos_rewritten: false,
    };
    term_li_normalform(&mut ctx, demods, term)
}

/// Normalize every term of every literal of `clause`. Sets the clause's
/// set-of-support bit if a set-of-support rule fired, clears Initial and
/// refreshes the cached weight when anything changed. Returns whether the
/// clause changed.
pub fn clause_compute_li_normalform(
    ocb: &mut Ocb,
    sig: &mut Signature,
    bank: &mut TermBank,
    stats: &mut Statistics,
    clause: &mut Clause,
    demods: &mut [&mut ClauseSet],
    level: RewriteLevel,
    prefer_general: bool,
) -> bool {
    debug_assert!(
        !clause.props.has(ClauseProps::D_INDEXED) && !clause.props.has(ClauseProps::S_INDEXED)
    );
    let mut ctx = RwCtx {
        ocb: &mut *ocb,
        sig: &mut *sig,
        bank: &mut *bank,
        stats: &mut *stats,
        demod_date: clause_set_list_max_date(demods, level.sets()),
        level,
        prefer_general,
        sos_rewritten: false,
    };

    let mut changed = false;
    let mut literals = std::mem::take(&mut clause.literals);
    for lit in &mut literals {
        changed |= eqn_li_normalform(&mut ctx, demods, lit);
    }
    clause.literals = literals;

    if ctx.sos_rewritten {
        clause.props.set(ClauseProps::SOS);
    }
    if changed {
        clause.props.clear(ClauseProps::INITIAL);
        clause.recompute_weight(bank);
    }
    changed
}

/// Normalize every clause of `set`. Returns the number of clauses
/// changed.
pub fn clause_set_compute_li_normalform(
    ocb: &mut Ocb,
    sig: &mut Signature,
    bank: &mut TermBank,
    stats: &mut Statistics,
    set: &mut ClauseSet,
    demods: &mut [&mut ClauseSet],
    level: RewriteLevel,
    prefer_general: bool,
) -> usize {
    let refs: Vec<_> = set.refs().collect();
    let mut rewritten = 0;
    for cref in refs {
        let changed = clause_compute_li_normalform(
            ocb,
            sig,
            bank,
            stats,
            set.get_mut(cref),
            demods,
            level,
            prefer_general,
        );
        if changed {
            rewritten += 1;
        }
    }
    rewritten
}
