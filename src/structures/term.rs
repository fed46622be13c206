/*!
Term cells and their attributes.

Terms are perfectly shared: every structurally distinct term is represented
by exactly one cell in a [term bank](crate::db::term_bank::TermBank), and a
[TermRef] --- a generation-checked arena key --- *is* the identity of a term.
Two terms are structurally equal iff their `TermRef`s are equal. This is the
invariant everything downstream (literal comparison, discrimination-tree
matching, rewriting) relies on.

A cell is either a variable (negative function code, no arguments) or an
application `f(t1, …, tn)` whose arguments are themselves shared references.

Cells carry some mutable state beside the immutable structure:
- a *binding* slot, set only between a match/unify and the corresponding
  backtrack (see [Subst](crate::structures::subst::Subst)),
- *rewrite data*: per-level normal-form dates and an optional rewrite link
  to a replacement term,
- property bits used by backward-rewritability marking.
*/

use slotmap::new_key_type;

use crate::types::{Date, FunCode, SortCode, DATE_CREATION};

new_key_type! {
    /// A shared term reference. Key equality is structural term equality.
    pub struct TermRef;
}

/// The standard weight of a variable occurrence.
pub const DEFAULT_VWEIGHT: u64 = 1;

/// The standard weight of a function symbol occurrence.
pub const DEFAULT_FWEIGHT: u64 = 2;

/// Property bits of a term cell.
///
/// The bits record transient facts about a cell discovered during
/// saturation; they are not part of the term's identity.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TermProps(u16);

impl TermProps {
    /// The term is known to be rewritable (at some position) by a current
    /// demodulator.
    pub const IS_REWRITABLE: TermProps = TermProps(1 << 0);

    /// The term is rewritable in restricted contexts as well.
    pub const IS_R_REWRITABLE: TermProps = TermProps(1 << 1);

    /// True if every bit of `prop` is set.
    pub fn has(self, prop: TermProps) -> bool {
        self.0 & prop.0 == prop.0
    }

    /// Set every bit of `prop`.
    pub fn set(&mut self, prop: TermProps) {
        self.0 |= prop.0;
    }

    /// Clear every bit of `prop`.
    pub fn clear(&mut self, prop: TermProps) {
        self.0 &= !prop.0;
    }
}

/// What caused a rewrite link to be added to a cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RwCause {
    /// A top-level rewrite step with the demodulator of the given clause
    /// ident.
    Top {
        /// Ident of the demodulator clause.
        demod: u64,
        /// The demodulator was a set-of-support clause.
        sos: bool,
    },

    /// The term was rewritten at a proper subterm; the replacement is the
    /// re-shared cell with normalized arguments.
    Subterm,
}

/// A rewrite link: this cell has been replaced by `replace`.
#[derive(Clone, Copy, Debug)]
pub struct RwLink {
    /// The replacement term.
    pub replace: TermRef,
    /// Why the link exists.
    pub cause: RwCause,
}

/// Rewrite bookkeeping attached to every cell.
#[derive(Clone, Copy, Debug)]
pub struct RwData {
    /// Normal-form dates, indexed by [RewriteLevel](crate::procedures::rewrite::RewriteLevel)
    /// minus one: `nf_date[0]` for rule-only normal forms, `nf_date[1]` for
    /// full (rules and equations) normal forms.
    pub nf_date: [Date; 2],

    /// Set once the cell has been rewritten; chased by the rewriter.
    pub link: Option<RwLink>,
}

impl Default for RwData {
    fn default() -> Self {
        RwData {
            nf_date: [DATE_CREATION; 2],
            link: None,
        }
    }
}

/// A term cell. Allocated only by the term bank.
#[derive(Clone, Debug)]
pub struct TermCell {
    /// Function code; negative for variables.
    pub f_code: FunCode,

    /// Argument references, already shared. Empty for variables and
    /// constants.
    pub args: Vec<TermRef>,

    /// Cached standard weight: `DEFAULT_VWEIGHT` for a variable, else
    /// `DEFAULT_FWEIGHT` plus the weights of the arguments.
    pub weight: u64,

    /// Result sort: [SORT_BOOL](crate::types::SORT_BOOL) for atoms,
    /// the individual (or an interned) sort otherwise.
    pub sort: SortCode,

    /// Transient property bits.
    pub props: TermProps,

    /// Variable binding, live only between a match and its backtrack.
    /// Always `None` on non-variable cells.
    pub binding: Option<TermRef>,

    /// Rewrite bookkeeping.
    pub rw: RwData,
}

impl TermCell {
    /// True if the cell is a variable.
    pub fn is_var(&self) -> bool {
        self.f_code < 0
    }

    /// The arity of the cell.
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// True if the cell has been rewritten (at the top or at a subterm).
    pub fn is_rewritten(&self) -> bool {
        self.rw.link.is_some()
    }

    /// True if the cell has been rewritten at the top position.
    pub fn is_top_rewritten(&self) -> bool {
        matches!(
            self.rw.link,
            Some(RwLink {
                cause: RwCause::Top { .. },
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn props_set_clear_and_query() {
        let mut props = TermProps::default();
        assert!(!props.has(TermProps::IS_REWRITABLE));
        props.set(TermProps::IS_REWRITABLE);
        props.set(TermProps::IS_R_REWRITABLE);
        assert!(props.has(TermProps::IS_REWRITABLE));
        props.clear(TermProps::IS_REWRITABLE);
        assert!(!props.has(TermProps::IS_REWRITABLE));
        assert!(props.has(TermProps::IS_R_REWRITABLE));
    }
}

/// Read-through policy for variable bindings.
///
/// Matching substitutions bind variables of one term to subterms of
/// another; a comparison that spans the substitution derefs one side
/// `Once` --- after following a binding the policy degrades to `Never`,
/// since the image of a match contains no further bindings of interest.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DerefKind {
    /// Read cells as they are.
    Never,
    /// Follow one binding, then stop.
    Once,
    /// Follow bindings transitively.
    Always,
}
