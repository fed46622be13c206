/*!
Perfect discrimination trees.

A PDT is a trie over the left-to-right traversal of terms: every path from
the root to a leaf spells the LR flattening of exactly one indexed term,
with variables identified by their index. Leaves carry the clause
positions of the demodulators whose matched side spells the path.

Two constraints prune search at every node:
- *size*: the smallest standard weight of any term indexed at or below the
  node --- a lighter query cannot be matched by anything there;
- *age*: the largest creation date of any clause indexed at or below ---
  a query whose normal-form date is not older has already seen every rule
  there.

# Search protocol

Search is stateful and follows an acquire-release discipline:
[search_init](PdTree::search_init) seeds the traversal,
[find_next_demodulator](PdTree::find_next_demodulator) steps the machine to
the next matching entry (extending the caller's substitution with the
bindings of the match), and [search_exit](PdTree::search_exit) releases the
iterator. The substitution is *not* unwound by `search_exit`: a caller that
accepts a match instantiates through it first and backtracks afterwards.

With `prefer_general`, variable alternatives are tried before function
alternatives, so more general rules surface first.
*/

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::{
    db::clause_set::ClauseRef,
    misc::log::targets,
    structures::{
        clause::Clause,
        eqn::EqnSide,
        subst::Subst,
        term::TermRef,
    },
    db::term_bank::TermBank,
    types::{Date, FunCode, DATE_CREATION, SORT_BOOL},
};

new_key_type! {
    /// A node key within one tree.
    struct PdtNodeRef;
}

/// A position of one side of one literal of a clause, the payload stored
/// at tree leaves.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClausePos {
    /// The clause, keyed within its owning set.
    pub clause: ClauseRef,
    /// The literal index within the clause.
    pub literal: usize,
    /// The side of the literal.
    pub side: EqnSide,
}

/// How a node hangs off its parent.
#[derive(Clone, Copy, Debug)]
enum ChildKey {
    Fun(FunCode),
    Var(usize),
}

#[derive(Debug)]
struct PdtNode {
    f_alternatives: FxHashMap<FunCode, PdtNodeRef>,
    v_alternatives: Vec<Option<PdtNodeRef>>,
    max_var: i64,
    size_constr: u64,
    age_constr: Date,
    parent: Option<PdtNodeRef>,
    from: Option<ChildKey>,
    ref_count: usize,
    entries: Vec<ClausePos>,
    // Traversal state, meaningful only during a search.
    trav_count: i64,
    variable: Option<TermRef>,
    bound: bool,
}

impl PdtNode {
    fn new(parent: Option<PdtNodeRef>, from: Option<ChildKey>) -> Self {
        PdtNode {
            f_alternatives: FxHashMap::default(),
            v_alternatives: Vec::new(),
            max_var: 0,
            size_constr: u64::MAX,
            age_constr: DATE_CREATION,
            parent,
            from,
            ref_count: 0,
            entries: Vec::new(),
            trav_count: 0,
            variable: None,
            bound: false,
        }
    }
}

/// A perfect discrimination tree over demodulator sides.
#[derive(Debug)]
pub struct PdTree {
    nodes: SlotMap<PdtNodeRef, PdtNode>,
    root: PdtNodeRef,

    // Search state.
    term_stack: Vec<TermRef>,
    term_proc: Vec<TermRef>,
    tree_pos: Option<PdtNodeRef>,
    term: Option<TermRef>,
    term_date: Date,
    term_weight: u64,
    prefer_general: bool,
    store_active: bool,
    store_cursor: usize,

    clause_count: u64,
    node_count: u64,
    match_count: u64,
    visited_count: u64,
}

impl Default for PdTree {
    fn default() -> Self {
        PdTree::new()
    }
}

/// Initialize `stack` for an LR traversal of `term`.
fn lr_traverse_init(stack: &mut Vec<TermRef>, term: TermRef) {
    stack.clear();
    stack.push(term);
}

/// The next term node in LR order, or `None` when the traversal is
/// complete.
fn lr_traverse_next(bank: &TermBank, stack: &mut Vec<TermRef>) -> Option<TermRef> {
    let term = stack.pop()?;
    for &arg in bank.cell(term).args.iter().rev() {
        stack.push(arg);
    }
    Some(term)
}

/// Undo an [lr_traverse_next] by replacing `term`'s arguments on the stack
/// with `term` itself.
fn lr_traverse_prev(bank: &TermBank, stack: &mut Vec<TermRef>, term: TermRef) {
    for _ in 0..bank.cell(term).arity() {
        let popped = stack.pop();
        debug_assert!(popped.is_some());
    }
    stack.push(term);
}

impl PdTree {
    /// An empty tree.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(PdtNode::new(None, None));
        PdTree {
            nodes,
            root,
            term_stack: Vec::new(),
            term_proc: Vec::new(),
            tree_pos: None,
            term: None,
            term_date: DATE_CREATION,
            term_weight: u64::MAX,
            prefer_general: false,
            store_active: false,
            store_cursor: 0,
            clause_count: 0,
            node_count: 1,
            match_count: 0,
            visited_count: 0,
        }
    }

    /// Number of stored clause positions.
    pub fn entry_count(&self) -> u64 {
        self.clause_count
    }

    /// Number of nodes.
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// A rough estimate of the memory held by the tree, in bytes.
    pub fn storage_estimate(&self) -> u64 {
        self.node_count * std::mem::size_of::<PdtNode>() as u64
            + self.clause_count * std::mem::size_of::<ClausePos>() as u64
    }

    /// Number of searches initialized against the tree.
    pub fn match_count(&self) -> u64 {
        self.match_count
    }

    /// Number of nodes entered across all searches.
    pub fn visited_count(&self) -> u64 {
        self.visited_count
    }

    fn init_val(&self) -> i64 {
        self.prefer_general as i64
    }

    fn closed(&self, node: PdtNodeRef) -> i64 {
        self.nodes[node].max_var + 1 + self.prefer_general as i64
    }

    /// Insert the demodulator side `term` (belonging to a clause created
    /// at `date`) with payload `pos`.
    pub fn insert(&mut self, bank: &TermBank, term: TermRef, date: Date, pos: ClausePos) {
        let term_weight = bank.weight(term);
        let mut stack = std::mem::take(&mut self.term_stack);
        lr_traverse_init(&mut stack, term);

        let mut node = self.root;
        self.touch_on_insert(node, term_weight, date);

        while let Some(curr) = lr_traverse_next(bank, &mut stack) {
            let cell = bank.cell(curr);
            let next = if cell.is_var() {
                let index = (-cell.f_code) as usize;
                if self.nodes[node].v_alternatives.len() <= index {
                    self.nodes[node].v_alternatives.resize(index + 1, None);
                }
                match self.nodes[node].v_alternatives[index] {
                    Some(next) => next,
                    None => {
                        let fresh = self
                            .nodes
                            .insert(PdtNode::new(Some(node), Some(ChildKey::Var(index))));
                        self.nodes[fresh].variable = Some(curr);
                        self.nodes[node].v_alternatives[index] = Some(fresh);
                        self.nodes[node].max_var = self.nodes[node].max_var.max(index as i64);
                        self.node_count += 1;
                        fresh
                    }
                }
            } else {
                match self.nodes[node].f_alternatives.get(&cell.f_code) {
                    Some(&next) => next,
                    None => {
                        let f_code = cell.f_code;
                        let fresh = self
                            .nodes
                            .insert(PdtNode::new(Some(node), Some(ChildKey::Fun(f_code))));
                        self.nodes[node].f_alternatives.insert(f_code, fresh);
                        self.node_count += 1;
                        fresh
                    }
                }
            };
            node = next;
            self.touch_on_insert(node, term_weight, date);
        }

        self.nodes[node].entries.push(pos);
        self.clause_count += 1;
        self.term_stack = stack;
        log::trace!(target: targets::PDT, "Inserted rule side, {} entries.", self.clause_count);
    }

    fn touch_on_insert(&mut self, node: PdtNodeRef, term_weight: u64, date: Date) {
        let node = &mut self.nodes[node];
        node.size_constr = node.size_constr.min(term_weight);
        node.age_constr = node.age_constr.max(date);
        node.ref_count += 1;
    }

    /// Delete every entry of `clause` indexed under `term`. Returns the
    /// number of entries removed; deletion of an absent entry is refused
    /// by returning 0.
    pub fn delete(
        &mut self,
        bank: &TermBank,
        clauses: &SlotMap<ClauseRef, Clause>,
        term: TermRef,
        clause: ClauseRef,
    ) -> usize {
        let mut stack = std::mem::take(&mut self.term_stack);
        lr_traverse_init(&mut stack, term);

        let mut path = vec![self.root];
        let mut node = self.root;
        while let Some(curr) = lr_traverse_next(bank, &mut stack) {
            let cell = bank.cell(curr);
            let next = if cell.is_var() {
                let index = (-cell.f_code) as usize;
                self.nodes[node]
                    .v_alternatives
                    .get(index)
                    .copied()
                    .flatten()
            } else {
                self.nodes[node].f_alternatives.get(&cell.f_code).copied()
            };
            match next {
                None => {
                    self.term_stack = stack;
                    return 0;
                }
                Some(next) => {
                    node = next;
                    path.push(next);
                }
            }
        }
        self.term_stack = stack;

        let leaf = node;
        let before = self.nodes[leaf].entries.len();
        self.nodes[leaf].entries.retain(|pos| pos.clause != clause);
        let removed = before - self.nodes[leaf].entries.len();
        if removed == 0 {
            return 0;
        }
        self.clause_count -= removed as u64;

        let mut constr_change = true;
        for at in (0..path.len()).rev() {
            let node = path[at];
            self.nodes[node].ref_count -= removed;
            if self.nodes[node].ref_count == 0 && at > 0 {
                let freed = self.nodes.remove(node).expect("node on path");
                let parent = path[at - 1];
                match freed.from.expect("non-root nodes record their child key") {
                    ChildKey::Fun(f_code) => {
                        self.nodes[parent].f_alternatives.remove(&f_code);
                    }
                    ChildKey::Var(index) => {
                        self.nodes[parent].v_alternatives[index] = None;
                    }
                }
                self.node_count -= 1;
            } else if constr_change {
                constr_change = self.recompute_node_constraints(node, clauses);
            }
        }
        log::trace!(target: targets::PDT, "Deleted {removed} entries.");
        removed
    }

    /// Recompute the size and age constraints (and `max_var`) of `node`
    /// from its entries or surviving children. Returns true if a
    /// constraint changed.
    fn recompute_node_constraints(
        &mut self,
        node: PdtNodeRef,
        clauses: &SlotMap<ClauseRef, Clause>,
    ) -> bool {
        let mut new_age = DATE_CREATION;
        let mut new_size = u64::MAX;
        let mut new_max_var = 0i64;

        {
            let cell = &self.nodes[node];
            if !cell.entries.is_empty() {
                for entry in &cell.entries {
                    new_age = new_age.max(clauses[entry.clause].date);
                }
                // A leaf's size constraint is fixed by its indexed terms.
                new_size = cell.size_constr;
                new_max_var = cell.max_var;
            } else {
                for &child in cell.f_alternatives.values() {
                    new_age = new_age.max(self.nodes[child].age_constr);
                    new_size = new_size.min(self.nodes[child].size_constr);
                }
                for (index, slot) in cell.v_alternatives.iter().enumerate() {
                    if let Some(child) = *slot {
                        new_age = new_age.max(self.nodes[child].age_constr);
                        new_size = new_size.min(self.nodes[child].size_constr);
                        new_max_var = index as i64;
                    }
                }
            }
        }

        let cell = &mut self.nodes[node];
        let changed = new_age != cell.age_constr || new_size != cell.size_constr;
        cell.age_constr = new_age;
        cell.size_constr = new_size;
        cell.max_var = new_max_var;
        changed
    }

    /// Seed a search for indexed terms matching onto `term`. Only clauses
    /// strictly younger than `age_constr` can answer --- pass the query
    /// term's normal-form date to skip rules it has already been
    /// normalized against.
    ///
    /// # Panics
    /// If a search is already active (release it with
    /// [search_exit](PdTree::search_exit)).
    pub fn search_init(
        &mut self,
        bank: &TermBank,
        term: TermRef,
        age_constr: Date,
        prefer_general: bool,
    ) {
        assert!(self.term.is_none(), "PDT search already active");
        lr_traverse_init(&mut self.term_stack, term);
        self.term_proc.clear();
        self.tree_pos = Some(self.root);
        self.prefer_general = prefer_general;
        self.term = Some(term);
        self.term_date = age_constr;
        self.term_weight = bank.weight(term);
        self.store_active = false;
        self.store_cursor = 0;
        self.match_count += 1;
        let init = self.init_val();
        self.nodes[self.root].trav_count = init;
    }

    /// Release the search state.
    pub fn search_exit(&mut self) {
        debug_assert!(self.term.is_some());
        self.term = None;
        self.tree_pos = None;
        self.store_active = false;
    }

    /// True while the query's weight and date admit terms at or below the
    /// current node.
    fn verify_node_constr(&self) -> bool {
        let node = &self.nodes[self.tree_pos.expect("active search")];
        if self.term_weight < node.size_constr {
            return false;
        }
        self.term_date < node.age_constr
    }

    /// Find the next open alternative below the current node and advance
    /// into it, extending `subst`. Leaves the node closed when no
    /// alternative remains.
    fn forward(&mut self, bank: &mut TermBank, subst: &mut Subst) {
        let handle = self.tree_pos.expect("active search");
        let closed = self.closed(handle);
        let mut count = self.nodes[handle].trav_count;
        let term = *self.term_stack.last().expect("query symbols remain");
        let term_is_var = bank.is_var(term);

        let mut advanced = None;
        while count < closed {
            if (count == 0 || count > self.nodes[handle].max_var) && !term_is_var {
                let f_code = bank.cell(term).f_code;
                let next = self.nodes[handle].f_alternatives.get(&f_code).copied();
                count += 1;
                if let Some(next) = next {
                    self.term_proc.push(term);
                    let _ = lr_traverse_next(bank, &mut self.term_stack);
                    let init = self.init_val();
                    let node = &mut self.nodes[next];
                    node.trav_count = init;
                    node.bound = false;
                    debug_assert!(node.variable.is_none());
                    advanced = Some(next);
                    break;
                }
            } else {
                let next = self
                    .nodes[handle]
                    .v_alternatives
                    .get(count as usize)
                    .copied()
                    .flatten();
                count += 1;
                if let Some(next) = next {
                    let variable = self.nodes[next].variable.expect("variable alternative");
                    let binding = bank.cell(variable).binding;
                    if binding.is_none() && bank.sort(term) != SORT_BOOL {
                        self.term_stack.pop();
                        subst.bind(bank, variable, term);
                        let init = self.init_val();
                        let node = &mut self.nodes[next];
                        node.trav_count = init;
                        node.bound = true;
                        self.term_weight -= bank.weight(term) - 1;
                        advanced = Some(next);
                        break;
                    } else if binding == Some(term) {
                        self.term_stack.pop();
                        let init = self.init_val();
                        let node = &mut self.nodes[next];
                        node.trav_count = init;
                        node.bound = false;
                        self.term_weight -= bank.weight(term) - 1;
                        advanced = Some(next);
                        break;
                    }
                }
            }
        }
        self.nodes[handle].trav_count = count;
        if let Some(next) = advanced {
            self.tree_pos = Some(next);
            self.visited_count += 1;
        }
    }

    /// Rise to the parent of the current node, restoring the query stack,
    /// the remaining weight, and any binding made on the way down.
    fn backtrack(&mut self, bank: &mut TermBank, subst: &mut Subst) {
        let handle = self.tree_pos.expect("active search");
        if let Some(variable) = self.nodes[handle].variable {
            let image = bank
                .cell(variable)
                .binding
                .expect("a variable node on the path is bound");
            self.term_weight += bank.weight(image) - 1;
            self.term_stack.push(image);
            if self.nodes[handle].bound {
                let undone = subst.backtrack_single(bank);
                debug_assert!(undone);
            }
        } else if self.nodes[handle].parent.is_some() {
            let term = self.term_proc.pop().expect("processed function symbol");
            lr_traverse_prev(bank, &mut self.term_stack, term);
        }
        self.tree_pos = self.nodes[handle].parent;
    }

    /// Drive the state machine to the next leaf whose constraints are
    /// compatible with the query, extending `subst` with the match built
    /// along the path.
    pub fn find_next_leaf(&mut self, bank: &mut TermBank, subst: &mut Subst) -> bool {
        while let Some(position) = self.tree_pos {
            if !self.verify_node_constr() || self.nodes[position].trav_count == self.closed(position)
            {
                self.backtrack(bank, subst);
            } else if !self.nodes[position].entries.is_empty() {
                self.nodes[position].trav_count = self.closed(position);
                return true;
            } else {
                self.forward(bank, subst);
            }
        }
        false
    }

    /// The next matching clause position, or `None` when the search is
    /// exhausted. On return the caller's substitution holds the match of
    /// the entry's term onto the query.
    pub fn find_next_demodulator(
        &mut self,
        bank: &mut TermBank,
        subst: &mut Subst,
    ) -> Option<ClausePos> {
        while self.tree_pos.is_some() {
            if self.store_active {
                let leaf = self.tree_pos.expect("active search");
                match self.nodes[leaf].entries.get(self.store_cursor) {
                    Some(&pos) => {
                        self.store_cursor += 1;
                        return Some(pos);
                    }
                    None => {
                        self.store_active = false;
                    }
                }
            }
            if self.find_next_leaf(bank, subst) {
                self.store_active = true;
                self.store_cursor = 0;
            }
        }
        None
    }
}
