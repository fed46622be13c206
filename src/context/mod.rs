/*!
The reasoning context.

A [ProverContext] owns exactly one signature, term bank, counter block and
statistics block. Everything the original design kept in process-global
state --- clause idents, formula idents, creation dates, rewrite counters ---
is scoped here, so multiple provers can share one process without
interference.

The context is deliberately thin: the procedures take the pieces they
need as explicit borrows, and the context's job is to own them side by
side so the borrows can be split.
*/

use crate::{
    config::Config,
    db::{signature::Signature, term_bank::TermBank},
    ordering::{ocb::Ocb, weightgen, OrderingType},
    types::Date,
};

/// Per-context monotonic counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Counters {
    clause_ident: u64,
    formula_ident: u64,
    date: Date,
}

impl Counters {
    /// A fresh clause ident.
    pub fn next_clause_ident(&mut self) -> u64 {
        self.clause_ident += 1;
        self.clause_ident
    }

    /// A fresh formula ident.
    pub fn next_formula_ident(&mut self) -> u64 {
        self.formula_ident += 1;
        self.formula_ident
    }

    /// Advance and return the creation date.
    pub fn tick_date(&mut self) -> Date {
        self.date += 1;
        self.date
    }

    /// The current date.
    pub fn date(&self) -> Date {
        self.date
    }
}

/// Rewriting statistics. Informational only: nothing reads these to make
/// decisions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Statistics {
    /// Demodulator searches started.
    pub rewrite_attempts: u64,
    /// Successful top-level rewrite steps.
    pub rewrite_successes: u64,
    /// Matches rejected because the instantiated right-hand side retained
    /// unbound variables.
    pub rewrite_unbound_var_fails: u64,
}

/// One prover's worth of owned state.
#[derive(Debug)]
pub struct ProverContext {
    /// The signature.
    pub sig: Signature,
    /// The term bank.
    pub bank: TermBank,
    /// The configuration the context was built from.
    pub config: Config,
    /// Ident and date counters.
    pub counters: Counters,
    /// Rewriting statistics.
    pub stats: Statistics,
}

impl ProverContext {
    /// A fresh context from `config`.
    pub fn from_config(config: Config) -> Self {
        let sig = Signature::new();
        let bank = TermBank::new(&sig);
        ProverContext {
            sig,
            bank,
            config,
            counters: Counters::default(),
            stats: Statistics::default(),
        }
    }

    /// A fresh context with the default configuration.
    pub fn new() -> Self {
        ProverContext::from_config(Config::default())
    }

    /// Build an ordering control block over the current signature,
    /// generating weights according to the configuration.
    pub fn make_ocb(&mut self) -> Ocb {
        self.make_ocb_of(self.config.ordering)
    }

    /// Build an OCB of a specific type, keeping the configured weight
    /// scheme.
    pub fn make_ocb_of(&mut self, ordering: OrderingType) -> Ocb {
        let mut ocb = Ocb::new(ordering, self.config.prec_by_weight, &self.sig);
        ocb.var_weight = self.config.var_weight;
        ocb.rewrite_strong_rhs_inst = self.config.rewrite_strong_rhs_inst;
        weightgen::generate_weights(
            &mut ocb,
            &self.sig,
            &self.bank,
            None,
            self.config.weight_gen,
            self.config.const_weight,
        );
        ocb
    }
}

impl Default for ProverContext {
    fn default() -> Self {
        ProverContext::new()
    }
}
