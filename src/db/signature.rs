/*!
The signature: a bijection between symbol names and positive function codes.

Codes are assigned densely from 1 upward; the logical constants and
connectives are pre-interned at fixed codes so that every signature agrees
on them. Each symbol carries its arity, its result sort, and a small set of
property bits.

A signature only ever grows. It is owned by the
[context](crate::context::ProverContext) and borrowed by the term bank (for
sorts on insertion) and the ordering control block (for weight generation
and precedence queries).
*/

use rustc_hash::FxHashMap;

use crate::types::{
    err::SignatureError,
    FunCode, SortCode, SORT_BOOL, SORT_INDIVIDUAL,
};

/// Code of `$true`.
pub const SIG_TRUE_CODE: FunCode = 1;
/// Code of `$false`.
pub const SIG_FALSE_CODE: FunCode = 2;
/// Code of negation.
pub const SIG_NOT_CODE: FunCode = 3;
/// Code of disjunction.
pub const SIG_OR_CODE: FunCode = 4;
/// Code of conjunction.
pub const SIG_AND_CODE: FunCode = 5;
/// Code of implication.
pub const SIG_IMPL_CODE: FunCode = 6;
/// Code of equivalence.
pub const SIG_EQUIV_CODE: FunCode = 7;
/// Code of exclusive or.
pub const SIG_XOR_CODE: FunCode = 8;
/// Code of the universal quantifier.
pub const SIG_ALL_CODE: FunCode = 9;
/// Code of the existential quantifier.
pub const SIG_EX_CODE: FunCode = 10;
/// Code of equality.
pub const SIG_EQ_CODE: FunCode = 11;

/// Property bits of a signature symbol.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FuncProps(u16);

impl FuncProps {
    /// The symbol is a predicate symbol; terms headed by it are atoms.
    pub const PREDICATE: FuncProps = FuncProps(1 << 0);

    /// The symbol is one of the pre-interned logical symbols.
    pub const SPECIAL: FuncProps = FuncProps(1 << 1);

    /// The symbol was introduced by Skolemization.
    pub const SKOLEM: FuncProps = FuncProps(1 << 2);

    /// The symbol names a distinct object; distinct objects compare above
    /// all ordinary symbols in any precedence.
    pub const DISTINCT_OBJECT: FuncProps = FuncProps(1 << 3);

    /// The symbol is commutative.
    pub const COMMUTATIVE: FuncProps = FuncProps(1 << 4);

    /// The symbol is associative-commutative.
    pub const ASSOC_COMM: FuncProps = FuncProps(1 << 5);

    /// True if every bit of `prop` is set.
    pub fn has(self, prop: FuncProps) -> bool {
        self.0 & prop.0 == prop.0
    }

    /// Set every bit of `prop`.
    pub fn set(&mut self, prop: FuncProps) {
        self.0 |= prop.0;
    }
}

#[derive(Clone, Debug)]
struct SymbolCell {
    name: String,
    arity: usize,
    sort: SortCode,
    props: FuncProps,
}

/// A growable symbol table with fixed internal codes.
#[derive(Clone, Debug)]
pub struct Signature {
    symbols: Vec<SymbolCell>,
    by_name: FxHashMap<String, FunCode>,
    skolem_count: u64,
}

impl Default for Signature {
    fn default() -> Self {
        Signature::new()
    }
}

impl Signature {
    /// A fresh signature with the logical symbols pre-interned.
    pub fn new() -> Self {
        let mut sig = Signature {
            symbols: Vec::new(),
            by_name: FxHashMap::default(),
            skolem_count: 0,
        };

        // Order matters: these must land on the SIG_*_CODE constants.
        for (name, arity, sort) in [
            ("$true", 0, SORT_BOOL),
            ("$false", 0, SORT_BOOL),
            ("~", 1, SORT_BOOL),
            ("|", 2, SORT_BOOL),
            ("&", 2, SORT_BOOL),
            ("=>", 2, SORT_BOOL),
            ("<=>", 2, SORT_BOOL),
            ("<~>", 2, SORT_BOOL),
            ("!", 1, SORT_BOOL),
            ("?", 1, SORT_BOOL),
            ("=", 2, SORT_BOOL),
        ] {
            let code = sig.intern_cell(name, arity, sort);
            let mut props = FuncProps::SPECIAL;
            if code == SIG_EQ_CODE || code == SIG_TRUE_CODE || code == SIG_FALSE_CODE {
                props.set(FuncProps::PREDICATE);
            }
            sig.symbols[(code - 1) as usize].props = props;
        }
        debug_assert_eq!(sig.f_count(), SIG_EQ_CODE);

        sig
    }

    fn intern_cell(&mut self, name: &str, arity: usize, sort: SortCode) -> FunCode {
        let code = self.symbols.len() as FunCode + 1;
        self.symbols.push(SymbolCell {
            name: name.to_owned(),
            arity,
            sort,
            props: FuncProps::default(),
        });
        self.by_name.insert(name.to_owned(), code);
        code
    }

    /// The largest assigned code.
    pub fn f_count(&self) -> FunCode {
        self.symbols.len() as FunCode
    }

    /// The number of pre-interned internal symbols.
    pub fn internal_symbols(&self) -> FunCode {
        SIG_EQ_CODE
    }

    /// Intern `name` with the given arity and result sort, or return the
    /// existing code. An existing symbol with a different arity is an
    /// [ArityConflict](SignatureError::ArityConflict).
    pub fn intern(
        &mut self,
        name: &str,
        arity: usize,
        sort: SortCode,
    ) -> Result<FunCode, SignatureError> {
        if let Some(&code) = self.by_name.get(name) {
            let cell = &self.symbols[(code - 1) as usize];
            if cell.arity != arity {
                return Err(SignatureError::ArityConflict {
                    code,
                    expected: cell.arity,
                    given: arity,
                });
            }
            return Ok(code);
        }
        Ok(self.intern_cell(name, arity, sort))
    }

    /// Intern a function symbol of individuals.
    pub fn intern_fun(&mut self, name: &str, arity: usize) -> Result<FunCode, SignatureError> {
        self.intern(name, arity, SORT_INDIVIDUAL)
    }

    /// Intern a predicate symbol.
    pub fn intern_pred(&mut self, name: &str, arity: usize) -> Result<FunCode, SignatureError> {
        let code = self.intern(name, arity, SORT_BOOL)?;
        self.symbols[(code - 1) as usize].props.set(FuncProps::PREDICATE);
        Ok(code)
    }

    /// The code of `name`, if interned.
    pub fn code_of(&self, name: &str) -> Option<FunCode> {
        self.by_name.get(name).copied()
    }

    /// The name of `code`.
    ///
    /// # Panics
    /// If `code` is not a valid positive code of this signature.
    pub fn name_of(&self, code: FunCode) -> &str {
        &self.symbols[(code - 1) as usize].name
    }

    /// The arity of `code`.
    pub fn arity(&self, code: FunCode) -> usize {
        self.symbols[(code - 1) as usize].arity
    }

    /// The result sort of `code`.
    pub fn result_sort(&self, code: FunCode) -> SortCode {
        self.symbols[(code - 1) as usize].sort
    }

    /// True if `code` carries every bit of `prop`.
    pub fn has_prop(&self, code: FunCode, prop: FuncProps) -> bool {
        self.symbols[(code - 1) as usize].props.has(prop)
    }

    /// Set property bits on `code`.
    pub fn set_prop(&mut self, code: FunCode, prop: FuncProps) {
        self.symbols[(code - 1) as usize].props.set(prop);
    }

    /// True if `code` is a predicate symbol.
    pub fn is_predicate(&self, code: FunCode) -> bool {
        self.has_prop(code, FuncProps::PREDICATE)
    }

    /// True if `code` is a pre-interned logical symbol.
    pub fn is_special(&self, code: FunCode) -> bool {
        self.has_prop(code, FuncProps::SPECIAL)
    }

    /// True if `code` is an ordinary constant (arity 0, not a predicate,
    /// not special).
    pub fn is_fun_const(&self, code: FunCode) -> bool {
        let cell = &self.symbols[(code - 1) as usize];
        cell.arity == 0
            && !cell.props.has(FuncProps::PREDICATE)
            && !cell.props.has(FuncProps::SPECIAL)
    }

    /// Issue a fresh Skolem symbol of the given arity and result sort.
    pub fn fresh_skolem(&mut self, arity: usize, sort: SortCode) -> FunCode {
        loop {
            self.skolem_count += 1;
            let name = format!("sk{}", self.skolem_count);
            if !self.by_name.contains_key(&name) {
                let code = self.intern_cell(&name, arity, sort);
                self.symbols[(code - 1) as usize].props.set(FuncProps::SKOLEM);
                return code;
            }
        }
    }
}
