use crate::analysis::analysis_result::{Result, SemanticError};
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::{ExpressionSet, SymbolicExpression, ValueExpression};
use crate::analysis::memory::identifier::Identifier;
use crate::analysis::program_point::{ProgramPoint, ScopeToken};
use crate::analysis::satisfiability::Satisfiability;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Replaces the `sources` identifiers with the `targets` ones in the other domains.
/// The value of every target becomes the join of the values of the sources.
#[derive(Clone, Eq, PartialEq, Default)]
pub struct HeapReplacement {
    pub sources: BTreeSet<Identifier>,
    pub targets: BTreeSet<Identifier>,
}

impl HeapReplacement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(mut self, id: Identifier) -> Self {
        self.sources.insert(id);
        self
    }

    pub fn add_target(mut self, id: Identifier) -> Self {
        self.targets.insert(id);
        self
    }

    /// Sources that are not targets, whose bindings disappear
    pub fn ids_to_forget(&self) -> impl Iterator<Item = &Identifier> {
        self.sources.difference(&self.targets)
    }

    pub fn check(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(SemanticError::InconsistentSubstitution(format!(
                "replacement without sources for {:?}",
                self.targets
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for HeapReplacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.sources, self.targets)
    }
}

/// The result of a heap transfer: the new heap together with the substitution the
/// value and type domains must apply before processing the same transfer
#[derive(Clone, Debug)]
pub struct HeapUpdate<H> {
    pub heap: H,
    pub substitution: Vec<HeapReplacement>,
}

impl<H> HeapUpdate<H> {
    pub fn without_substitution(heap: H) -> Self {
        HeapUpdate {
            heap,
            substitution: Vec::new(),
        }
    }
}

/// Generic API for heap abstractions
pub trait HeapDomainTrait: LatticeTrait + fmt::Debug {
    fn assign(
        &self,
        id: &Identifier,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<HeapUpdate<Self>>;

    fn small_step_semantics(
        &self,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<HeapUpdate<Self>>;

    fn assume(&self, expression: &SymbolicExpression, pp: &ProgramPoint)
        -> Result<HeapUpdate<Self>>;

    fn satisfies(&self, expression: &SymbolicExpression, pp: &ProgramPoint)
        -> Result<Satisfiability>;

    fn forget_identifier(&self, id: &Identifier) -> Result<Self>;

    fn push_scope(&self, token: &ScopeToken) -> Result<Self>;

    fn pop_scope(&self, token: &ScopeToken) -> Result<Self>;

    /// The heap-free expressions `expression` may denote in this heap.
    /// Never changes the heap.
    fn rewrite(
        &self,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<ExpressionSet<ValueExpression>>;

    fn representation(&self) -> Value;
}
