use crate::analysis::abstract_domain::{TypeDomainTrait, ValueDomainTrait};
use crate::analysis::analysis_result::Result;
use crate::analysis::analysis_state::AnalysisState;
use crate::analysis::lattices::functional_lattice::FunctionalLattice;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::heap_domain::HeapDomainTrait;
use crate::analysis::program_point::ProgramPoint;
use serde_json::Value;
use std::fmt;

/// The analysis states computed for each statement of a body
#[derive(Clone, PartialEq)]
pub struct StatementStore<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    function: FunctionalLattice<ProgramPoint, AnalysisState<H, V, T>>,
}

impl<H, V, T> StatementStore<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    pub fn new() -> Self {
        StatementStore {
            function: FunctionalLattice::new(),
        }
    }

    /// Stores `state` for `pp`, returning the state it replaces
    pub fn put(&mut self, pp: ProgramPoint, state: AnalysisState<H, V, T>) -> Option<AnalysisState<H, V, T>> {
        let previous = if self.function.contains_key(&pp) {
            Some(self.function.get_state(&pp))
        } else {
            None
        };
        self.function = self.function.put_state(pp, state);
        previous
    }

    /// The state stored for `pp`, top if none was stored
    pub fn get_state(&self, pp: &ProgramPoint) -> AnalysisState<H, V, T> {
        self.function.get_state(pp)
    }

    pub fn contains(&self, pp: &ProgramPoint) -> bool {
        self.function.contains_key(pp)
    }

    pub fn len(&self) -> usize {
        self.function.len()
    }

    pub fn is_empty(&self) -> bool {
        self.function.is_empty()
    }

    pub fn representation(&self) -> Value {
        self.function.representation_with(AnalysisState::representation)
    }
}

impl<H, V, T> Default for StatementStore<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H, V, T> fmt::Debug for StatementStore<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.function, f)
    }
}

impl<H, V, T> LatticeTrait for StatementStore<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    fn top() -> Self {
        StatementStore {
            function: FunctionalLattice::top(),
        }
    }

    fn bottom() -> Self {
        StatementStore {
            function: FunctionalLattice::bottom(),
        }
    }

    fn is_top(&self) -> bool {
        self.function.is_top()
    }

    fn is_bottom(&self) -> bool {
        self.function.is_bottom()
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(StatementStore {
            function: self.function.lub(&other.function)?,
        })
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(StatementStore {
            function: self.function.glb(&other.function)?,
        })
    }

    fn widening_aux(&self, other: &Self) -> Result<Self> {
        Ok(StatementStore {
            function: self.function.widening(&other.function)?,
        })
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        self.function.less_or_equal(&other.function)
    }
}
