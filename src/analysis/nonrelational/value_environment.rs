use crate::analysis::abstract_domain::ValueDomainTrait;
use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::functional_lattice::FunctionalLattice;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::ValueExpression;
use crate::analysis::memory::heap_domain::HeapReplacement;
use crate::analysis::memory::identifier::Identifier;
use crate::analysis::nonrelational::nonrelational_domain::{
    EnvironmentTrait, NonRelationalDomainTrait,
};
use crate::analysis::program_point::{ProgramPoint, ScopeToken};
use crate::analysis::satisfiability::Satisfiability;
use serde_json::Value;
use std::fmt;

/// Maps identifiers to values of the non-relational domain `D`
#[derive(Clone, PartialEq)]
pub struct ValueEnvironment<D: NonRelationalDomainTrait> {
    function: FunctionalLattice<Identifier, D>,
}

impl<D: NonRelationalDomainTrait> ValueEnvironment<D> {
    /// The environment with no bindings, which is top
    pub fn new() -> Self {
        ValueEnvironment {
            function: FunctionalLattice::new(),
        }
    }

    pub fn function(&self) -> &FunctionalLattice<Identifier, D> {
        &self.function
    }

    fn from_function(function: FunctionalLattice<Identifier, D>) -> Self {
        // a single unreachable binding makes the whole environment unreachable
        if function.iter().any(|(_, v)| v.is_bottom()) {
            Self::bottom()
        } else {
            ValueEnvironment { function }
        }
    }

    /// Binds `id` to `value`, joining with the current binding when `id` is weak
    pub(crate) fn bind(&self, id: &Identifier, value: D) -> Result<Self> {
        let value = if id.is_weak() && self.function.contains_key(id) {
            self.function.get_state(id).lub(&value)?
        } else {
            value
        };
        if value.is_bottom() {
            return Ok(Self::bottom());
        }
        Ok(ValueEnvironment {
            function: self.function.put_state(id.clone(), value),
        })
    }
}

impl<D: NonRelationalDomainTrait> Default for ValueEnvironment<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: NonRelationalDomainTrait> fmt::Debug for ValueEnvironment<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.function, f)
    }
}

impl<D: NonRelationalDomainTrait> EnvironmentTrait<D> for ValueEnvironment<D> {
    fn get_state(&self, id: &Identifier) -> D {
        self.function.get_state(id)
    }

    fn put_state(&self, id: Identifier, value: D) -> Self {
        ValueEnvironment {
            function: self.function.put_state(id, value),
        }
    }
}

impl<D: NonRelationalDomainTrait> LatticeTrait for ValueEnvironment<D> {
    fn top() -> Self {
        ValueEnvironment {
            function: FunctionalLattice::top(),
        }
    }

    fn bottom() -> Self {
        ValueEnvironment {
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
        Ok(ValueEnvironment {
            function: self.function.lub(&other.function)?,
        })
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self::from_function(self.function.glb(&other.function)?))
    }

    fn widening_aux(&self, other: &Self) -> Result<Self> {
        Ok(ValueEnvironment {
            function: self.function.widening(&other.function)?,
        })
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        self.function.less_or_equal(&other.function)
    }
}

impl<D: NonRelationalDomainTrait> ValueDomainTrait for ValueEnvironment<D> {
    fn assign(&self, id: &Identifier, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self> {
        if self.is_bottom() || !D::tracks_identifier(id) || !D::can_process(expression) {
            return Ok(self.clone());
        }
        let value = D::eval(expression, self, pp)?;
        self.bind(id, value)
    }

    fn small_step_semantics(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self> {
        if !self.is_bottom() && D::can_process(expression) {
            // evaluation only checks the expression, nothing is stored
            D::eval(expression, self, pp)?;
        }
        Ok(self.clone())
    }

    fn assume(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self> {
        if self.is_bottom() {
            return Ok(self.clone());
        }
        match D::satisfies(expression, self, pp)? {
            Satisfiability::NotSatisfied | Satisfiability::Bottom => Ok(Self::bottom()),
            Satisfiability::Satisfied => Ok(self.clone()),
            Satisfiability::Unknown => {
                let refined = D::assume(self.clone(), expression, pp)?;
                refined.glb(self)
            }
        }
    }

    fn satisfies(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Satisfiability> {
        if self.is_bottom() {
            return Ok(Satisfiability::Bottom);
        }
        D::satisfies(expression, self, pp)
    }

    fn forget_identifier(&self, id: &Identifier) -> Result<Self> {
        Ok(ValueEnvironment {
            function: self.function.forget(id),
        })
    }

    fn push_scope(&self, token: &ScopeToken) -> Result<Self> {
        Ok(ValueEnvironment {
            function: self.function.rename_keys(|id| Ok(Some(id.push_scope(token))))?,
        })
    }

    fn pop_scope(&self, token: &ScopeToken) -> Result<Self> {
        Ok(ValueEnvironment {
            function: self.function.rename_keys(|id| Ok(id.pop_scope(token)))?,
        })
    }

    fn apply_substitution(&self, substitution: &[HeapReplacement], _pp: &ProgramPoint) -> Result<Self> {
        if self.is_bottom() {
            return Ok(self.clone());
        }
        let mut function = self.function.clone();
        for replacement in substitution {
            replacement.check()?;
            let mut joined = D::bottom();
            for source in replacement.sources.iter() {
                joined = joined.lub(&function.get_state(source))?;
            }
            for id in replacement.ids_to_forget() {
                function = function.forget(id);
            }
            for target in replacement.targets.iter() {
                function = function.put_state(target.clone(), joined.clone());
            }
        }
        Ok(Self::from_function(function))
    }

    fn representation(&self) -> Value {
        self.function.representation_with(|v| v.representation())
    }
}
