use crate::analysis::abstract_domain::{TypeDomainTrait, ValueDomainTrait};
use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::ValueExpression;
use crate::analysis::memory::heap_domain::HeapReplacement;
use crate::analysis::memory::identifier::Identifier;
use crate::analysis::memory::types::{Type, TypeSet};
use crate::analysis::nonrelational::nonrelational_domain::{
    EnvironmentTrait, NonRelationalTypeDomainTrait,
};
use crate::analysis::nonrelational::value_environment::ValueEnvironment;
use crate::analysis::program_point::{ProgramPoint, ScopeToken};
use crate::analysis::satisfiability::Satisfiability;
use serde_json::{json, Value};
use std::fmt;

/// An environment of runtime type information
///
/// Next to the bindings it keeps the value of the last evaluated expression, which
/// the composite state reads back to annotate expressions and identifiers.
/// Unlike a plain value environment, every identifier is tracked.
#[derive(Clone, PartialEq)]
pub struct TypeEnvironment<T: NonRelationalTypeDomainTrait> {
    env: ValueEnvironment<T>,
    stack: T,
}

impl<T: NonRelationalTypeDomainTrait> TypeEnvironment<T> {
    pub fn new() -> Self {
        TypeEnvironment {
            env: ValueEnvironment::new(),
            stack: T::bottom(),
        }
    }

    pub fn environment(&self) -> &ValueEnvironment<T> {
        &self.env
    }

    pub fn stack(&self) -> &T {
        &self.stack
    }

    pub fn get_state(&self, id: &Identifier) -> T {
        self.env.get_state(id)
    }

    fn with_env(&self, env: ValueEnvironment<T>) -> Self {
        TypeEnvironment {
            env,
            stack: self.stack.clone(),
        }
    }
}

impl<T: NonRelationalTypeDomainTrait> Default for TypeEnvironment<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NonRelationalTypeDomainTrait> fmt::Debug for TypeEnvironment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} [stack: {:?}]", self.env, self.stack)
    }
}

impl<T: NonRelationalTypeDomainTrait> LatticeTrait for TypeEnvironment<T> {
    fn top() -> Self {
        TypeEnvironment {
            env: ValueEnvironment::top(),
            stack: T::top(),
        }
    }

    fn bottom() -> Self {
        TypeEnvironment {
            env: ValueEnvironment::bottom(),
            stack: T::bottom(),
        }
    }

    fn is_top(&self) -> bool {
        self.env.is_top() && self.stack.is_top()
    }

    fn is_bottom(&self) -> bool {
        self.env.is_bottom()
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(TypeEnvironment {
            env: self.env.lub(&other.env)?,
            stack: self.stack.lub(&other.stack)?,
        })
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(TypeEnvironment {
            env: self.env.glb(&other.env)?,
            stack: self.stack.glb(&other.stack)?,
        })
    }

    fn widening_aux(&self, other: &Self) -> Result<Self> {
        Ok(TypeEnvironment {
            env: self.env.widening(&other.env)?,
            stack: self.stack.widening(&other.stack)?,
        })
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        Ok(self.env.less_or_equal(&other.env)? && self.stack.less_or_equal(&other.stack)?)
    }
}

impl<T: NonRelationalTypeDomainTrait> ValueDomainTrait for TypeEnvironment<T> {
    fn assign(&self, id: &Identifier, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self> {
        if self.is_bottom() {
            return Ok(self.clone());
        }
        let value = T::eval(expression, &self.env, pp)?;
        Ok(TypeEnvironment {
            env: self.env.bind(id, value.clone())?,
            stack: value,
        })
    }

    fn small_step_semantics(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self> {
        if self.is_bottom() {
            return Ok(self.clone());
        }
        Ok(TypeEnvironment {
            env: self.env.clone(),
            stack: T::eval(expression, &self.env, pp)?,
        })
    }

    fn assume(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self> {
        let env = self.env.assume(expression, pp)?;
        if env.is_bottom() {
            return Ok(Self::bottom());
        }
        Ok(self.with_env(env))
    }

    fn satisfies(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Satisfiability> {
        self.env.satisfies(expression, pp)
    }

    fn forget_identifier(&self, id: &Identifier) -> Result<Self> {
        Ok(self.with_env(self.env.forget_identifier(id)?))
    }

    fn push_scope(&self, token: &ScopeToken) -> Result<Self> {
        Ok(self.with_env(self.env.push_scope(token)?))
    }

    fn pop_scope(&self, token: &ScopeToken) -> Result<Self> {
        Ok(self.with_env(self.env.pop_scope(token)?))
    }

    fn apply_substitution(&self, substitution: &[HeapReplacement], pp: &ProgramPoint) -> Result<Self> {
        Ok(self.with_env(self.env.apply_substitution(substitution, pp)?))
    }

    fn representation(&self) -> Value {
        if self.is_bottom() || self.is_top() {
            return self.env.representation();
        }
        json!({
            "environment": self.env.representation(),
            "stack": self.stack.representation(),
        })
    }
}

impl<T: NonRelationalTypeDomainTrait> TypeDomainTrait for TypeEnvironment<T> {
    fn inferred_runtime_types(&self) -> TypeSet {
        self.stack.runtime_types()
    }

    fn inferred_dynamic_type(&self) -> Type {
        let types = self.stack.runtime_types();
        if self.stack.is_top() || self.stack.is_bottom() || types.is_empty() {
            Type::Untyped
        } else {
            types.common_supertype()
        }
    }
}
