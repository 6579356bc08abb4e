use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::{ExpressionSet, SymbolicExpression, ValueExpression};
use crate::analysis::memory::heap_domain::{HeapDomainTrait, HeapReplacement, HeapUpdate};
use crate::analysis::memory::identifier::Identifier;
use crate::analysis::memory::types::{Type, TypeSet};
use crate::analysis::program_point::{ProgramPoint, ScopeToken};
use crate::analysis::satisfiability::Satisfiability;
use serde_json::{json, Value};
use std::fmt;

/// Generic API for domains over heap-free expressions
pub trait ValueDomainTrait: LatticeTrait + fmt::Debug {
    fn assign(&self, id: &Identifier, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self>;

    fn small_step_semantics(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self>;

    fn assume(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Self>;

    fn satisfies(&self, expression: &ValueExpression, pp: &ProgramPoint) -> Result<Satisfiability>;

    fn forget_identifier(&self, id: &Identifier) -> Result<Self>;

    fn push_scope(&self, token: &ScopeToken) -> Result<Self>;

    fn pop_scope(&self, token: &ScopeToken) -> Result<Self>;

    /// Moves the information of the sources of every replacement to its targets, in order
    fn apply_substitution(&self, substitution: &[HeapReplacement], pp: &ProgramPoint) -> Result<Self>;

    fn representation(&self) -> Value;
}

/// A value domain that infers runtime types
pub trait TypeDomainTrait: ValueDomainTrait {
    /// The runtime types of the last evaluated expression
    fn inferred_runtime_types(&self) -> TypeSet;

    /// The common supertype of the inferred runtime types, `untyped` when nothing is known
    fn inferred_dynamic_type(&self) -> Type;
}

/// The product of a heap, a value and a type domain
///
/// Every transfer runs the heap domain first, then feeds the rewritten expressions
/// to the type domain and finally to the value domain.
#[derive(Clone, PartialEq)]
pub struct AbstractDomain<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    pub heap_domain: H,
    pub value_domain: V,
    pub type_domain: T,
}

impl<H, V, T> fmt::Debug for AbstractDomain<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "heap: {:?}, value: {:?}, type: {:?}",
            self.heap_domain, self.value_domain, self.type_domain
        )
    }
}

impl<H, V, T> AbstractDomain<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    pub fn new(heap_domain: H, value_domain: V, type_domain: T) -> Self {
        Self {
            heap_domain,
            value_domain,
            type_domain,
        }
    }

    pub fn assign(
        &self,
        id: &Identifier,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<Self> {
        let update = self.heap_domain.assign(id, expression, pp)?;
        self.transfer(update, expression, pp, |value, types, rewritten| {
            let types = types.assign(id, rewritten, pp)?;
            let runtime_types = types.inferred_runtime_types();
            let value = if runtime_types.is_empty() {
                value.assign(id, rewritten, pp)?
            } else {
                value.assign(
                    &id.with_runtime_types(runtime_types.clone()),
                    &rewritten.with_runtime_types(runtime_types),
                    pp,
                )?
            };
            Ok((value, types))
        })
    }

    pub fn small_step_semantics(
        &self,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<Self> {
        let update = self.heap_domain.small_step_semantics(expression, pp)?;
        self.transfer(update, expression, pp, |value, types, rewritten| {
            let types = types.small_step_semantics(rewritten, pp)?;
            let rewritten = Self::annotate(&types, rewritten);
            Ok((value.small_step_semantics(&rewritten, pp)?, types))
        })
    }

    pub fn assume(&self, expression: &SymbolicExpression, pp: &ProgramPoint) -> Result<Self> {
        let update = self.heap_domain.assume(expression, pp)?;
        self.transfer(update, expression, pp, |value, types, rewritten| {
            let rewritten = Self::evaluate_and_annotate(types, rewritten, pp)?;
            let types = types.assume(&rewritten, pp)?;
            Ok((value.assume(&rewritten, pp)?, types))
        })
    }

    /// The conjunction of what the three domains can tell about `expression`
    pub fn satisfies(
        &self,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        let heap_sat = self.heap_domain.satisfies(expression, pp)?;
        let rewritten = self.heap_domain.rewrite(expression, pp)?;
        // an empty rewriting is Bottom
        let mut type_sat = Satisfiability::Bottom;
        let mut value_sat = Satisfiability::Bottom;
        for e in rewritten.iter() {
            let e = Self::evaluate_and_annotate(&self.type_domain, e, pp)?;
            type_sat = type_sat.lub_sat(self.type_domain.satisfies(&e, pp)?);
            value_sat = value_sat.lub_sat(self.value_domain.satisfies(&e, pp)?);
        }
        Ok(heap_sat.glb_sat(type_sat).glb_sat(value_sat))
    }

    pub fn forget_identifier(&self, id: &Identifier) -> Result<Self> {
        Ok(Self {
            heap_domain: self.heap_domain.forget_identifier(id)?,
            value_domain: self.value_domain.forget_identifier(id)?,
            type_domain: self.type_domain.forget_identifier(id)?,
        })
    }

    pub fn push_scope(&self, token: &ScopeToken) -> Result<Self> {
        Ok(Self {
            heap_domain: self.heap_domain.push_scope(token)?,
            value_domain: self.value_domain.push_scope(token)?,
            type_domain: self.type_domain.push_scope(token)?,
        })
    }

    pub fn pop_scope(&self, token: &ScopeToken) -> Result<Self> {
        Ok(Self {
            heap_domain: self.heap_domain.pop_scope(token)?,
            value_domain: self.value_domain.pop_scope(token)?,
            type_domain: self.type_domain.pop_scope(token)?,
        })
    }

    /// The heap-free expressions `expression` stands for in the current heap
    pub fn rewrite(
        &self,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<ExpressionSet<ValueExpression>> {
        self.heap_domain.rewrite(expression, pp)
    }

    pub fn representation(&self) -> Value {
        json!({
            "heap": self.heap_domain.representation(),
            "value": self.value_domain.representation(),
            "type": self.type_domain.representation(),
        })
    }

    /// Applies the heap substitution to the value and type domains, then runs `step` on
    /// every rewriting of `expression` and joins the results
    fn transfer<F>(
        &self,
        update: HeapUpdate<H>,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
        step: F,
    ) -> Result<Self>
    where
        F: Fn(&V, &T, &ValueExpression) -> Result<(V, T)>,
    {
        let HeapUpdate { heap, substitution } = update;
        let rewritten = heap.rewrite(expression, pp)?;
        debug!("{:?} rewritten to {:?}", expression, rewritten);

        let (value, types) = if substitution.is_empty() {
            (self.value_domain.clone(), self.type_domain.clone())
        } else {
            debug!("Applying heap substitution {:?}", substitution);
            for replacement in substitution.iter() {
                replacement.check()?;
            }
            (
                self.value_domain.apply_substitution(&substitution, pp)?,
                self.type_domain.apply_substitution(&substitution, pp)?,
            )
        };

        if rewritten.is_empty() {
            return Ok(Self::new(heap, value, types));
        }
        let mut joined_value = V::bottom();
        let mut joined_types = T::bottom();
        for e in rewritten.iter() {
            let (v, t) = step(&value, &types, e)?;
            joined_value = joined_value.lub(&v)?;
            joined_types = joined_types.lub(&t)?;
        }
        Ok(Self::new(heap, joined_value, joined_types))
    }

    /// Tags `expression` with the runtime types `types` infers for it
    fn evaluate_and_annotate(
        types: &T,
        expression: &ValueExpression,
        pp: &ProgramPoint,
    ) -> Result<ValueExpression> {
        let evaluated = types.small_step_semantics(expression, pp)?;
        Ok(Self::annotate(&evaluated, expression))
    }

    fn annotate(types: &T, expression: &ValueExpression) -> ValueExpression {
        let runtime_types = types.inferred_runtime_types();
        if runtime_types.is_empty() {
            expression.clone()
        } else {
            expression.with_runtime_types(runtime_types)
        }
    }
}

impl<H, V, T> LatticeTrait for AbstractDomain<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    fn top() -> Self {
        Self::new(H::top(), V::top(), T::top())
    }

    fn bottom() -> Self {
        Self::new(H::bottom(), V::bottom(), T::bottom())
    }

    fn is_top(&self) -> bool {
        self.heap_domain.is_top() && self.value_domain.is_top() && self.type_domain.is_top()
    }

    fn is_bottom(&self) -> bool {
        self.heap_domain.is_bottom()
            && self.value_domain.is_bottom()
            && self.type_domain.is_bottom()
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self::new(
            self.heap_domain.lub(&other.heap_domain)?,
            self.value_domain.lub(&other.value_domain)?,
            self.type_domain.lub(&other.type_domain)?,
        ))
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self::new(
            self.heap_domain.glb(&other.heap_domain)?,
            self.value_domain.glb(&other.value_domain)?,
            self.type_domain.glb(&other.type_domain)?,
        ))
    }

    fn widening_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self::new(
            self.heap_domain.widening(&other.heap_domain)?,
            self.value_domain.widening(&other.value_domain)?,
            self.type_domain.widening(&other.type_domain)?,
        ))
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        Ok(self.heap_domain.less_or_equal(&other.heap_domain)?
            && self.value_domain.less_or_equal(&other.value_domain)?
            && self.type_domain.less_or_equal(&other.type_domain)?)
    }
}
