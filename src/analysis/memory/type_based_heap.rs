use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::{
    ExpressionSet, SymbolicExpression, SymbolicKind, ValueExpression,
};
use crate::analysis::memory::heap_domain::{HeapDomainTrait, HeapUpdate};
use crate::analysis::memory::identifier::{Identifier, IdentifierKind};
use crate::analysis::memory::rewriter::Rewriter;
use crate::analysis::memory::types::{Type, TypeCache, TypeSet};
use crate::analysis::program_point::{CodeLocation, ProgramPoint, ScopeToken};
use crate::analysis::satisfiability::Satisfiability;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// A field-insensitive heap abstraction with one weak location per allocated type
///
/// The state is the set of the names of the types allocated so far. It only grows.
#[derive(Clone, PartialEq)]
pub struct TypeBasedHeap {
    is_top: bool,
    is_bottom: bool,
    names: BTreeSet<String>,
}

impl TypeBasedHeap {
    pub fn new() -> Self {
        Self {
            is_top: false,
            is_bottom: false,
            names: BTreeSet::new(),
        }
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    fn with_names(&self, added: BTreeSet<String>) -> Self {
        if added.is_subset(&self.names) {
            return self.clone();
        }
        let mut result = self.clone();
        result.names.extend(added);
        result
    }

    /// Records the allocations found in `expression`
    fn process(&self, expression: &SymbolicExpression) -> Result<Self> {
        if self.is_top || self.is_bottom {
            return Ok(self.clone());
        }
        match &expression.kind {
            SymbolicKind::Constant(_)
            | SymbolicKind::Identifier(_)
            | SymbolicKind::PushAny
            | SymbolicKind::Skip => Ok(self.clone()),
            SymbolicKind::Unary { operand, .. } => self.process(operand),
            SymbolicKind::Binary { left, right, .. } => self.process(left)?.process(right),
            SymbolicKind::Ternary {
                left,
                middle,
                right,
                ..
            } => self.process(left)?.process(middle)?.process(right),
            SymbolicKind::AccessChild { container, child } => {
                self.process(container)?.process(child)
            }
            SymbolicKind::HeapAllocation => {
                let allocated = expression
                    .runtime_types_or_static()
                    .iter()
                    .filter(|t| t.is_in_memory_type())
                    .map(|t| format!("{:?}", t))
                    .collect::<BTreeSet<_>>();
                debug!("Allocation of {:?} in the type-based heap", allocated);
                Ok(self.with_names(allocated))
            }
            SymbolicKind::HeapReference(operand) | SymbolicKind::HeapDereference(operand) => {
                self.process(operand)
            }
        }
    }
}

impl Default for TypeBasedHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeBasedHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom {
            write!(f, "_|_")
        } else if self.is_top {
            write!(f, "#TOP#")
        } else {
            f.debug_set().entries(self.names.iter()).finish()
        }
    }
}

impl LatticeTrait for TypeBasedHeap {
    fn top() -> Self {
        Self {
            is_top: true,
            is_bottom: false,
            names: BTreeSet::new(),
        }
    }

    fn bottom() -> Self {
        Self {
            is_top: false,
            is_bottom: true,
            names: BTreeSet::new(),
        }
    }

    fn is_top(&self) -> bool {
        self.is_top
    }

    fn is_bottom(&self) -> bool {
        self.is_bottom
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(self.with_names(other.names.clone()))
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self {
            is_top: false,
            is_bottom: false,
            names: self.names.intersection(&other.names).cloned().collect(),
        })
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        Ok(other.names.is_superset(&self.names))
    }
}

impl HeapDomainTrait for TypeBasedHeap {
    fn assign(
        &self,
        _id: &Identifier,
        expression: &SymbolicExpression,
        _pp: &ProgramPoint,
    ) -> Result<HeapUpdate<Self>> {
        Ok(HeapUpdate::without_substitution(self.process(expression)?))
    }

    fn small_step_semantics(
        &self,
        expression: &SymbolicExpression,
        _pp: &ProgramPoint,
    ) -> Result<HeapUpdate<Self>> {
        Ok(HeapUpdate::without_substitution(self.process(expression)?))
    }

    fn assume(
        &self,
        _expression: &SymbolicExpression,
        _pp: &ProgramPoint,
    ) -> Result<HeapUpdate<Self>> {
        Ok(HeapUpdate::without_substitution(self.clone()))
    }

    fn satisfies(
        &self,
        _expression: &SymbolicExpression,
        _pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        Ok(Satisfiability::Unknown)
    }

    fn forget_identifier(&self, _id: &Identifier) -> Result<Self> {
        Ok(self.clone())
    }

    fn push_scope(&self, _token: &ScopeToken) -> Result<Self> {
        Ok(self.clone())
    }

    fn pop_scope(&self, _token: &ScopeToken) -> Result<Self> {
        Ok(self.clone())
    }

    fn rewrite(
        &self,
        expression: &SymbolicExpression,
        _pp: &ProgramPoint,
    ) -> Result<ExpressionSet<ValueExpression>> {
        TypeBasedRewriter.rewrite(expression)
    }

    fn representation(&self) -> Value {
        if self.is_bottom {
            Value::from("_|_")
        } else if self.is_top {
            Value::from("#TOP#")
        } else {
            Value::Array(self.names.iter().map(|n| Value::from(n.as_str())).collect())
        }
    }
}

/// Resolves heap expressions to the summary location of their type
pub struct TypeBasedRewriter;

impl TypeBasedRewriter {
    /// The weak location summarizing every instance of `inner`
    fn summary_location(inner: &TypeSet, location: &CodeLocation) -> ValueExpression {
        let summary_type = inner.common_supertype();
        let id = Identifier::heap_location(
            &format!("{:?}", summary_type),
            summary_type,
            true,
            location.clone(),
        );
        let expression = ValueExpression::identifier(id);
        if inner.is_empty() {
            expression
        } else {
            expression.with_runtime_types(inner.clone())
        }
    }

    fn pointer_to(location: &Identifier, expression: &SymbolicExpression) -> ValueExpression {
        let pointer_type = Type::reference_to(location.runtime_types_or_static());
        let id = Identifier::memory_pointer(
            pointer_type.clone(),
            location.clone(),
            expression.location.clone(),
        );
        let runtime_types = expression
            .runtime_types
            .clone()
            .unwrap_or_else(|| TypeCache::mk_singleton_set(pointer_type));
        ValueExpression::identifier(id).with_runtime_types(runtime_types)
    }
}

impl Rewriter for TypeBasedRewriter {
    fn rewrite_access_child(
        &self,
        expression: &SymbolicExpression,
        containers: &ExpressionSet<ValueExpression>,
        _children: &ExpressionSet<ValueExpression>,
    ) -> Result<ExpressionSet<ValueExpression>> {
        let mut result = ExpressionSet::new();
        for container in containers.iter() {
            match container.as_identifier() {
                Some(id) if id.is_memory_pointer() => {
                    for t in id.runtime_types_or_static().iter() {
                        if let Some(inner) = t.inner_types() {
                            result = result.add(Self::summary_location(inner, &expression.location));
                        }
                    }
                }
                // A summary location stands for all of its fields
                Some(id) if id.is_heap_location() => result = result.add(container.clone()),
                _ => {}
            }
        }
        Ok(result)
    }

    fn rewrite_heap_allocation(
        &self,
        expression: &SymbolicExpression,
    ) -> Result<ExpressionSet<ValueExpression>> {
        Ok(expression
            .runtime_types_or_static()
            .iter()
            .filter(|t| t.is_in_memory_type())
            .map(|t| {
                Self::summary_location(&TypeCache::mk_singleton_set(t.clone()), &expression.location)
            })
            .collect())
    }

    fn rewrite_heap_reference(
        &self,
        expression: &SymbolicExpression,
        operands: &ExpressionSet<ValueExpression>,
    ) -> Result<ExpressionSet<ValueExpression>> {
        Ok(operands
            .iter()
            .filter_map(|o| o.as_identifier())
            .filter(|id| id.is_heap_location())
            .map(|id| Self::pointer_to(id, expression))
            .collect())
    }

    fn rewrite_heap_dereference(
        &self,
        expression: &SymbolicExpression,
        operands: &ExpressionSet<ValueExpression>,
    ) -> Result<ExpressionSet<ValueExpression>> {
        let mut result = ExpressionSet::new();
        for operand in operands.iter() {
            let id = match operand.as_identifier() {
                Some(id) => id,
                None => continue,
            };
            match &id.kind {
                IdentifierKind::MemoryPointer { .. } => result = result.add(operand.clone()),
                IdentifierKind::Variable | IdentifierKind::OutOfScope { .. } => {
                    for t in id.runtime_types_or_static().iter() {
                        if let Some(inner) = t.inner_types() {
                            let location = Self::summary_location(inner, &expression.location);
                            if let Some(location_id) = location.as_identifier() {
                                let pointer = Identifier::memory_pointer(
                                    t.clone(),
                                    location_id.clone(),
                                    expression.location.clone(),
                                );
                                result = result.add(
                                    ValueExpression::identifier(pointer)
                                        .with_runtime_types(TypeCache::mk_singleton_set(t.clone())),
                                );
                            }
                        }
                    }
                }
                IdentifierKind::HeapLocation { .. } => {}
            }
        }
        Ok(result)
    }
}
