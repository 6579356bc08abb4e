use crate::analysis::abstract_domain::{AbstractDomain, TypeDomainTrait, ValueDomainTrait};
use crate::analysis::analysis_result::{Result, SemanticError};
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::{ExpressionSet, SymbolicExpression};
use crate::analysis::memory::heap_domain::HeapDomainTrait;
use crate::analysis::memory::identifier::Identifier;
use crate::analysis::program_point::{ProgramPoint, ScopeToken};
use crate::analysis::satisfiability::Satisfiability;
use crate::analysis::symbols::{Symbol, SymbolAliasing};
use log_derive::logfn_inputs;
use serde_json::{json, Value};
use std::fmt;

/// The abstract state at a program point, together with the expressions left on the
/// stack by the last evaluation and the known symbol aliases
#[derive(Clone, PartialEq)]
pub struct AnalysisState<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    pub state: AbstractDomain<H, V, T>,
    aliasing: SymbolAliasing,
    computed_expressions: ExpressionSet<SymbolicExpression>,
}

impl<H, V, T> fmt::Debug for AnalysisState<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}, stack: {:?}", self.state, self.computed_expressions)
    }
}

impl<H, V, T> AnalysisState<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    pub fn new(state: AbstractDomain<H, V, T>) -> Self {
        Self {
            state,
            aliasing: SymbolAliasing::new(),
            computed_expressions: ExpressionSet::new(),
        }
    }

    pub fn computed_expressions(&self) -> &ExpressionSet<SymbolicExpression> {
        &self.computed_expressions
    }

    pub fn with_computed_expressions(&self, expressions: ExpressionSet<SymbolicExpression>) -> Self {
        Self {
            state: self.state.clone(),
            aliasing: self.aliasing.clone(),
            computed_expressions: expressions,
        }
    }

    pub fn aliasing(&self) -> &SymbolAliasing {
        &self.aliasing
    }

    /// Records that `alias` may be used in place of `to_alias` when resolving calls
    pub fn alias(&self, to_alias: Symbol, alias: Symbol) -> Self {
        Self {
            state: self.state.clone(),
            aliasing: self.aliasing.alias(to_alias, alias),
            computed_expressions: self.computed_expressions.clone(),
        }
    }

    fn with_state(&self, state: AbstractDomain<H, V, T>) -> Self {
        Self {
            state,
            aliasing: self.aliasing.clone(),
            computed_expressions: self.computed_expressions.clone(),
        }
    }

    /// Assigns `expression` to `id`, leaving `id` on the stack
    #[logfn_inputs(TRACE)]
    pub fn assign(
        &self,
        id: &Identifier,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<Self> {
        let state = self.state.assign(id, expression, pp)?;
        Ok(Self {
            state,
            aliasing: self.aliasing.clone(),
            computed_expressions: ExpressionSet::singleton(SymbolicExpression::identifier(
                id.clone(),
            )),
        })
    }

    /// Assigns `expression` to every location `target` may denote, leaving them on the stack
    pub fn assign_expression(
        &self,
        target: &SymbolicExpression,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<Self> {
        if let Some(id) = target.as_identifier() {
            return self.assign(id, expression, pp);
        }
        let rewritten = self.state.rewrite(target, pp)?;
        // a target denoting no location leaves a bottom state
        let mut state = AbstractDomain::bottom();
        let mut assigned = ExpressionSet::new();
        for location in rewritten.iter() {
            let id = location
                .as_identifier()
                .ok_or_else(|| SemanticError::NotAnIdentifier {
                    target: format!("{:?}", target),
                    rewritten: format!("{:?}", location),
                })?;
            debug!("{:?} denotes {:?}", target, id);
            state = state.lub(&self.state.assign(id, expression, pp)?)?;
            assigned = assigned.add(SymbolicExpression::identifier(id.clone()));
        }
        Ok(Self {
            state,
            aliasing: self.aliasing.clone(),
            computed_expressions: assigned,
        })
    }

    /// Evaluates `expression`, leaving it on the stack
    #[logfn_inputs(TRACE)]
    pub fn small_step_semantics(
        &self,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<Self> {
        let state = self.state.small_step_semantics(expression, pp)?;
        Ok(Self {
            state,
            aliasing: self.aliasing.clone(),
            computed_expressions: ExpressionSet::singleton(expression.clone()),
        })
    }

    #[logfn_inputs(TRACE)]
    pub fn assume(&self, expression: &SymbolicExpression, pp: &ProgramPoint) -> Result<Self> {
        Ok(self.with_state(self.state.assume(expression, pp)?))
    }

    #[logfn_inputs(TRACE)]
    pub fn satisfies(
        &self,
        expression: &SymbolicExpression,
        pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        self.state.satisfies(expression, pp)
    }

    pub fn forget_identifier(&self, id: &Identifier) -> Result<Self> {
        Ok(self.with_state(self.state.forget_identifier(id)?))
    }

    pub fn push_scope(&self, token: &ScopeToken) -> Result<Self> {
        Ok(Self {
            state: self.state.push_scope(token)?,
            aliasing: self.aliasing.clone(),
            computed_expressions: self
                .computed_expressions
                .iter()
                .map(|e| e.push_scope(token))
                .collect(),
        })
    }

    /// Expressions that mention variables of the closed scope are dropped from the stack
    pub fn pop_scope(&self, token: &ScopeToken) -> Result<Self> {
        Ok(Self {
            state: self.state.pop_scope(token)?,
            aliasing: self.aliasing.clone(),
            computed_expressions: self
                .computed_expressions
                .iter()
                .filter_map(|e| e.pop_scope(token))
                .collect(),
        })
    }

    pub fn representation(&self) -> Value {
        json!({
            "state": self.state.representation(),
            "expressions": self.computed_expressions.representation(),
        })
    }
}

impl<H, V, T> LatticeTrait for AnalysisState<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    fn top() -> Self {
        Self {
            state: AbstractDomain::top(),
            aliasing: SymbolAliasing::top(),
            computed_expressions: ExpressionSet::new(),
        }
    }

    fn bottom() -> Self {
        Self {
            state: AbstractDomain::bottom(),
            aliasing: SymbolAliasing::bottom(),
            computed_expressions: ExpressionSet::new(),
        }
    }

    /// The stack does not count: a top state may still have pending expressions
    fn is_top(&self) -> bool {
        self.state.is_top()
    }

    fn is_bottom(&self) -> bool {
        self.state.is_bottom()
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self {
            state: self.state.lub(&other.state)?,
            aliasing: self.aliasing.lub(&other.aliasing)?,
            computed_expressions: self.computed_expressions.lub(&other.computed_expressions)?,
        })
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self {
            state: self.state.glb(&other.state)?,
            aliasing: self.aliasing.glb(&other.aliasing)?,
            computed_expressions: self.computed_expressions.glb(&other.computed_expressions)?,
        })
    }

    fn widening_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self {
            state: self.state.widening(&other.state)?,
            aliasing: self.aliasing.lub(&other.aliasing)?,
            computed_expressions: self.computed_expressions.lub(&other.computed_expressions)?,
        })
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        Ok(self.state.less_or_equal(&other.state)?
            && self
                .computed_expressions
                .less_or_equal(&other.computed_expressions)?
            && self.aliasing.less_or_equal(&other.aliasing)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::memory::expression::BinaryOperator;
    use crate::analysis::memory::type_based_heap::TypeBasedHeap;
    use crate::analysis::memory::types::{Type, TypeCache};
    use crate::analysis::nonrelational::inferred_types::InferredTypes;
    use crate::analysis::nonrelational::nonrelational_domain::EnvironmentTrait;
    use crate::analysis::nonrelational::type_environment::TypeEnvironment;
    use crate::analysis::nonrelational::value_environment::ValueEnvironment;
    use crate::analysis::numerical::interval::Interval;
    use crate::analysis::program_point::CodeLocation;

    type State = AnalysisState<
        TypeBasedHeap,
        ValueEnvironment<Interval>,
        TypeEnvironment<InferredTypes>,
    >;

    fn pp() -> ProgramPoint {
        ProgramPoint::new(CodeLocation::new("test.rs", 1, 1))
    }

    fn initial() -> State {
        State::new(AbstractDomain::new(
            TypeBasedHeap::new(),
            ValueEnvironment::new(),
            TypeEnvironment::new(),
        ))
    }

    fn var(name: &str) -> Identifier {
        Identifier::variable(name, Type::Int32, CodeLocation::Synthetic)
    }

    fn int(n: i64) -> SymbolicExpression {
        SymbolicExpression::int(n, CodeLocation::Synthetic)
    }

    #[test]
    fn assignment_leaves_the_identifier_on_the_stack() {
        let state = initial().assign(&var("x"), &int(4), &pp()).unwrap();
        assert_eq!(
            state.computed_expressions(),
            &ExpressionSet::singleton(SymbolicExpression::identifier(var("x")))
        );
        let sum = SymbolicExpression::binary(
            BinaryOperator::Add,
            SymbolicExpression::identifier(var("x")),
            int(1),
            Type::Int32,
            CodeLocation::Synthetic,
        );
        let evaluated = state.small_step_semantics(&sum, &pp()).unwrap();
        assert_eq!(evaluated.computed_expressions(), &ExpressionSet::singleton(sum));
        let assumed = evaluated
            .assume(
                &SymbolicExpression::binary(
                    BinaryOperator::Lt,
                    SymbolicExpression::identifier(var("x")),
                    int(9),
                    Type::Boolean,
                    CodeLocation::Synthetic,
                ),
                &pp(),
            )
            .unwrap();
        assert_eq!(assumed.computed_expressions(), evaluated.computed_expressions());
    }

    #[test]
    fn assigning_through_a_pointer_writes_the_summary() {
        let object = Type::unit("Point");
        let pointer_type = Type::reference_to(TypeCache::mk_singleton_set(object.clone()));
        let p = Identifier::variable("p", pointer_type, CodeLocation::Synthetic);
        let field = SymbolicExpression::access_child(
            SymbolicExpression::heap_dereference(
                SymbolicExpression::identifier(p),
                object,
                CodeLocation::Synthetic,
            ),
            SymbolicExpression::identifier(var("x")),
            Type::Int32,
            CodeLocation::Synthetic,
        );
        let state = initial().assign_expression(&field, &int(3), &pp()).unwrap();
        let targets = state.computed_expressions();
        assert_eq!(targets.len(), 1);
        let summary = targets.iter().next().unwrap().as_identifier().unwrap().clone();
        assert!(summary.is_weak());
        assert_eq!(
            state.state.value_domain.get_state(&summary),
            Interval::new(3, 3)
        );
    }

    #[test]
    fn assigning_to_no_location_is_bottom() {
        let state = initial()
            .alias(Symbol::name("f"), Symbol::name("g"))
            .assign(&var("x"), &int(4), &pp())
            .unwrap();
        let nowhere = SymbolicExpression::heap_allocation(Type::Int32, CodeLocation::Synthetic);
        let result = state.assign_expression(&nowhere, &int(1), &pp()).unwrap();
        assert!(result.is_bottom());
        assert!(result.computed_expressions().is_empty());
        assert_eq!(result.aliasing(), state.aliasing());
    }

    #[test]
    fn constants_are_not_assignable() {
        let result = initial().assign_expression(&int(1), &int(2), &pp());
        match result {
            Err(SemanticError::NotAnIdentifier { .. }) => {}
            other => panic!("expected a rewriting error, got {:?}", other),
        }
    }

    #[test]
    fn stack_survives_top_and_scopes() {
        let token = ScopeToken::new(CodeLocation::new("test.rs", 2, 2));
        let state = initial().assign(&var("x"), &int(4), &pp()).unwrap();
        let pushed = state.push_scope(&token).unwrap();
        let hidden = pushed.computed_expressions().iter().next().unwrap().clone();
        assert_ne!(hidden, SymbolicExpression::identifier(var("x")));
        let popped = pushed.pop_scope(&token).unwrap();
        assert_eq!(popped.computed_expressions(), state.computed_expressions());
        assert!(state.pop_scope(&token).unwrap().computed_expressions().is_empty());

        let top = State::top().with_computed_expressions(ExpressionSet::singleton(int(1)));
        assert!(top.is_top());
        assert_eq!(top.computed_expressions().len(), 1);
        assert!(State::bottom().computed_expressions().is_empty());
    }

    #[test]
    fn lattice_combines_the_stacks() {
        let a = initial().assign(&var("x"), &int(1), &pp()).unwrap();
        let b = initial().assign(&var("y"), &int(2), &pp()).unwrap();
        let joined = a.lub(&b).unwrap();
        assert_eq!(joined.computed_expressions().len(), 2);
        assert!(a.less_or_equal(&joined).unwrap());
        assert!(!joined.less_or_equal(&a).unwrap());
    }

    #[test]
    fn aliases_are_recorded() {
        let state = initial().alias(Symbol::name("foo"), Symbol::name("bar"));
        assert!(state
            .aliasing()
            .get_aliases(&Symbol::name("foo"))
            .contains(&Symbol::name("bar")));
        assert_eq!(
            state.representation().to_string(),
            r#"{"expressions":[],"state":{"heap":[],"type":{"environment":{},"stack":"_|_"},"value":{}}}"#
        );
    }
}
