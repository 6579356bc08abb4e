use crate::analysis::abstract_domain::{TypeDomainTrait, ValueDomainTrait};
use crate::analysis::analysis_result::Result;
use crate::analysis::analysis_state::AnalysisState;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::{ExpressionSet, SymbolicExpression};
use crate::analysis::memory::heap_domain::HeapDomainTrait;
use crate::analysis::memory::identifier::Identifier;
use crate::analysis::memory::types::Type;
use crate::analysis::program_point::{CodeLocation, ProgramPoint};
use crate::analysis::symbols::{Symbol, SymbolAliasing};
use std::fmt;

/// Resolves calls and computes the state they return to the caller
///
/// The returned state leaves on its stack the expressions the callee returned,
/// nothing if the callee returns nothing.
pub trait InterproceduralAnalysis<H, V, T>
where
    H: HeapDomainTrait,
    V: ValueDomainTrait,
    T: TypeDomainTrait,
{
    fn get_abstract_result_of(
        &self,
        call: &Call,
        entry_state: &AnalysisState<H, V, T>,
        parameters: &[ExpressionSet<SymbolicExpression>],
    ) -> Result<AnalysisState<H, V, T>>;
}

/// A call site whose target is resolved by name
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub location: CodeLocation,
    /// The unit the target belongs to, if the call names one
    pub qualifier: Option<String>,
    pub target_name: String,
    pub static_type: Type,
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) if !qualifier.trim().is_empty() => {
                write!(f, "{}::{}() at {:?}", qualifier, self.target_name, self.location)
            }
            _ => write!(f, "{}() at {:?}", self.target_name, self.location),
        }
    }
}

impl Call {
    pub fn new(
        location: CodeLocation,
        qualifier: Option<&str>,
        target_name: &str,
        static_type: Type,
    ) -> Self {
        Call {
            location,
            qualifier: qualifier.map(String::from),
            target_name: target_name.to_owned(),
            static_type,
        }
    }

    pub fn program_point(&self) -> ProgramPoint {
        ProgramPoint::new(self.location.clone())
    }

    /// The variable holding the value returned by this call
    pub fn meta_variable(&self) -> Identifier {
        Identifier::variable(
            &format!("call_ret_value@{:?}", self.location),
            self.static_type.clone(),
            self.location.clone(),
        )
    }

    /// Whether the member `qualifier::name` may be the target of this call,
    /// directly or through one of the aliases known in `aliasing`
    pub fn matches_member(&self, qualifier: &str, name: &str, aliasing: &SymbolAliasing) -> bool {
        let qualified_aliases = aliasing.get_aliases(&Symbol::qualified_name(qualifier, name));
        let matched = qualified_aliases.iter().any(|alias| match alias {
            Symbol::QualifiedName { qualifier, name } => self.matches_name(qualifier, name),
            _ => false,
        });
        if matched {
            return true;
        }

        let qualifier_aliases = aliasing.get_aliases(&Symbol::qualifier(qualifier));
        let matched = qualifier_aliases.iter().any(|alias| match alias {
            Symbol::Qualifier(qualifier) => self.matches_name(qualifier, name),
            _ => false,
        });
        if matched {
            return true;
        }

        let name_aliases = aliasing.get_aliases(&Symbol::name(name));
        let matched = name_aliases.iter().any(|alias| match alias {
            Symbol::Name(name) => self.matches_name(qualifier, name),
            _ => false,
        });
        matched || self.matches_name(qualifier, name)
    }

    /// A call without a qualifier matches members of any unit
    fn matches_name(&self, qualifier: &str, name: &str) -> bool {
        if name != self.target_name {
            return false;
        }
        match &self.qualifier {
            Some(own) if !own.trim().is_empty() => own == qualifier,
            _ => true,
        }
    }

    /// Computes the state after this call and stores its result into the meta variable,
    /// which is left on the stack
    pub fn expression_semantics<H, V, T, A>(
        &self,
        analysis: &A,
        entry_state: &AnalysisState<H, V, T>,
        parameters: &[ExpressionSet<SymbolicExpression>],
    ) -> Result<AnalysisState<H, V, T>>
    where
        H: HeapDomainTrait,
        V: ValueDomainTrait,
        T: TypeDomainTrait,
        A: InterproceduralAnalysis<H, V, T>,
    {
        let pp = self.program_point();
        let state = entry_state.with_computed_expressions(ExpressionSet::new());
        let returned = analysis.get_abstract_result_of(self, &state, parameters)?;
        let computed = returned.computed_expressions();

        let returns_nothing = self.static_type.is_void()
            || (self.static_type.is_untyped() && computed.is_empty())
            || computed.only().map_or(false, SymbolicExpression::is_skip);
        if returns_nothing {
            debug!("{:?} returns nothing", self);
            return returned.small_step_semantics(&SymbolicExpression::skip(self.location.clone()), &pp);
        }

        let meta = self.meta_variable();
        let meta_expression = SymbolicExpression::identifier(meta.clone());
        let mut result = AnalysisState::bottom();
        for expression in computed.iter() {
            let stored = returned
                .assign(&meta, expression, &pp)?
                .small_step_semantics(&meta_expression, &pp)?;
            result = result.lub(&stored)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::abstract_domain::AbstractDomain;
    use crate::analysis::analysis_result::SemanticError;
    use crate::analysis::memory::type_based_heap::TypeBasedHeap;
    use crate::analysis::nonrelational::inferred_types::InferredTypes;
    use crate::analysis::nonrelational::nonrelational_domain::EnvironmentTrait;
    use crate::analysis::nonrelational::type_environment::TypeEnvironment;
    use crate::analysis::nonrelational::value_environment::ValueEnvironment;
    use crate::analysis::numerical::interval::Interval;

    type State = AnalysisState<
        TypeBasedHeap,
        ValueEnvironment<Interval>,
        TypeEnvironment<InferredTypes>,
    >;

    /// Returns one constant for each entry, or nothing at all
    struct ConstantResolver {
        returns: Vec<i64>,
    }

    impl InterproceduralAnalysis<TypeBasedHeap, ValueEnvironment<Interval>, TypeEnvironment<InferredTypes>>
        for ConstantResolver
    {
        fn get_abstract_result_of(
            &self,
            call: &Call,
            entry_state: &State,
            _parameters: &[ExpressionSet<SymbolicExpression>],
        ) -> Result<State> {
            assert!(entry_state.computed_expressions().is_empty());
            let returned = self
                .returns
                .iter()
                .map(|n| SymbolicExpression::int(*n, call.location.clone()))
                .collect();
            Ok(entry_state.with_computed_expressions(returned))
        }
    }

    struct FailingResolver;

    impl InterproceduralAnalysis<TypeBasedHeap, ValueEnvironment<Interval>, TypeEnvironment<InferredTypes>>
        for FailingResolver
    {
        fn get_abstract_result_of(
            &self,
            call: &Call,
            _entry_state: &State,
            _parameters: &[ExpressionSet<SymbolicExpression>],
        ) -> Result<State> {
            Err(SemanticError::CallResolution {
                call: format!("{:?}", call),
                reason: "no target".to_owned(),
            })
        }
    }

    fn initial() -> State {
        State::new(AbstractDomain::new(
            TypeBasedHeap::new(),
            ValueEnvironment::new(),
            TypeEnvironment::new(),
        ))
        .with_computed_expressions(ExpressionSet::singleton(SymbolicExpression::int(
            0,
            CodeLocation::Synthetic,
        )))
    }

    fn call(static_type: Type) -> Call {
        Call::new(CodeLocation::new("main.rs", 7, 5), Some("util"), "answer", static_type)
    }

    #[test]
    fn returned_values_are_stored_into_the_meta_variable() {
        let call = call(Type::Int32);
        let resolver = ConstantResolver { returns: vec![2, 9] };
        let state = call.expression_semantics(&resolver, &initial(), &[]).unwrap();
        let meta = call.meta_variable();
        assert_eq!(
            state.computed_expressions(),
            &ExpressionSet::singleton(SymbolicExpression::identifier(meta.clone()))
        );
        assert_eq!(state.state.value_domain.get_state(&meta), Interval::new(2, 9));
        assert_eq!(format!("{:?}", meta), "call_ret_value@main.rs:7:5");
    }

    #[test]
    fn void_and_empty_results_push_skip() {
        let skip = ExpressionSet::singleton(SymbolicExpression::skip(CodeLocation::new("main.rs", 7, 5)));
        let returning_one = ConstantResolver { returns: vec![1] };
        let state = call(Type::Void)
            .expression_semantics(&returning_one, &initial(), &[])
            .unwrap();
        assert_eq!(state.computed_expressions(), &skip);
        assert!(!state.state.value_domain.function().contains_key(&call(Type::Void).meta_variable()));

        let returning_nothing = ConstantResolver { returns: vec![] };
        let state = call(Type::Untyped)
            .expression_semantics(&returning_nothing, &initial(), &[])
            .unwrap();
        assert_eq!(state.computed_expressions(), &skip);
    }

    #[test]
    fn resolution_errors_are_propagated() {
        match call(Type::Int32).expression_semantics(&FailingResolver, &initial(), &[]) {
            Err(SemanticError::CallResolution { call, .. }) => {
                assert_eq!(call, "util::answer() at main.rs:7:5")
            }
            other => panic!("expected a resolution error, got {:?}", other),
        }
    }

    #[test]
    fn members_match_by_name_and_qualifier() {
        let aliasing = SymbolAliasing::new();
        let qualified = call(Type::Int32);
        assert!(qualified.matches_member("util", "answer", &aliasing));
        assert!(!qualified.matches_member("other", "answer", &aliasing));
        assert!(!qualified.matches_member("util", "question", &aliasing));

        let unqualified = Call::new(CodeLocation::Synthetic, None, "answer", Type::Int32);
        assert!(unqualified.matches_member("other", "answer", &aliasing));
        let blank = Call::new(CodeLocation::Synthetic, Some("  "), "answer", Type::Int32);
        assert!(blank.matches_member("other", "answer", &aliasing));
    }

    #[test]
    fn members_match_through_aliases() {
        let call = call(Type::Int32);
        let by_name = SymbolAliasing::new().alias(Symbol::name("reply"), Symbol::name("answer"));
        assert!(call.matches_member("util", "reply", &by_name));
        assert!(!call.matches_member("other", "reply", &by_name));

        let by_qualifier = SymbolAliasing::new().alias(Symbol::qualifier("helpers"), Symbol::qualifier("util"));
        assert!(call.matches_member("helpers", "answer", &by_qualifier));

        let by_qualified_name = SymbolAliasing::new().alias(
            Symbol::qualified_name("lib", "reply"),
            Symbol::qualified_name("util", "answer"),
        );
        assert!(call.matches_member("lib", "reply", &by_qualified_name));
        assert!(!call.matches_member("lib", "other", &by_qualified_name));

        // aliases of the wrong kind are ignored
        let mixed = SymbolAliasing::new().alias(Symbol::name("reply"), Symbol::qualifier("answer"));
        assert!(!call.matches_member("util", "reply", &mixed));
    }
}
