use absint_engine::analysis::abstract_domain::AbstractDomain;
use absint_engine::analysis::analysis_result::{Result, SemanticError};
use absint_engine::analysis::analysis_state::AnalysisState;
use absint_engine::analysis::call_semantics::{Call, InterproceduralAnalysis};
use absint_engine::analysis::lattices::lattice::LatticeTrait;
use absint_engine::analysis::memory::expression::{
    BinaryOperator, ExpressionSet, SymbolicExpression, UnaryOperator,
};
use absint_engine::analysis::memory::identifier::Identifier;
use absint_engine::analysis::memory::type_based_heap::TypeBasedHeap;
use absint_engine::analysis::memory::types::{Type, TypeCache};
use absint_engine::analysis::nonrelational::inferred_types::InferredTypes;
use absint_engine::analysis::nonrelational::nonrelational_domain::EnvironmentTrait;
use absint_engine::analysis::nonrelational::type_environment::TypeEnvironment;
use absint_engine::analysis::nonrelational::value_environment::ValueEnvironment;
use absint_engine::analysis::numerical::interval::Interval;
use absint_engine::analysis::program_point::{CodeLocation, ProgramPoint};
use absint_engine::analysis::satisfiability::Satisfiability;
use absint_engine::analysis::statement_store::StatementStore;
use absint_engine::analysis::symbols::Symbol;

type Heap = TypeBasedHeap;
type Values = ValueEnvironment<Interval>;
type Types = TypeEnvironment<InferredTypes>;
type State = AnalysisState<Heap, Values, Types>;

fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

fn loc(line: u32) -> CodeLocation {
    CodeLocation::new("program.rs", line, 5)
}

fn pp(line: u32) -> ProgramPoint {
    ProgramPoint::new(loc(line))
}

fn initial() -> State {
    State::new(AbstractDomain::new(
        TypeBasedHeap::new(),
        ValueEnvironment::new(),
        TypeEnvironment::new(),
    ))
}

fn var(name: &str) -> Identifier {
    Identifier::variable(name, Type::Int32, loc(0))
}

fn int(n: i64) -> SymbolicExpression {
    SymbolicExpression::int(n, loc(0))
}

fn id(name: &str) -> SymbolicExpression {
    SymbolicExpression::identifier(var(name))
}

fn binary(operator: BinaryOperator, left: SymbolicExpression, right: SymbolicExpression) -> SymbolicExpression {
    let static_type = if operator.is_comparison() || operator.is_logical() {
        Type::Boolean
    } else {
        Type::Int32
    };
    SymbolicExpression::binary(operator, left, right, static_type, loc(0))
}

#[test]
fn counting_loop_stabilizes_after_widening() {
    init_logger();
    let x = var("x");
    let guard = binary(BinaryOperator::Lt, id("x"), int(10));
    let increment = binary(BinaryOperator::Add, id("x"), int(1));

    let mut store = StatementStore::new();
    let entry = initial().assign(&x, &int(0), &pp(1)).unwrap();
    store.put(pp(1), entry.clone());
    let mut head = entry.clone();
    let mut iterations = 0;
    loop {
        iterations += 1;
        let body = head
            .assume(&guard, &pp(2))
            .unwrap()
            .assign(&x, &increment, &pp(3))
            .unwrap();
        store.put(pp(3), body.clone());
        let next = head.widening(&entry.lub(&body).unwrap()).unwrap();
        if next.less_or_equal(&head).unwrap() {
            break;
        }
        head = next;
    }
    assert_eq!(iterations, 2);
    assert_eq!(format!("{:?}", head.state.value_domain.get_state(&x)), "[0, +Inf]");
    assert_eq!(
        store.get_state(&pp(3)).state.value_domain.get_state(&x),
        Interval::new(1, 10)
    );

    let negated = SymbolicExpression::unary(UnaryOperator::LogicalNegation, guard.clone(), Type::Boolean, loc(4));
    let exit = head.assume(&negated, &pp(4)).unwrap();
    assert_eq!(format!("{:?}", exit.state.value_domain.get_state(&x)), "[10, +Inf]");
    assert_eq!(exit.satisfies(&guard, &pp(4)).unwrap(), Satisfiability::Unknown);
    let below_five = binary(BinaryOperator::Lt, id("x"), int(5));
    assert_eq!(exit.satisfies(&below_five, &pp(4)).unwrap(), Satisfiability::NotSatisfied);
    assert_eq!(
        exit.state.type_domain.get_state(&x).types(),
        &TypeCache::mk_singleton_set(Type::Int32)
    );
}

#[test]
fn infeasible_branch_empties_the_values() {
    init_logger();
    let state = initial().assign(&var("x"), &int(3), &pp(1)).unwrap();
    let impossible = binary(BinaryOperator::Gt, id("x"), int(7));
    assert_eq!(state.satisfies(&impossible, &pp(2)).unwrap(), Satisfiability::NotSatisfied);
    let pruned = state.assume(&impossible, &pp(2)).unwrap();
    assert!(pruned.state.value_domain.is_bottom());
    assert!(!pruned.is_bottom());
    assert_eq!(pruned.lub(&state).unwrap(), state);
}

#[test]
fn objects_are_summarized_by_type() {
    init_logger();
    let point = Type::unit("Point");
    let pointer_type = Type::reference_to(TypeCache::mk_singleton_set(point.clone()));
    let p = Identifier::variable("p", pointer_type.clone(), loc(0));
    let field_of_p = || {
        SymbolicExpression::access_child(
            SymbolicExpression::heap_dereference(SymbolicExpression::identifier(p.clone()), point.clone(), loc(0)),
            id("f"),
            Type::Int32,
            loc(0),
        )
    };

    let allocation = SymbolicExpression::heap_reference(
        SymbolicExpression::heap_allocation(point.clone(), loc(1)),
        pointer_type,
        loc(1),
    );
    let state = initial().assign(&p, &allocation, &pp(1)).unwrap();
    assert!(state.state.heap_domain.names().contains("Point"));

    let state = state
        .assign_expression(&field_of_p(), &int(1), &pp(2))
        .unwrap()
        .assign_expression(&field_of_p(), &int(2), &pp(3))
        .unwrap();
    let summary = state
        .computed_expressions()
        .only()
        .and_then(|e| e.as_identifier())
        .cloned()
        .unwrap();
    assert!(summary.is_weak());
    assert_eq!(state.state.value_domain.get_state(&summary), Interval::new(1, 2));
}

/// Resolves calls against a fixed set of members returning constants
struct Library {
    members: Vec<(&'static str, &'static str, i64)>,
}

impl InterproceduralAnalysis<Heap, Values, Types> for Library {
    fn get_abstract_result_of(
        &self,
        call: &Call,
        entry_state: &State,
        _parameters: &[ExpressionSet<SymbolicExpression>],
    ) -> Result<State> {
        let returned: ExpressionSet<SymbolicExpression> = self
            .members
            .iter()
            .filter(|(qualifier, name, _)| call.matches_member(qualifier, name, entry_state.aliasing()))
            .map(|(_, _, value)| SymbolicExpression::int(*value, call.location.clone()))
            .collect();
        if returned.is_empty() {
            return Err(SemanticError::CallResolution {
                call: format!("{:?}", call),
                reason: "no matching member".to_owned(),
            });
        }
        Ok(entry_state.with_computed_expressions(returned))
    }
}

#[test]
fn calls_resolve_through_aliases() {
    init_logger();
    let library = Library {
        members: vec![("numbers", "answer", 42), ("numbers", "guess", 7)],
    };
    let call = Call::new(loc(9), Some("math"), "answer", Type::Int32);
    assert!(call.expression_semantics(&library, &initial(), &[]).is_err());

    let aliased = initial().alias(Symbol::qualifier("numbers"), Symbol::qualifier("math"));
    let state = call.expression_semantics(&library, &aliased, &[]).unwrap();
    let meta = call.meta_variable();
    assert_eq!(state.state.value_domain.get_state(&meta), Interval::new(42, 42));

    let x = var("x");
    let stored = state
        .assign(&x, &SymbolicExpression::identifier(meta), &pp(10))
        .unwrap();
    assert_eq!(stored.state.value_domain.get_state(&x), Interval::new(42, 42));

    let unqualified = Call::new(loc(11), None, "guess", Type::Int32);
    let state = unqualified.expression_semantics(&library, &initial(), &[]).unwrap();
    assert_eq!(
        state.state.value_domain.get_state(&unqualified.meta_variable()),
        Interval::new(7, 7)
    );
}

#[test]
fn representation_of_a_full_state() {
    init_logger();
    let state = initial().assign(&var("x"), &int(5), &pp(1)).unwrap();
    assert_eq!(
        state.representation().to_string(),
        r#"{"expressions":["x"],"state":{"heap":[],"type":{"environment":{"x":["int32"]},"stack":["int32"]},"value":{"x":"[5, 5]"}}}"#
    );
}
