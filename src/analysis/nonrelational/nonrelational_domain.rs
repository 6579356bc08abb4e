use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::{
    BinaryOperator, Constant, TernaryOperator, UnaryOperator, ValueExpression, ValueKind,
};
use crate::analysis::memory::identifier::Identifier;
use crate::analysis::memory::types::{Type, TypeSet};
use crate::analysis::program_point::ProgramPoint;
use crate::analysis::satisfiability::Satisfiability;
use serde_json::Value;
use std::fmt;

/// A map from identifiers to the values of a non-relational domain
pub trait EnvironmentTrait<D>: LatticeTrait {
    fn get_state(&self, id: &Identifier) -> D;
    fn put_state(&self, id: Identifier, value: D) -> Self;
}

/// Generic API for non-relational domains
///
/// `eval`, `satisfies` and `assume` dispatch on the shape of the expression and call the
/// hooks below. A domain overrides only the hooks it can answer precisely; the others
/// evaluate to top, are satisfied with an unknown verdict, and leave the environment
/// unchanged when assumed.
pub trait NonRelationalDomainTrait: LatticeTrait + fmt::Debug {
    fn eval<E: EnvironmentTrait<Self>>(
        expression: &ValueExpression,
        env: &E,
        pp: &ProgramPoint,
    ) -> Result<Self> {
        match &expression.kind {
            ValueKind::Identifier(id) => Self::eval_identifier(id, env, pp),
            ValueKind::Constant(Constant::Null) => Self::eval_null_constant(pp),
            ValueKind::Constant(c) => Self::eval_non_null_constant(c, &expression.static_type, pp),
            ValueKind::PushAny => Self::eval_push_any(&expression.static_type, pp),
            ValueKind::Skip => Ok(Self::bottom()),
            ValueKind::Unary { operator, operand } => {
                let arg = Self::eval(operand, env, pp)?;
                if arg.is_bottom() {
                    return Ok(arg);
                }
                Self::eval_unary_expression(*operator, &arg, pp)
            }
            ValueKind::Binary {
                operator,
                left,
                right,
            } => {
                let l = Self::eval(left, env, pp)?;
                if l.is_bottom() {
                    return Ok(l);
                }
                let r = Self::eval(right, env, pp)?;
                if r.is_bottom() {
                    return Ok(r);
                }
                Self::eval_binary_expression(*operator, &l, &r, pp)
            }
            ValueKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => {
                let l = Self::eval(left, env, pp)?;
                let m = Self::eval(middle, env, pp)?;
                let r = Self::eval(right, env, pp)?;
                if l.is_bottom() || m.is_bottom() || r.is_bottom() {
                    return Ok(Self::bottom());
                }
                Self::eval_ternary_expression(*operator, &l, &m, &r, pp)
            }
        }
    }

    fn satisfies<E: EnvironmentTrait<Self>>(
        expression: &ValueExpression,
        env: &E,
        pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        match &expression.kind {
            ValueKind::Identifier(id) => Self::satisfies_abstract_value(&env.get_state(id), pp),
            ValueKind::Constant(Constant::Null) => Self::satisfies_null_constant(pp),
            ValueKind::Constant(c) => Self::satisfies_non_null_constant(c, pp),
            ValueKind::PushAny | ValueKind::Skip => Ok(Satisfiability::Unknown),
            ValueKind::Unary {
                operator: UnaryOperator::LogicalNegation,
                operand,
            } => Ok(Self::satisfies(operand, env, pp)?.negate()),
            ValueKind::Unary { operator, operand } => {
                let arg = Self::eval(operand, env, pp)?;
                if arg.is_bottom() {
                    return Ok(Satisfiability::Bottom);
                }
                Self::satisfies_unary_expression(*operator, &arg, pp)
            }
            ValueKind::Binary {
                operator: BinaryOperator::And,
                left,
                right,
            } => Ok(Self::satisfies(left, env, pp)?.and(Self::satisfies(right, env, pp)?)),
            ValueKind::Binary {
                operator: BinaryOperator::Or,
                left,
                right,
            } => Ok(Self::satisfies(left, env, pp)?.or(Self::satisfies(right, env, pp)?)),
            ValueKind::Binary {
                operator,
                left,
                right,
            } => {
                let l = Self::eval(left, env, pp)?;
                let r = Self::eval(right, env, pp)?;
                if l.is_bottom() || r.is_bottom() {
                    return Ok(Satisfiability::Bottom);
                }
                Self::satisfies_binary_expression(*operator, &l, &r, pp)
            }
            ValueKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => {
                let l = Self::eval(left, env, pp)?;
                let m = Self::eval(middle, env, pp)?;
                let r = Self::eval(right, env, pp)?;
                if l.is_bottom() || m.is_bottom() || r.is_bottom() {
                    return Ok(Satisfiability::Bottom);
                }
                Self::satisfies_ternary_expression(*operator, &l, &m, &r, pp)
            }
        }
    }

    /// Refines `env` with the knowledge that `expression` holds
    fn assume<E: EnvironmentTrait<Self>>(
        env: E,
        expression: &ValueExpression,
        pp: &ProgramPoint,
    ) -> Result<E> {
        match &expression.kind {
            ValueKind::Unary { operator, operand } => {
                if *operator == UnaryOperator::LogicalNegation {
                    let rewritten = expression.remove_negations();
                    if rewritten != *expression {
                        return Self::assume(env, &rewritten, pp);
                    }
                }
                Self::assume_unary_expression(env, *operator, operand, pp)
            }
            ValueKind::Binary {
                operator: BinaryOperator::And,
                left,
                right,
            } => {
                let first = Self::assume(env, left, pp)?;
                Self::assume(first, right, pp)
            }
            ValueKind::Binary {
                operator: BinaryOperator::Or,
                left,
                right,
            } => {
                let l = Self::assume(env.clone(), left, pp)?;
                let r = Self::assume(env, right, pp)?;
                l.lub(&r)
            }
            ValueKind::Binary {
                operator,
                left,
                right,
            } => Self::assume_binary_expression(env, *operator, left, right, pp),
            ValueKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => Self::assume_ternary_expression(env, *operator, left, middle, right, pp),
            ValueKind::Identifier(_)
            | ValueKind::Constant(_)
            | ValueKind::PushAny
            | ValueKind::Skip => Ok(env),
        }
    }

    fn eval_identifier<E: EnvironmentTrait<Self>>(
        id: &Identifier,
        env: &E,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        Ok(env.get_state(id))
    }

    fn eval_null_constant(_pp: &ProgramPoint) -> Result<Self> {
        Ok(Self::top())
    }

    fn eval_non_null_constant(
        _constant: &Constant,
        _static_type: &Type,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        Ok(Self::top())
    }

    fn eval_push_any(_static_type: &Type, _pp: &ProgramPoint) -> Result<Self> {
        Ok(Self::top())
    }

    fn eval_unary_expression(
        _operator: UnaryOperator,
        _arg: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        Ok(Self::top())
    }

    fn eval_binary_expression(
        _operator: BinaryOperator,
        _left: &Self,
        _right: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        Ok(Self::top())
    }

    fn eval_ternary_expression(
        _operator: TernaryOperator,
        _left: &Self,
        _middle: &Self,
        _right: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        Ok(Self::top())
    }

    fn satisfies_abstract_value(_value: &Self, _pp: &ProgramPoint) -> Result<Satisfiability> {
        Ok(Satisfiability::Unknown)
    }

    fn satisfies_null_constant(_pp: &ProgramPoint) -> Result<Satisfiability> {
        Ok(Satisfiability::Unknown)
    }

    fn satisfies_non_null_constant(
        _constant: &Constant,
        _pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        Ok(Satisfiability::Unknown)
    }

    fn satisfies_unary_expression(
        _operator: UnaryOperator,
        _arg: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        Ok(Satisfiability::Unknown)
    }

    fn satisfies_binary_expression(
        _operator: BinaryOperator,
        _left: &Self,
        _right: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        Ok(Satisfiability::Unknown)
    }

    fn satisfies_ternary_expression(
        _operator: TernaryOperator,
        _left: &Self,
        _middle: &Self,
        _right: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        Ok(Satisfiability::Unknown)
    }

    fn assume_unary_expression<E: EnvironmentTrait<Self>>(
        env: E,
        _operator: UnaryOperator,
        _operand: &ValueExpression,
        _pp: &ProgramPoint,
    ) -> Result<E> {
        Ok(env)
    }

    fn assume_binary_expression<E: EnvironmentTrait<Self>>(
        env: E,
        _operator: BinaryOperator,
        _left: &ValueExpression,
        _right: &ValueExpression,
        _pp: &ProgramPoint,
    ) -> Result<E> {
        Ok(env)
    }

    fn assume_ternary_expression<E: EnvironmentTrait<Self>>(
        env: E,
        _operator: TernaryOperator,
        _left: &ValueExpression,
        _middle: &ValueExpression,
        _right: &ValueExpression,
        _pp: &ProgramPoint,
    ) -> Result<E> {
        Ok(env)
    }

    /// Whether the domain keeps a binding for `id`; pointers and heap objects are left out by default
    fn tracks_identifier(id: &Identifier) -> bool {
        has_plain_values(&id.runtime_types_or_static())
    }

    /// Whether the domain can evaluate `expression` at all
    fn can_process(expression: &ValueExpression) -> bool {
        has_plain_values(&expression.runtime_types_or_static())
    }

    fn representation(&self) -> Value;
}

fn has_plain_values(types: &TypeSet) -> bool {
    types.is_empty()
        || types
            .iter()
            .any(|t| !t.is_pointer_type() && !t.is_in_memory_type())
}

/// A non-relational domain whose values are sets of runtime types
pub trait NonRelationalTypeDomainTrait: NonRelationalDomainTrait {
    /// The runtime types this value stands for; empty when nothing is known
    fn runtime_types(&self) -> TypeSet;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::memory::types::TypeCache;
    use crate::analysis::nonrelational::value_environment::ValueEnvironment;
    use crate::analysis::program_point::CodeLocation;

    /// The smallest domain: two values, overriding nothing but the lattice operations
    #[derive(Clone, Debug, PartialEq)]
    enum Stub {
        Top,
        Bottom,
    }

    impl LatticeTrait for Stub {
        fn top() -> Self {
            Stub::Top
        }
        fn bottom() -> Self {
            Stub::Bottom
        }
        fn is_top(&self) -> bool {
            *self == Stub::Top
        }
        fn is_bottom(&self) -> bool {
            *self == Stub::Bottom
        }
        fn lub_aux(&self, _other: &Self) -> Result<Self> {
            Ok(Stub::Top)
        }
        fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
            Ok(self == other)
        }
    }

    impl NonRelationalDomainTrait for Stub {
        fn representation(&self) -> Value {
            Value::from(format!("{:?}", self))
        }
    }

    #[derive(Debug)]
    enum Expected {
        Value(Stub),
        Verdict(Satisfiability),
        Environment(ValueEnvironment<Stub>),
    }

    fn x() -> ValueExpression {
        ValueExpression::identifier(Identifier::variable("x", Type::Int32, CodeLocation::Synthetic))
    }

    #[test]
    fn unoverridden_hooks_follow_the_default_contract() {
        let pp = ProgramPoint::synthetic();
        let env = ValueEnvironment::<Stub>::new()
            .put_state(x().as_identifier().unwrap().clone(), Stub::Bottom);
        let one = Constant::Int(rug::Integer::from(1));
        let v = Stub::Bottom;
        let (e1, e2, e3) = (x(), x(), x());
        let table: Vec<(&str, Expected, Expected)> = vec![
            (
                "eval_null_constant",
                Expected::Value(Stub::eval_null_constant(&pp).unwrap()),
                Expected::Value(Stub::Top),
            ),
            (
                "eval_non_null_constant",
                Expected::Value(Stub::eval_non_null_constant(&one, &Type::Int32, &pp).unwrap()),
                Expected::Value(Stub::Top),
            ),
            (
                "eval_push_any",
                Expected::Value(Stub::eval_push_any(&Type::Int32, &pp).unwrap()),
                Expected::Value(Stub::Top),
            ),
            (
                "eval_unary_expression",
                Expected::Value(
                    Stub::eval_unary_expression(UnaryOperator::NumericNegation, &v, &pp).unwrap(),
                ),
                Expected::Value(Stub::Top),
            ),
            (
                "eval_binary_expression",
                Expected::Value(
                    Stub::eval_binary_expression(BinaryOperator::Add, &v, &v, &pp).unwrap(),
                ),
                Expected::Value(Stub::Top),
            ),
            (
                "eval_ternary_expression",
                Expected::Value(
                    Stub::eval_ternary_expression(TernaryOperator::StringReplace, &v, &v, &v, &pp)
                        .unwrap(),
                ),
                Expected::Value(Stub::Top),
            ),
            (
                "satisfies_abstract_value",
                Expected::Verdict(Stub::satisfies_abstract_value(&v, &pp).unwrap()),
                Expected::Verdict(Satisfiability::Unknown),
            ),
            (
                "satisfies_null_constant",
                Expected::Verdict(Stub::satisfies_null_constant(&pp).unwrap()),
                Expected::Verdict(Satisfiability::Unknown),
            ),
            (
                "satisfies_non_null_constant",
                Expected::Verdict(Stub::satisfies_non_null_constant(&one, &pp).unwrap()),
                Expected::Verdict(Satisfiability::Unknown),
            ),
            (
                "satisfies_unary_expression",
                Expected::Verdict(
                    Stub::satisfies_unary_expression(UnaryOperator::LogicalNegation, &v, &pp)
                        .unwrap(),
                ),
                Expected::Verdict(Satisfiability::Unknown),
            ),
            (
                "satisfies_binary_expression",
                Expected::Verdict(
                    Stub::satisfies_binary_expression(BinaryOperator::Eq, &v, &v, &pp).unwrap(),
                ),
                Expected::Verdict(Satisfiability::Unknown),
            ),
            (
                "satisfies_ternary_expression",
                Expected::Verdict(
                    Stub::satisfies_ternary_expression(
                        TernaryOperator::StringSubstring,
                        &v,
                        &v,
                        &v,
                        &pp,
                    )
                    .unwrap(),
                ),
                Expected::Verdict(Satisfiability::Unknown),
            ),
            (
                "assume_unary_expression",
                Expected::Environment(
                    Stub::assume_unary_expression(
                        env.clone(),
                        UnaryOperator::LogicalNegation,
                        &e1,
                        &pp,
                    )
                    .unwrap(),
                ),
                Expected::Environment(env.clone()),
            ),
            (
                "assume_binary_expression",
                Expected::Environment(
                    Stub::assume_binary_expression(env.clone(), BinaryOperator::Lt, &e1, &e2, &pp)
                        .unwrap(),
                ),
                Expected::Environment(env.clone()),
            ),
            (
                "assume_ternary_expression",
                Expected::Environment(
                    Stub::assume_ternary_expression(
                        env.clone(),
                        TernaryOperator::StringReplace,
                        &e1,
                        &e2,
                        &e3,
                        &pp,
                    )
                    .unwrap(),
                ),
                Expected::Environment(env.clone()),
            ),
        ];
        for (operation, actual, expected) in table.iter() {
            let same = match (actual, expected) {
                (Expected::Value(a), Expected::Value(b)) => a == b,
                (Expected::Verdict(a), Expected::Verdict(b)) => a == b,
                (Expected::Environment(a), Expected::Environment(b)) => a == b,
                _ => false,
            };
            assert!(same, "{}: got {:?}, expected {:?}", operation, actual, expected);
        }
        assert_eq!(table.len(), 15);
    }

    #[test]
    fn identifiers_evaluate_to_their_binding() {
        let pp = ProgramPoint::synthetic();
        let id = x().as_identifier().unwrap().clone();
        let env = ValueEnvironment::<Stub>::new().put_state(id.clone(), Stub::Bottom);
        assert_eq!(Stub::eval_identifier(&id, &env, &pp).unwrap(), Stub::Bottom);
        let unbound = Identifier::variable("y", Type::Int32, CodeLocation::Synthetic);
        assert_eq!(Stub::eval_identifier(&unbound, &env, &pp).unwrap(), Stub::Top);
    }

    #[test]
    fn bottom_operands_short_circuit() {
        let pp = ProgramPoint::synthetic();
        let id = x().as_identifier().unwrap().clone();
        let env = ValueEnvironment::<Stub>::new().put_state(id, Stub::Bottom);
        let sum = ValueExpression::binary(
            BinaryOperator::Add,
            x(),
            ValueExpression::int(1, CodeLocation::Synthetic),
            Type::Int32,
            CodeLocation::Synthetic,
        );
        assert_eq!(Stub::eval(&sum, &env, &pp).unwrap(), Stub::Bottom);
        let test = ValueExpression::binary(
            BinaryOperator::Lt,
            x(),
            ValueExpression::int(1, CodeLocation::Synthetic),
            Type::Boolean,
            CodeLocation::Synthetic,
        );
        assert_eq!(Stub::satisfies(&test, &env, &pp).unwrap(), Satisfiability::Bottom);
        assert_eq!(
            Stub::eval(&ValueExpression::skip(CodeLocation::Synthetic), &env, &pp).unwrap(),
            Stub::Bottom
        );
    }

    #[test]
    fn pointers_and_objects_are_not_tracked_by_default() {
        let object = Identifier::heap_location("A", Type::unit("A"), true, CodeLocation::Synthetic);
        assert!(!Stub::tracks_identifier(&object));
        let pointer = Identifier::variable(
            "p",
            Type::reference_to(TypeCache::mk_singleton_set(Type::unit("A"))),
            CodeLocation::Synthetic,
        );
        assert!(!Stub::tracks_identifier(&pointer));
        assert!(Stub::tracks_identifier(x().as_identifier().unwrap()));
        assert!(Stub::can_process(&x()));
    }
}
