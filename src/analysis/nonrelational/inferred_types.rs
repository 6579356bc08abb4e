use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::{BinaryOperator, Constant, TernaryOperator, UnaryOperator};
use crate::analysis::memory::identifier::Identifier;
use crate::analysis::memory::types::{Type, TypeCache, TypeSet};
use crate::analysis::nonrelational::nonrelational_domain::{
    EnvironmentTrait, NonRelationalDomainTrait, NonRelationalTypeDomainTrait,
};
use crate::analysis::program_point::ProgramPoint;
use itertools::iproduct;
use serde_json::Value;
use std::fmt;

/// The runtime types a value may have at a program point
///
/// The empty set is bottom; top is kept as a flag.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InferredTypes {
    is_top: bool,
    types: TypeSet,
}

impl InferredTypes {
    pub fn new(types: TypeSet) -> Self {
        InferredTypes {
            is_top: false,
            types,
        }
    }

    pub fn singleton(t: Type) -> Self {
        Self::new(TypeCache::mk_singleton_set(t))
    }

    pub fn types(&self) -> &TypeSet {
        &self.types
    }

    /// Whether some of the types satisfy `predicate`; untyped values satisfy everything
    fn admits<P: Fn(&Type) -> bool>(&self, predicate: P) -> bool {
        self.is_top || self.types.iter().any(|t| t.is_untyped() || predicate(t))
    }

    fn of_kind<P: Fn(&Type) -> bool>(&self, predicate: P, result: Type) -> Self {
        if self.admits(predicate) {
            Self::singleton(result)
        } else {
            Self::bottom()
        }
    }
}

impl fmt::Debug for InferredTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_top {
            write!(f, "#TOP#")
        } else if self.types.is_empty() {
            write!(f, "_|_")
        } else {
            write!(f, "{:?}", self.types)
        }
    }
}

impl LatticeTrait for InferredTypes {
    fn top() -> Self {
        InferredTypes {
            is_top: true,
            types: TypeCache::mk_empty_set(),
        }
    }

    fn bottom() -> Self {
        Self::new(TypeCache::mk_empty_set())
    }

    fn is_top(&self) -> bool {
        self.is_top
    }

    fn is_bottom(&self) -> bool {
        !self.is_top && self.types.is_empty()
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self::new(self.types.union(&other.types)))
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(Self::new(self.types.intersection(&other.types)))
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        Ok(self.types.iter().all(|t| other.types.contains(t)))
    }
}

impl NonRelationalDomainTrait for InferredTypes {
    /// Falls back to the annotations of the identifier when the binding says nothing
    fn eval_identifier<E: EnvironmentTrait<Self>>(
        id: &Identifier,
        env: &E,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        let bound = env.get_state(id);
        if bound.is_top() || bound.is_bottom() {
            Ok(Self::new(id.runtime_types_or_static()))
        } else {
            Ok(bound)
        }
    }

    fn eval_null_constant(_pp: &ProgramPoint) -> Result<Self> {
        Ok(Self::singleton(Type::Null))
    }

    fn eval_non_null_constant(
        _constant: &Constant,
        static_type: &Type,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        Ok(Self::singleton(static_type.clone()))
    }

    fn eval_push_any(static_type: &Type, _pp: &ProgramPoint) -> Result<Self> {
        Ok(Self::new(static_type.all_instances()))
    }

    fn eval_unary_expression(
        operator: UnaryOperator,
        arg: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        let result = match operator {
            UnaryOperator::LogicalNegation => arg.of_kind(Type::is_boolean, Type::Boolean),
            UnaryOperator::StringLength => arg.of_kind(Type::is_string, Type::Int32),
            UnaryOperator::NumericNegation if arg.is_top() => Self::top(),
            UnaryOperator::NumericNegation => {
                Self::new(arg.types.filter(|t| t.is_numeric() || t.is_untyped()))
            }
        };
        Ok(result)
    }

    fn eval_binary_expression(
        operator: BinaryOperator,
        left: &Self,
        right: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        let result = if operator.is_arithmetic() {
            if left.is_top() || right.is_top() {
                Self::top()
            } else {
                let numeric = |t: &&Type| t.is_numeric() || t.is_untyped();
                let supertypes = iproduct!(
                    left.types.iter().filter(numeric),
                    right.types.iter().filter(numeric)
                )
                .map(|(l, r)| l.common_supertype(r));
                Self::new(TypeCache::mk_set(supertypes))
            }
        } else if operator.is_logical() {
            if left.admits(Type::is_boolean) && right.admits(Type::is_boolean) {
                Self::singleton(Type::Boolean)
            } else {
                Self::bottom()
            }
        } else if operator.is_comparison() {
            Self::singleton(Type::Boolean)
        } else if left.admits(Type::is_string) && right.admits(Type::is_string) {
            // string concatenation
            Self::singleton(Type::Str)
        } else {
            Self::bottom()
        };
        Ok(result)
    }

    fn eval_ternary_expression(
        operator: TernaryOperator,
        left: &Self,
        _middle: &Self,
        _right: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        match operator {
            TernaryOperator::StringReplace | TernaryOperator::StringSubstring => {
                Ok(left.of_kind(Type::is_string, Type::Str))
            }
        }
    }

    /// Type information is kept for every identifier, pointers and objects included
    fn tracks_identifier(_id: &Identifier) -> bool {
        true
    }

    fn representation(&self) -> Value {
        if self.is_top || self.types.is_empty() {
            Value::from(format!("{:?}", self))
        } else {
            Value::Array(
                self.types
                    .iter()
                    .map(|t| Value::from(format!("{:?}", t)))
                    .collect(),
            )
        }
    }
}

impl NonRelationalTypeDomainTrait for InferredTypes {
    fn runtime_types(&self) -> TypeSet {
        self.types.clone()
    }
}
