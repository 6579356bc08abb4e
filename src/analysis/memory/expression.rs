// This file is adapted from MIRAI (https://github.com/facebookexperimental/MIRAI)
// Original author: Herman Venter <hermanv@fb.com>
// Original copyright header:

// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use super::identifier::Identifier;
use super::types::{Type, TypeSet};
use crate::analysis::lattices::set_lattice::SetLattice;
use crate::analysis::program_point::{CodeLocation, ScopeToken};
use rug::Integer;
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter, Result};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A literal value
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(Integer),
    Str(Rc<str>),
}

impl Debug for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Int(n) => write!(f, "{}", n),
            Constant::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum UnaryOperator {
    /// -x
    NumericNegation,
    /// !x
    LogicalNegation,
    /// The length of a string
    StringLength,
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    StringConcat,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        use BinaryOperator::*;
        matches!(self, Eq | Ne | Lt | Le | Gt | Ge)
    }

    pub fn is_arithmetic(self) -> bool {
        use BinaryOperator::*;
        matches!(self, Add | Sub | Mul | Div | Rem)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// The comparison that holds exactly when `self` does not
    pub fn negate(self) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        match self {
            Eq => Some(Ne),
            Ne => Some(Eq),
            Lt => Some(Ge),
            Ge => Some(Lt),
            Le => Some(Gt),
            Gt => Some(Le),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum TernaryOperator {
    /// Replaces the occurrences of the middle operand in the left one with the right one
    StringReplace,
    /// The substring of the left operand between the two indices
    StringSubstring,
}

impl Debug for UnaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            UnaryOperator::NumericNegation => write!(f, "-"),
            UnaryOperator::LogicalNegation => write!(f, "!"),
            UnaryOperator::StringLength => write!(f, "strlen"),
        }
    }
}

impl Debug for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        use BinaryOperator::*;
        let symbol = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            And => "&&",
            Or => "||",
            StringConcat => "strcat",
        };
        write!(f, "{}", symbol)
    }
}

impl Debug for TernaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            TernaryOperator::StringReplace => write!(f, "strreplace"),
            TernaryOperator::StringSubstring => write!(f, "strsub"),
        }
    }
}

/// An expression node together with its static type, the runtime types inferred for it
/// so far and the location it comes from.
///
/// Equality, hashing and ordering ignore the inferred runtime types and the location.
#[derive(Clone)]
pub struct Expr<K> {
    pub kind: K,
    pub static_type: Type,
    pub runtime_types: Option<TypeSet>,
    pub location: CodeLocation,
}

/// Expressions produced by frontends, possibly referring to the heap
pub type SymbolicExpression = Expr<SymbolicKind>;

/// Heap-free expressions, the only ones value and type domains see
pub type ValueExpression = Expr<ValueKind>;

/// Alternative expressions, all of which may be the result of an evaluation
pub type ExpressionSet<E> = SetLattice<E>;

#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum SymbolicKind {
    Constant(Constant),
    Identifier(Identifier),
    /// Any value of the static type
    PushAny,
    /// No value, such as the result of a statement
    Skip,
    Unary {
        operator: UnaryOperator,
        operand: Rc<SymbolicExpression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Rc<SymbolicExpression>,
        right: Rc<SymbolicExpression>,
    },
    Ternary {
        operator: TernaryOperator,
        left: Rc<SymbolicExpression>,
        middle: Rc<SymbolicExpression>,
        right: Rc<SymbolicExpression>,
    },
    /// `container.child`, where `container` evaluates to a pointer
    AccessChild {
        container: Rc<SymbolicExpression>,
        child: Rc<SymbolicExpression>,
    },
    /// A fresh heap block of the static type
    HeapAllocation,
    /// The address of the location the operand denotes
    HeapReference(Rc<SymbolicExpression>),
    /// The location the operand points to
    HeapDereference(Rc<SymbolicExpression>),
}

#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ValueKind {
    Constant(Constant),
    Identifier(Identifier),
    PushAny,
    Skip,
    Unary {
        operator: UnaryOperator,
        operand: Rc<ValueExpression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Rc<ValueExpression>,
        right: Rc<ValueExpression>,
    },
    Ternary {
        operator: TernaryOperator,
        left: Rc<ValueExpression>,
        middle: Rc<ValueExpression>,
        right: Rc<ValueExpression>,
    },
}

impl<K> Expr<K> {
    pub fn new(kind: K, static_type: Type, location: CodeLocation) -> Self {
        Expr {
            kind,
            static_type,
            runtime_types: None,
            location,
        }
    }

    /// The inferred runtime types, or every instance of the static type when none were inferred
    pub fn runtime_types_or_static(&self) -> TypeSet {
        match &self.runtime_types {
            Some(types) => types.clone(),
            None => self.static_type.all_instances(),
        }
    }
}

impl<K: PartialEq> PartialEq for Expr<K> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.static_type == other.static_type
    }
}

impl<K: Eq> Eq for Expr<K> {}

impl<K: Hash> Hash for Expr<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.static_type.hash(state);
    }
}

impl<K: Ord> Ord for Expr<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.static_type.cmp(&other.static_type))
    }
}

impl<K: Ord> PartialOrd for Expr<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Debug> Debug for Expr<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        self.kind.fmt(f)
    }
}

fn fmt_unary(f: &mut Formatter<'_>, operator: UnaryOperator, operand: &dyn Debug) -> Result {
    match operator {
        UnaryOperator::StringLength => write!(f, "strlen({:?})", operand),
        _ => write!(f, "{:?}{:?}", operator, operand),
    }
}

fn fmt_binary(
    f: &mut Formatter<'_>,
    operator: BinaryOperator,
    left: &dyn Debug,
    right: &dyn Debug,
) -> Result {
    match operator {
        BinaryOperator::StringConcat => write!(f, "strcat({:?}, {:?})", left, right),
        _ => write!(f, "({:?} {:?} {:?})", left, operator, right),
    }
}

impl Debug for SymbolicKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            SymbolicKind::Constant(c) => c.fmt(f),
            SymbolicKind::Identifier(id) => id.fmt(f),
            SymbolicKind::PushAny => write!(f, "PUSHANY"),
            SymbolicKind::Skip => write!(f, "SKIP"),
            SymbolicKind::Unary { operator, operand } => fmt_unary(f, *operator, operand),
            SymbolicKind::Binary {
                operator,
                left,
                right,
            } => fmt_binary(f, *operator, left, right),
            SymbolicKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => write!(f, "{:?}({:?}, {:?}, {:?})", operator, left, middle, right),
            SymbolicKind::AccessChild { container, child } => {
                write!(f, "{:?}->{:?}", container, child)
            }
            SymbolicKind::HeapAllocation => write!(f, "new"),
            SymbolicKind::HeapReference(e) => write!(f, "&{:?}", e),
            SymbolicKind::HeapDereference(e) => write!(f, "*{:?}", e),
        }
    }
}

impl Debug for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ValueKind::Constant(c) => c.fmt(f),
            ValueKind::Identifier(id) => id.fmt(f),
            ValueKind::PushAny => write!(f, "PUSHANY"),
            ValueKind::Skip => write!(f, "SKIP"),
            ValueKind::Unary { operator, operand } => fmt_unary(f, *operator, operand),
            ValueKind::Binary {
                operator,
                left,
                right,
            } => fmt_binary(f, *operator, left, right),
            ValueKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => write!(f, "{:?}({:?}, {:?}, {:?})", operator, left, middle, right),
        }
    }
}

impl ValueExpression {
    pub fn constant(constant: Constant, static_type: Type, location: CodeLocation) -> Self {
        Self::new(ValueKind::Constant(constant), static_type, location)
    }

    pub fn int(value: i64, location: CodeLocation) -> Self {
        Self::constant(Constant::Int(Integer::from(value)), Type::Int32, location)
    }

    pub fn identifier(id: Identifier) -> Self {
        Expr {
            static_type: id.static_type.clone(),
            runtime_types: id.runtime_types.clone(),
            location: id.location.clone(),
            kind: ValueKind::Identifier(id),
        }
    }

    pub fn push_any(static_type: Type, location: CodeLocation) -> Self {
        Self::new(ValueKind::PushAny, static_type, location)
    }

    pub fn skip(location: CodeLocation) -> Self {
        Self::new(ValueKind::Skip, Type::Void, location)
    }

    pub fn unary(
        operator: UnaryOperator,
        operand: ValueExpression,
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        Self::new(
            ValueKind::Unary {
                operator,
                operand: Rc::new(operand),
            },
            static_type,
            location,
        )
    }

    pub fn binary(
        operator: BinaryOperator,
        left: ValueExpression,
        right: ValueExpression,
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        Self::new(
            ValueKind::Binary {
                operator,
                left: Rc::new(left),
                right: Rc::new(right),
            },
            static_type,
            location,
        )
    }

    pub fn ternary(
        operator: TernaryOperator,
        operands: [ValueExpression; 3],
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        let [left, middle, right] = operands;
        Self::new(
            ValueKind::Ternary {
                operator,
                left: Rc::new(left),
                middle: Rc::new(middle),
                right: Rc::new(right),
            },
            static_type,
            location,
        )
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match &self.kind {
            ValueKind::Identifier(id) => Some(id),
            _ => None,
        }
    }

    /// Attaches `runtime_types` to the expression, and to the identifier it denotes if any
    pub fn with_runtime_types(&self, runtime_types: TypeSet) -> Self {
        let mut result = self.clone();
        if let ValueKind::Identifier(id) = &self.kind {
            result.kind = ValueKind::Identifier(id.with_runtime_types(runtime_types.clone()));
        }
        result.runtime_types = Some(runtime_types);
        result
    }

    fn rebuild(&self, kind: ValueKind) -> Self {
        Expr {
            kind,
            static_type: self.static_type.clone(),
            runtime_types: self.runtime_types.clone(),
            location: self.location.clone(),
        }
    }

    fn negated(&self) -> Self {
        self.rebuild(ValueKind::Unary {
            operator: UnaryOperator::LogicalNegation,
            operand: Rc::new(self.clone()),
        })
    }

    /// Pushes logical negations down to the comparisons, negating them
    pub fn remove_negations(&self) -> Self {
        match &self.kind {
            ValueKind::Unary {
                operator: UnaryOperator::LogicalNegation,
                operand,
            } => match &operand.kind {
                ValueKind::Unary {
                    operator: UnaryOperator::LogicalNegation,
                    operand: inner,
                } => inner.remove_negations(),
                ValueKind::Binary {
                    operator,
                    left,
                    right,
                } => {
                    if let Some(negated) = operator.negate() {
                        operand.rebuild(ValueKind::Binary {
                            operator: negated,
                            left: left.clone(),
                            right: right.clone(),
                        })
                    } else if operator.is_logical() {
                        let dual = if *operator == BinaryOperator::And {
                            BinaryOperator::Or
                        } else {
                            BinaryOperator::And
                        };
                        operand.rebuild(ValueKind::Binary {
                            operator: dual,
                            left: Rc::new(left.negated().remove_negations()),
                            right: Rc::new(right.negated().remove_negations()),
                        })
                    } else {
                        self.clone()
                    }
                }
                _ => self.clone(),
            },
            ValueKind::Binary {
                operator,
                left,
                right,
            } if operator.is_logical() => self.rebuild(ValueKind::Binary {
                operator: *operator,
                left: Rc::new(left.remove_negations()),
                right: Rc::new(right.remove_negations()),
            }),
            _ => self.clone(),
        }
    }

    pub fn push_scope(&self, token: &ScopeToken) -> Self {
        self.map_identifiers(&mut |id: &Identifier| Some(id.push_scope(token)))
            .unwrap_or_else(|| self.clone())
    }

    /// `None` when an identifier of the expression does not survive leaving the scope
    pub fn pop_scope(&self, token: &ScopeToken) -> Option<Self> {
        self.map_identifiers(&mut |id: &Identifier| id.pop_scope(token))
    }

    fn map_identifiers<F>(&self, f: &mut F) -> Option<Self>
    where
        F: FnMut(&Identifier) -> Option<Identifier>,
    {
        let kind = match &self.kind {
            ValueKind::Identifier(id) => ValueKind::Identifier(f(id)?),
            ValueKind::Constant(_) | ValueKind::PushAny | ValueKind::Skip => {
                return Some(self.clone())
            }
            ValueKind::Unary { operator, operand } => ValueKind::Unary {
                operator: *operator,
                operand: Rc::new(operand.map_identifiers(f)?),
            },
            ValueKind::Binary {
                operator,
                left,
                right,
            } => ValueKind::Binary {
                operator: *operator,
                left: Rc::new(left.map_identifiers(f)?),
                right: Rc::new(right.map_identifiers(f)?),
            },
            ValueKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => ValueKind::Ternary {
                operator: *operator,
                left: Rc::new(left.map_identifiers(f)?),
                middle: Rc::new(middle.map_identifiers(f)?),
                right: Rc::new(right.map_identifiers(f)?),
            },
        };
        Some(self.rebuild(kind))
    }
}

impl SymbolicExpression {
    pub fn constant(constant: Constant, static_type: Type, location: CodeLocation) -> Self {
        Self::new(SymbolicKind::Constant(constant), static_type, location)
    }

    pub fn int(value: i64, location: CodeLocation) -> Self {
        Self::constant(Constant::Int(Integer::from(value)), Type::Int32, location)
    }

    pub fn identifier(id: Identifier) -> Self {
        Expr {
            static_type: id.static_type.clone(),
            runtime_types: id.runtime_types.clone(),
            location: id.location.clone(),
            kind: SymbolicKind::Identifier(id),
        }
    }

    pub fn push_any(static_type: Type, location: CodeLocation) -> Self {
        Self::new(SymbolicKind::PushAny, static_type, location)
    }

    pub fn skip(location: CodeLocation) -> Self {
        Self::new(SymbolicKind::Skip, Type::Void, location)
    }

    pub fn unary(
        operator: UnaryOperator,
        operand: SymbolicExpression,
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        Self::new(
            SymbolicKind::Unary {
                operator,
                operand: Rc::new(operand),
            },
            static_type,
            location,
        )
    }

    pub fn binary(
        operator: BinaryOperator,
        left: SymbolicExpression,
        right: SymbolicExpression,
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        Self::new(
            SymbolicKind::Binary {
                operator,
                left: Rc::new(left),
                right: Rc::new(right),
            },
            static_type,
            location,
        )
    }

    pub fn ternary(
        operator: TernaryOperator,
        operands: [SymbolicExpression; 3],
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        let [left, middle, right] = operands;
        Self::new(
            SymbolicKind::Ternary {
                operator,
                left: Rc::new(left),
                middle: Rc::new(middle),
                right: Rc::new(right),
            },
            static_type,
            location,
        )
    }

    pub fn access_child(
        container: SymbolicExpression,
        child: SymbolicExpression,
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        Self::new(
            SymbolicKind::AccessChild {
                container: Rc::new(container),
                child: Rc::new(child),
            },
            static_type,
            location,
        )
    }

    pub fn heap_allocation(static_type: Type, location: CodeLocation) -> Self {
        Self::new(SymbolicKind::HeapAllocation, static_type, location)
    }

    pub fn heap_reference(
        operand: SymbolicExpression,
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        Self::new(
            SymbolicKind::HeapReference(Rc::new(operand)),
            static_type,
            location,
        )
    }

    pub fn heap_dereference(
        operand: SymbolicExpression,
        static_type: Type,
        location: CodeLocation,
    ) -> Self {
        Self::new(
            SymbolicKind::HeapDereference(Rc::new(operand)),
            static_type,
            location,
        )
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match &self.kind {
            SymbolicKind::Identifier(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self.kind, SymbolicKind::Skip)
    }

    pub fn with_runtime_types(&self, runtime_types: TypeSet) -> Self {
        let mut result = self.clone();
        if let SymbolicKind::Identifier(id) = &self.kind {
            result.kind = SymbolicKind::Identifier(id.with_runtime_types(runtime_types.clone()));
        }
        result.runtime_types = Some(runtime_types);
        result
    }

    pub fn push_scope(&self, token: &ScopeToken) -> Self {
        self.map_identifiers(&mut |id: &Identifier| Some(id.push_scope(token)))
            .unwrap_or_else(|| self.clone())
    }

    /// `None` when an identifier of the expression does not survive leaving the scope
    pub fn pop_scope(&self, token: &ScopeToken) -> Option<Self> {
        self.map_identifiers(&mut |id: &Identifier| id.pop_scope(token))
    }

    fn map_identifiers<F>(&self, f: &mut F) -> Option<Self>
    where
        F: FnMut(&Identifier) -> Option<Identifier>,
    {
        let kind = match &self.kind {
            SymbolicKind::Identifier(id) => SymbolicKind::Identifier(f(id)?),
            SymbolicKind::Constant(_)
            | SymbolicKind::PushAny
            | SymbolicKind::Skip
            | SymbolicKind::HeapAllocation => return Some(self.clone()),
            SymbolicKind::Unary { operator, operand } => SymbolicKind::Unary {
                operator: *operator,
                operand: Rc::new(operand.map_identifiers(f)?),
            },
            SymbolicKind::Binary {
                operator,
                left,
                right,
            } => SymbolicKind::Binary {
                operator: *operator,
                left: Rc::new(left.map_identifiers(f)?),
                right: Rc::new(right.map_identifiers(f)?),
            },
            SymbolicKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => SymbolicKind::Ternary {
                operator: *operator,
                left: Rc::new(left.map_identifiers(f)?),
                middle: Rc::new(middle.map_identifiers(f)?),
                right: Rc::new(right.map_identifiers(f)?),
            },
            SymbolicKind::AccessChild { container, child } => SymbolicKind::AccessChild {
                container: Rc::new(container.map_identifiers(f)?),
                child: Rc::new(child.map_identifiers(f)?),
            },
            SymbolicKind::HeapReference(e) => SymbolicKind::HeapReference(Rc::new(e.map_identifiers(f)?)),
            SymbolicKind::HeapDereference(e) => SymbolicKind::HeapDereference(Rc::new(e.map_identifiers(f)?)),
        };
        Some(Expr {
            kind,
            static_type: self.static_type.clone(),
            runtime_types: self.runtime_types.clone(),
            location: self.location.clone(),
        })
    }
}

impl From<&ValueExpression> for SymbolicExpression {
    fn from(value: &ValueExpression) -> Self {
        let lift = |e: &Rc<ValueExpression>| Rc::new(SymbolicExpression::from(e.as_ref()));
        let kind = match &value.kind {
            ValueKind::Constant(c) => SymbolicKind::Constant(c.clone()),
            ValueKind::Identifier(id) => SymbolicKind::Identifier(id.clone()),
            ValueKind::PushAny => SymbolicKind::PushAny,
            ValueKind::Skip => SymbolicKind::Skip,
            ValueKind::Unary { operator, operand } => SymbolicKind::Unary {
                operator: *operator,
                operand: lift(operand),
            },
            ValueKind::Binary {
                operator,
                left,
                right,
            } => SymbolicKind::Binary {
                operator: *operator,
                left: lift(left),
                right: lift(right),
            },
            ValueKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => SymbolicKind::Ternary {
                operator: *operator,
                left: lift(left),
                middle: lift(middle),
                right: lift(right),
            },
        };
        Expr {
            kind,
            static_type: value.static_type.clone(),
            runtime_types: value.runtime_types.clone(),
            location: value.location.clone(),
        }
    }
}
