use crate::analysis::analysis_result::Result;
use crate::analysis::memory::expression::{
    Expr, ExpressionSet, SymbolicExpression, SymbolicKind, ValueExpression, ValueKind,
};
use itertools::iproduct;
use std::rc::Rc;

/// Rewrites symbolic expressions into the value expressions they may denote.
///
/// Non-heap expressions are rewritten structurally, taking every combination of the
/// rewritings of their operands; the four heap expression kinds are resolved by the
/// implementor from the already rewritten operands.
pub trait Rewriter {
    fn rewrite_access_child(
        &self,
        expression: &SymbolicExpression,
        containers: &ExpressionSet<ValueExpression>,
        children: &ExpressionSet<ValueExpression>,
    ) -> Result<ExpressionSet<ValueExpression>>;

    fn rewrite_heap_allocation(
        &self,
        expression: &SymbolicExpression,
    ) -> Result<ExpressionSet<ValueExpression>>;

    fn rewrite_heap_reference(
        &self,
        expression: &SymbolicExpression,
        operands: &ExpressionSet<ValueExpression>,
    ) -> Result<ExpressionSet<ValueExpression>>;

    fn rewrite_heap_dereference(
        &self,
        expression: &SymbolicExpression,
        operands: &ExpressionSet<ValueExpression>,
    ) -> Result<ExpressionSet<ValueExpression>>;

    fn rewrite(&self, expression: &SymbolicExpression) -> Result<ExpressionSet<ValueExpression>> {
        let rewritten = match &expression.kind {
            SymbolicKind::Constant(c) => {
                ExpressionSet::singleton(node(expression, ValueKind::Constant(c.clone())))
            }
            SymbolicKind::Identifier(id) => {
                ExpressionSet::singleton(node(expression, ValueKind::Identifier(id.clone())))
            }
            SymbolicKind::PushAny => ExpressionSet::singleton(node(expression, ValueKind::PushAny)),
            SymbolicKind::Skip => ExpressionSet::singleton(node(expression, ValueKind::Skip)),
            SymbolicKind::Unary { operator, operand } => self
                .rewrite(operand)?
                .iter()
                .map(|o| {
                    node(
                        expression,
                        ValueKind::Unary {
                            operator: *operator,
                            operand: Rc::new(o.clone()),
                        },
                    )
                })
                .collect(),
            SymbolicKind::Binary {
                operator,
                left,
                right,
            } => {
                let lefts = self.rewrite(left)?;
                let rights = self.rewrite(right)?;
                iproduct!(lefts.iter(), rights.iter())
                    .map(|(l, r)| {
                        node(
                            expression,
                            ValueKind::Binary {
                                operator: *operator,
                                left: Rc::new(l.clone()),
                                right: Rc::new(r.clone()),
                            },
                        )
                    })
                    .collect()
            }
            SymbolicKind::Ternary {
                operator,
                left,
                middle,
                right,
            } => {
                let lefts = self.rewrite(left)?;
                let middles = self.rewrite(middle)?;
                let rights = self.rewrite(right)?;
                iproduct!(lefts.iter(), middles.iter(), rights.iter())
                    .map(|(l, m, r)| {
                        node(
                            expression,
                            ValueKind::Ternary {
                                operator: *operator,
                                left: Rc::new(l.clone()),
                                middle: Rc::new(m.clone()),
                                right: Rc::new(r.clone()),
                            },
                        )
                    })
                    .collect()
            }
            SymbolicKind::AccessChild { container, child } => {
                let containers = self.rewrite(container)?;
                let children = self.rewrite(child)?;
                self.rewrite_access_child(expression, &containers, &children)?
            }
            SymbolicKind::HeapAllocation => self.rewrite_heap_allocation(expression)?,
            SymbolicKind::HeapReference(operand) => {
                let operands = self.rewrite(operand)?;
                self.rewrite_heap_reference(expression, &operands)?
            }
            SymbolicKind::HeapDereference(operand) => {
                let operands = self.rewrite(operand)?;
                self.rewrite_heap_dereference(expression, &operands)?
            }
        };
        Ok(rewritten)
    }
}

/// A value expression node carrying the annotations of `origin`
fn node(origin: &SymbolicExpression, kind: ValueKind) -> ValueExpression {
    Expr {
        kind,
        static_type: origin.static_type.clone(),
        runtime_types: origin.runtime_types.clone(),
        location: origin.location.clone(),
    }
}
