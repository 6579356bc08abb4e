use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::memory::expression::{
    BinaryOperator, Constant, UnaryOperator, ValueExpression,
};
use crate::analysis::memory::types::Type;
use crate::analysis::nonrelational::nonrelational_domain::{
    EnvironmentTrait, NonRelationalDomainTrait,
};
use crate::analysis::numerical::int_interval::{IntInterval, MathNumber};
use crate::analysis::option::AnalysisOption;
use crate::analysis::program_point::ProgramPoint;
use crate::analysis::satisfiability::Satisfiability;
use rug::Integer;
use serde_json::Value;
use std::fmt;

/// The interval domain over unbounded integers
///
/// `None` is bottom; top is the interval `(-∞, +∞)`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    interval: Option<IntInterval>,
}

impl Interval {
    /// The interval `[low, high]`, bottom when `low > high`
    pub fn new(low: i64, high: i64) -> Self {
        Self::from_bounds(MathNumber::from(low), MathNumber::from(high))
    }

    pub fn from_bounds(low: MathNumber, high: MathNumber) -> Self {
        Interval {
            interval: IntInterval::new(low, high),
        }
    }

    pub fn singleton(n: Integer) -> Self {
        Interval {
            interval: Some(IntInterval::singleton(n)),
        }
    }

    pub fn zero() -> Self {
        Interval {
            interval: Some(IntInterval::zero()),
        }
    }

    pub fn interval(&self) -> Option<&IntInterval> {
        self.interval.as_ref()
    }

    pub fn low(&self) -> Option<&MathNumber> {
        self.interval.as_ref().map(|i| &i.low)
    }

    pub fn high(&self) -> Option<&MathNumber> {
        self.interval.as_ref().map(|i| &i.high)
    }

    fn is_zero(&self) -> bool {
        matches!(&self.interval, Some(i) if i.is_zero())
    }

    fn is_singleton(&self) -> bool {
        matches!(&self.interval, Some(i) if i.is_singleton())
    }

    fn lift(interval: IntInterval) -> Self {
        Interval {
            interval: Some(interval),
        }
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.interval {
            None => write!(f, "_|_"),
            Some(i) => write!(f, "{:?}", i),
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::top()
    }
}

impl LatticeTrait for Interval {
    fn top() -> Self {
        Self::lift(IntInterval::infinite())
    }

    fn bottom() -> Self {
        Interval { interval: None }
    }

    fn is_top(&self) -> bool {
        matches!(&self.interval, Some(i) if i.is_infinite())
    }

    fn is_bottom(&self) -> bool {
        self.interval.is_none()
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        match (&self.interval, &other.interval) {
            (Some(a), Some(b)) => Ok(Self::from_bounds(
                a.low.clone().min(b.low.clone()),
                a.high.clone().max(b.high.clone()),
            )),
            _ => Ok(Self::bottom()),
        }
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        match (&self.interval, &other.interval) {
            (Some(a), Some(b)) => Ok(Self::from_bounds(
                a.low.clone().max(b.low.clone()),
                a.high.clone().min(b.high.clone()),
            )),
            _ => Ok(Self::bottom()),
        }
    }

    /// A bound that grows jumps straight to infinity
    fn widening_aux(&self, other: &Self) -> Result<Self> {
        match (&self.interval, &other.interval) {
            (Some(a), Some(b)) => {
                let high = if b.high > a.high {
                    MathNumber::INF
                } else {
                    a.high.clone()
                };
                let low = if b.low < a.low {
                    MathNumber::NINF
                } else {
                    a.low.clone()
                };
                Ok(Self::from_bounds(low, high))
            }
            _ => Ok(Self::bottom()),
        }
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        match (&self.interval, &other.interval) {
            (Some(a), Some(b)) => Ok(b.includes(a)),
            (None, _) => Ok(true),
            (Some(_), None) => Ok(false),
        }
    }
}

impl NonRelationalDomainTrait for Interval {
    fn eval_non_null_constant(
        constant: &Constant,
        _static_type: &Type,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        match constant {
            Constant::Int(n) => Ok(Self::singleton(n.clone())),
            _ => Ok(Self::top()),
        }
    }

    fn eval_unary_expression(
        operator: UnaryOperator,
        arg: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        match (operator, &arg.interval) {
            (UnaryOperator::NumericNegation, Some(i)) if !arg.is_top() => {
                Ok(Self::lift(i.clone() * IntInterval::singleton(Integer::from(-1))))
            }
            (UnaryOperator::StringLength, _) => {
                Ok(Self::from_bounds(MathNumber::zero(), MathNumber::INF))
            }
            _ => Ok(Self::top()),
        }
    }

    fn eval_binary_expression(
        operator: BinaryOperator,
        left: &Self,
        right: &Self,
        _pp: &ProgramPoint,
    ) -> Result<Self> {
        // a division may still give zero or bottom with a top operand
        if operator != BinaryOperator::Div && (left.is_top() || right.is_top()) {
            return Ok(Self::top());
        }
        let (l, r) = match (&left.interval, &right.interval) {
            (Some(l), Some(r)) => (l.clone(), r.clone()),
            _ => return Ok(Self::bottom()),
        };
        let result = match operator {
            BinaryOperator::Add => Self::lift(l + r),
            BinaryOperator::Sub => Self::lift(l - r),
            BinaryOperator::Mul if left.is_zero() || right.is_zero() => Self::zero(),
            BinaryOperator::Mul => Self::lift(l * r),
            BinaryOperator::Div if right.is_zero() => Self::bottom(),
            BinaryOperator::Div if left.is_zero() => Self::zero(),
            BinaryOperator::Div if left.is_top() || right.is_top() => Self::top(),
            BinaryOperator::Div => {
                let rounding = AnalysisOption::current().division_rounding;
                Self::lift(l.div(&r, rounding))
            }
            _ => Self::top(),
        };
        Ok(result)
    }

    fn satisfies_binary_expression(
        operator: BinaryOperator,
        left: &Self,
        right: &Self,
        pp: &ProgramPoint,
    ) -> Result<Satisfiability> {
        if left.is_top() || right.is_top() {
            return Ok(Satisfiability::Unknown);
        }
        let (l, r) = match (&left.interval, &right.interval) {
            (Some(l), Some(r)) => (l, r),
            _ => return Ok(Satisfiability::Bottom),
        };
        let verdict = match operator {
            BinaryOperator::Eq => {
                let glb = left.glb(right)?;
                if glb.is_bottom() {
                    Satisfiability::NotSatisfied
                } else if left.is_singleton() && left == right {
                    Satisfiability::Satisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            BinaryOperator::Ge => {
                return Self::satisfies_binary_expression(BinaryOperator::Lt, right, left, pp)
            }
            BinaryOperator::Gt => {
                return Self::satisfies_binary_expression(BinaryOperator::Le, right, left, pp)
            }
            BinaryOperator::Le => {
                let glb = left.glb(right)?;
                if glb.is_bottom() {
                    Satisfiability::from_boolean(l.high <= r.low)
                } else if glb.is_singleton() && l.high == r.low {
                    // the intervals only share a bound
                    Satisfiability::Satisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            BinaryOperator::Lt => {
                if left.glb(right)?.is_bottom() {
                    Satisfiability::from_boolean(l.high < r.low)
                } else {
                    Satisfiability::Unknown
                }
            }
            BinaryOperator::Ne => {
                if left.glb(right)?.is_bottom() {
                    Satisfiability::Satisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            _ => Satisfiability::Unknown,
        };
        Ok(verdict)
    }

    /// Refines the identifier side of a comparison with the bounds of the other side
    fn assume_binary_expression<E: EnvironmentTrait<Self>>(
        env: E,
        operator: BinaryOperator,
        left: &ValueExpression,
        right: &ValueExpression,
        pp: &ProgramPoint,
    ) -> Result<E> {
        let (id, eval, right_is_expr) = if let Some(id) = left.as_identifier() {
            (id, Self::eval(right, &env, pp)?, true)
        } else if let Some(id) = right.as_identifier() {
            (id, Self::eval(left, &env, pp)?, false)
        } else {
            return Ok(env);
        };
        let bounds = match &eval.interval {
            Some(i) => i.clone(),
            None => return Ok(E::bottom()),
        };
        let low_is_minus_inf = bounds.low.is_minus_infinity();
        let low_inf = Self::from_bounds(bounds.low.clone(), MathNumber::INF);
        let lowp1_inf = Self::from_bounds(bounds.low.clone() + MathNumber::one(), MathNumber::INF);
        let inf_high = Self::from_bounds(MathNumber::NINF, bounds.high.clone());
        let inf_highm1 = Self::from_bounds(MathNumber::NINF, bounds.high - MathNumber::one());
        let id = id.clone();

        let refined = match (operator, right_is_expr) {
            (BinaryOperator::Eq, _) => env.put_state(id, eval),
            (BinaryOperator::Ge, true) | (BinaryOperator::Le, false) => {
                if low_is_minus_inf {
                    env
                } else {
                    env.put_state(id, low_inf)
                }
            }
            (BinaryOperator::Ge, false) | (BinaryOperator::Le, true) => env.put_state(id, inf_high),
            (BinaryOperator::Gt, true) | (BinaryOperator::Lt, false) => {
                if low_is_minus_inf {
                    env
                } else {
                    env.put_state(id, lowp1_inf)
                }
            }
            (BinaryOperator::Gt, false) | (BinaryOperator::Lt, true) => {
                if low_is_minus_inf {
                    env.put_state(id, eval)
                } else {
                    env.put_state(id, inf_highm1)
                }
            }
            _ => env,
        };
        Ok(refined)
    }

    fn representation(&self) -> Value {
        Value::from(format!("{:?}", self))
    }
}
