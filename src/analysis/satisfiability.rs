use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use serde_json::Value;
use std::fmt;

/// Whether a boolean expression holds in an abstract state
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub enum Satisfiability {
    /// Holds in every concrete state
    Satisfied,
    /// Holds in no concrete state
    NotSatisfied,
    /// Might hold or not
    Unknown,
    /// The state is unreachable
    Bottom,
}

use Satisfiability::*;

impl Satisfiability {
    pub fn from_boolean(value: bool) -> Self {
        if value {
            Satisfied
        } else {
            NotSatisfied
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Satisfied => NotSatisfied,
            NotSatisfied => Satisfied,
            other => other,
        }
    }

    /// Verdict of the conjunction of two expressions
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (NotSatisfied, _) | (_, NotSatisfied) => NotSatisfied,
            (Satisfied, Satisfied) => Satisfied,
            _ => Unknown,
        }
    }

    /// Verdict of the disjunction of two expressions
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (Satisfied, _) | (_, Satisfied) => Satisfied,
            (NotSatisfied, NotSatisfied) => NotSatisfied,
            _ => Unknown,
        }
    }

    pub fn lub_sat(self, other: Self) -> Self {
        match (self, other) {
            (Bottom, x) | (x, Bottom) => x,
            (x, y) if x == y => x,
            _ => Unknown,
        }
    }

    pub fn glb_sat(self, other: Self) -> Self {
        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (Unknown, x) | (x, Unknown) => x,
            (x, y) if x == y => x,
            _ => Bottom,
        }
    }

    pub fn representation(self) -> Value {
        Value::from(format!("{:?}", self))
    }
}

impl fmt::Debug for Satisfiability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Satisfied => "SATISFIED",
            NotSatisfied => "NOT_SATISFIED",
            Unknown => "UNKNOWN",
            Bottom => "BOTTOM",
        };
        write!(f, "{}", repr)
    }
}

impl LatticeTrait for Satisfiability {
    fn top() -> Self {
        Unknown
    }

    fn bottom() -> Self {
        Bottom
    }

    fn is_top(&self) -> bool {
        *self == Unknown
    }

    fn is_bottom(&self) -> bool {
        *self == Bottom
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(self.lub_sat(*other))
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(self.glb_sat(*other))
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        // Satisfied and NotSatisfied are incomparable
        Ok(self == other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lattices::lattice::laws;

    const ALL: [Satisfiability; 4] = [Satisfied, NotSatisfied, Unknown, Bottom];

    #[test]
    fn negation_swaps_only_definite_verdicts() {
        assert_eq!(Satisfied.negate(), NotSatisfied);
        assert_eq!(NotSatisfied.negate(), Satisfied);
        assert_eq!(Unknown.negate(), Unknown);
        assert_eq!(Bottom.negate(), Bottom);
    }

    #[test]
    fn join_of_opposite_verdicts_is_unknown() {
        assert_eq!(Satisfied.lub(&NotSatisfied).unwrap(), Unknown);
        assert_eq!(Satisfied.lub_sat(Bottom), Satisfied);
        assert_eq!(Bottom.lub_sat(NotSatisfied), NotSatisfied);
    }

    #[test]
    fn meet_of_opposite_verdicts_is_bottom() {
        assert_eq!(Satisfied.glb(&NotSatisfied).unwrap(), Bottom);
        assert_eq!(Unknown.glb_sat(Satisfied), Satisfied);
        assert_eq!(Unknown.glb_sat(NotSatisfied), NotSatisfied);
        for s in ALL.iter() {
            assert_eq!(Bottom.glb_sat(*s), Bottom);
        }
    }

    #[test]
    fn connectives() {
        assert_eq!(Satisfied.and(Unknown), Unknown);
        assert_eq!(NotSatisfied.and(Unknown), NotSatisfied);
        assert_eq!(Satisfied.or(Unknown), Satisfied);
        assert_eq!(NotSatisfied.or(NotSatisfied), NotSatisfied);
        assert_eq!(Unknown.or(Bottom), Bottom);
    }

    #[test]
    fn from_boolean() {
        assert_eq!(Satisfiability::from_boolean(true), Satisfied);
        assert_eq!(Satisfiability::from_boolean(false), NotSatisfied);
    }

    #[test]
    fn identities_hold() {
        for s in ALL.iter() {
            laws::check_identities(s);
            for t in ALL.iter() {
                laws::check_join(s, t);
            }
        }
    }
}
