use crate::analysis::analysis_result::Result;
use std::ptr;

/// Generic API for lattices
///
/// Concrete lattices implement the `*_aux` operations, which are only invoked when
/// neither operand is top or bottom and the operands differ. The provided `lub`, `glb`,
/// `widening` and `less_or_equal` resolve every other case first.
pub trait LatticeTrait: Clone + PartialEq + Sized {
    fn top() -> Self;
    fn bottom() -> Self;
    fn is_top(&self) -> bool;
    fn is_bottom(&self) -> bool;

    fn lub_aux(&self, other: &Self) -> Result<Self>;

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool>;

    fn glb_aux(&self, _other: &Self) -> Result<Self> {
        Ok(Self::bottom())
    }

    /// Must stabilize every ascending chain after finitely many applications
    fn widening_aux(&self, other: &Self) -> Result<Self> {
        self.lub_aux(other)
    }

    fn lub(&self, other: &Self) -> Result<Self> {
        if ptr::eq(self, other) || self == other || other.is_bottom() || self.is_top() {
            Ok(self.clone())
        } else if self.is_bottom() || other.is_top() {
            Ok(other.clone())
        } else {
            self.lub_aux(other)
        }
    }

    fn glb(&self, other: &Self) -> Result<Self> {
        if ptr::eq(self, other) || self == other || self.is_bottom() || other.is_top() {
            Ok(self.clone())
        } else if other.is_bottom() || self.is_top() {
            Ok(other.clone())
        } else {
            self.glb_aux(other)
        }
    }

    fn widening(&self, other: &Self) -> Result<Self> {
        if ptr::eq(self, other) || self == other || other.is_bottom() || self.is_top() {
            Ok(self.clone())
        } else if self.is_bottom() || other.is_top() {
            Ok(other.clone())
        } else {
            self.widening_aux(other)
        }
    }

    fn less_or_equal(&self, other: &Self) -> Result<bool> {
        if ptr::eq(self, other) || self == other || self.is_bottom() || other.is_top() {
            Ok(true)
        } else if self.is_top() || other.is_bottom() {
            Ok(false)
        } else {
            self.less_or_equal_aux(other)
        }
    }
}
