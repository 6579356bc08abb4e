use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use serde_json::Value;
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;
use std::iter::FromIterator;

/// Powerset lattice ordered by inclusion.
/// The empty set is bottom; top is a flag standing for "every element".
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SetLattice<E: Ord> {
    elements: BTreeSet<E>,
    is_top: bool,
}

impl<E: Ord + Clone> SetLattice<E> {
    pub fn new() -> Self {
        SetLattice {
            elements: BTreeSet::new(),
            is_top: false,
        }
    }

    pub fn singleton(element: E) -> Self {
        let mut elements = BTreeSet::new();
        elements.insert(element);
        SetLattice {
            elements,
            is_top: false,
        }
    }

    pub fn elements(&self) -> &BTreeSet<E> {
        &self.elements
    }

    pub fn iter(&self) -> btree_set::Iter<'_, E> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: &E) -> bool {
        self.is_top || self.elements.contains(element)
    }

    pub fn add(&self, element: E) -> Self {
        let mut result = self.clone();
        result.elements.insert(element);
        result
    }

    /// The only element, if the set holds exactly one
    pub fn only(&self) -> Option<&E> {
        if self.elements.len() == 1 {
            self.elements.iter().next()
        } else {
            None
        }
    }
}

impl<E: Ord + Clone> Default for SetLattice<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Ord + Clone> FromIterator<E> for SetLattice<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        SetLattice {
            elements: iter.into_iter().collect(),
            is_top: false,
        }
    }
}

impl<'a, E: Ord> IntoIterator for &'a SetLattice<E> {
    type Item = &'a E;
    type IntoIter = btree_set::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<E: Ord + fmt::Debug> fmt::Debug for SetLattice<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_top {
            write!(f, "#TOP#")
        } else {
            f.debug_set().entries(self.elements.iter()).finish()
        }
    }
}

impl<E: Ord + fmt::Debug> SetLattice<E> {
    pub fn representation(&self) -> Value {
        if self.is_top {
            Value::from("#TOP#")
        } else {
            Value::Array(
                self.elements
                    .iter()
                    .map(|e| Value::from(format!("{:?}", e)))
                    .collect(),
            )
        }
    }
}

impl<E: Ord + Clone> LatticeTrait for SetLattice<E> {
    fn top() -> Self {
        SetLattice {
            elements: BTreeSet::new(),
            is_top: true,
        }
    }

    fn bottom() -> Self {
        Self::new()
    }

    fn is_top(&self) -> bool {
        self.is_top
    }

    fn is_bottom(&self) -> bool {
        !self.is_top && self.elements.is_empty()
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(SetLattice {
            elements: self.elements.union(&other.elements).cloned().collect(),
            is_top: false,
        })
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(SetLattice {
            elements: self.elements.intersection(&other.elements).cloned().collect(),
            is_top: false,
        })
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        Ok(self.elements.is_subset(&other.elements))
    }
}
