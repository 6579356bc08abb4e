use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::lattice::LatticeTrait;
use serde_json::{Map, Value};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// Pointwise lifting of a lattice `V` to functions `K -> V`
///
/// A key missing from the map is mapped to `V::top()`. Top and bottom of the whole
/// function are kept as flags next to an empty map.
#[derive(Clone, PartialEq)]
pub struct FunctionalLattice<K: Ord, V> {
    is_top: bool,
    is_bottom: bool,
    function: BTreeMap<K, V>,
}

impl<K: Ord + Clone, V: LatticeTrait> FunctionalLattice<K, V> {
    pub fn new() -> Self {
        Self {
            is_top: false,
            is_bottom: false,
            function: BTreeMap::new(),
        }
    }

    pub fn get_state(&self, key: &K) -> V {
        if self.is_bottom {
            V::bottom()
        } else if self.is_top {
            V::top()
        } else {
            self.function.get(key).cloned().unwrap_or_else(V::top)
        }
    }

    pub fn put_state(&self, key: K, value: V) -> Self {
        let mut function = if self.is_top || self.is_bottom {
            BTreeMap::new()
        } else {
            self.function.clone()
        };
        function.insert(key, value);
        Self {
            is_top: false,
            is_bottom: false,
            function,
        }
    }

    pub fn forget(&self, key: &K) -> Self {
        if self.is_top || self.is_bottom || !self.function.contains_key(key) {
            return self.clone();
        }
        let mut result = self.clone();
        result.function.remove(key);
        result
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.function.contains_key(key)
    }

    pub fn keys(&self) -> btree_map::Keys<'_, K, V> {
        self.function.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.function.iter()
    }

    pub fn len(&self) -> usize {
        self.function.len()
    }

    pub fn is_empty(&self) -> bool {
        self.function.is_empty()
    }

    /// Renames every key with `rename`, dropping the bindings it maps to `None`
    pub fn rename_keys<F>(&self, mut rename: F) -> Result<Self>
    where
        F: FnMut(&K) -> Result<Option<K>>,
    {
        if self.is_top || self.is_bottom {
            return Ok(self.clone());
        }
        let mut function = BTreeMap::new();
        for (key, value) in self.function.iter() {
            if let Some(renamed) = rename(key)? {
                function.insert(renamed, value.clone());
            }
        }
        Ok(Self {
            is_top: false,
            is_bottom: false,
            function,
        })
    }

    fn combine_common_keys<F>(&self, other: &Self, mut op: F) -> Result<Self>
    where
        F: FnMut(&V, &V) -> Result<V>,
    {
        let mut function = BTreeMap::new();
        for (key, value) in self.function.iter() {
            if let Some(other_value) = other.function.get(key) {
                function.insert(key.clone(), op(value, other_value)?);
            }
        }
        Ok(Self {
            is_top: false,
            is_bottom: false,
            function,
        })
    }
}

impl<K: Ord + Clone, V: LatticeTrait> Default for FunctionalLattice<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for FunctionalLattice<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom {
            write!(f, "_|_")
        } else if self.is_top {
            write!(f, "#TOP#")
        } else {
            f.debug_map().entries(self.function.iter()).finish()
        }
    }
}

impl<K: Ord + fmt::Debug, V> FunctionalLattice<K, V> {
    /// Builds a JSON object keyed by the debug form of each key
    pub fn representation_with<F: Fn(&V) -> Value>(&self, value_repr: F) -> Value {
        if self.is_bottom {
            Value::from("_|_")
        } else if self.is_top {
            Value::from("#TOP#")
        } else {
            let mut map = Map::new();
            for (key, value) in self.function.iter() {
                map.insert(format!("{:?}", key), value_repr(value));
            }
            Value::Object(map)
        }
    }
}

impl<K: Ord + Clone, V: LatticeTrait> LatticeTrait for FunctionalLattice<K, V> {
    fn top() -> Self {
        Self {
            is_top: true,
            is_bottom: false,
            function: BTreeMap::new(),
        }
    }

    fn bottom() -> Self {
        Self {
            is_top: false,
            is_bottom: true,
            function: BTreeMap::new(),
        }
    }

    fn is_top(&self) -> bool {
        !self.is_bottom && (self.is_top || self.function.values().all(|v| v.is_top()))
    }

    fn is_bottom(&self) -> bool {
        self.is_bottom
    }

    /// Keys bound on one side only are top in the result, so only common keys survive
    fn lub_aux(&self, other: &Self) -> Result<Self> {
        self.combine_common_keys(other, |l, r| l.lub(r))
    }

    fn widening_aux(&self, other: &Self) -> Result<Self> {
        self.combine_common_keys(other, |l, r| l.widening(r))
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        let mut function = self.function.clone();
        for (key, value) in other.function.iter() {
            let met = match self.function.get(key) {
                Some(mine) => mine.glb(value)?,
                None => value.clone(),
            };
            function.insert(key.clone(), met);
        }
        Ok(Self {
            is_top: false,
            is_bottom: false,
            function,
        })
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        for (key, value) in other.function.iter() {
            if !self.get_state(key).less_or_equal(value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
