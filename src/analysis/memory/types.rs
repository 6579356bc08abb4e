use std::collections::btree_set;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Runtime and static types of the analyzed program
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Type {
    /// No type information
    Untyped,
    Void,
    /// The type of the null constant, assignable to every in-memory and pointer type
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Str,
    /// A named type whose instances live in the heap
    Unit(Arc<str>),
    /// A pointer to an instance of one of the inner types
    Reference(TypeSet),
}

use Type::*;

impl Type {
    pub fn unit(name: &str) -> Self {
        Unit(Arc::from(name))
    }

    pub fn reference_to(inner: TypeSet) -> Self {
        Reference(inner)
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Untyped)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Void)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Boolean)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Str)
    }

    pub fn is_numeric(&self) -> bool {
        self.bits().is_some()
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, UInt8 | UInt16 | UInt32 | UInt64)
    }

    pub fn bits(&self) -> Option<u8> {
        match self {
            Int8 | UInt8 => Some(8),
            Int16 | UInt16 => Some(16),
            Int32 | UInt32 | Float32 => Some(32),
            Int64 | UInt64 | Float64 => Some(64),
            _ => None,
        }
    }

    pub fn is_in_memory_type(&self) -> bool {
        matches!(self, Unit(_))
    }

    pub fn is_pointer_type(&self) -> bool {
        matches!(self, Reference(_))
    }

    pub fn inner_types(&self) -> Option<&TypeSet> {
        match self {
            Reference(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn can_be_assigned_to(&self, other: &Type) -> bool {
        if other.is_untyped() || self == other {
            return true;
        }
        match (self, other) {
            (a, b) if a.is_numeric() => b.is_numeric(),
            (Null, b) => b.is_in_memory_type() || b.is_pointer_type(),
            (Reference(_), Reference(_)) => true,
            _ => false,
        }
    }

    /// The most precise type both `self` and `other` can be assigned to
    pub fn common_supertype(&self, other: &Type) -> Type {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (Untyped, _) | (_, Untyped) => Untyped,
            (a, b) if a.is_numeric() && b.is_numeric() => Self::numeric_supertype(a, b),
            (Null, b) | (b, Null) if b.is_in_memory_type() || b.is_pointer_type() => b.clone(),
            (Reference(a), Reference(b)) => Reference(a.union(b)),
            _ => Untyped,
        }
    }

    fn numeric_supertype(a: &Type, b: &Type) -> Type {
        match (a.is_integral(), b.is_integral()) {
            (true, false) => b.clone(),
            (false, true) => a.clone(),
            _ => {
                if a.bits() > b.bits() {
                    a.clone()
                } else if b.bits() > a.bits() {
                    b.clone()
                } else if a.is_unsigned() {
                    // Same width: signed wins unless both are unsigned
                    b.clone()
                } else {
                    a.clone()
                }
            }
        }
    }

    /// Every runtime type a value of this static type can have
    pub fn all_instances(&self) -> TypeSet {
        TypeCache::mk_singleton_set(self.clone())
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Untyped => write!(f, "untyped"),
            Void => write!(f, "void"),
            Null => write!(f, "null"),
            Boolean => write!(f, "bool"),
            Int8 => write!(f, "int8"),
            Int16 => write!(f, "int16"),
            Int32 => write!(f, "int32"),
            Int64 => write!(f, "int64"),
            UInt8 => write!(f, "uint8"),
            UInt16 => write!(f, "uint16"),
            UInt32 => write!(f, "uint32"),
            UInt64 => write!(f, "uint64"),
            Float32 => write!(f, "float32"),
            Float64 => write!(f, "float64"),
            Str => write!(f, "string"),
            Unit(name) => write!(f, "{}", name),
            Reference(inner) => match inner.only() {
                Some(t) => write!(f, "{:?}*", t),
                None => write!(f, "{:?}*", inner),
            },
        }
    }
}

/// An interned, immutable set of types
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypeSet(Arc<BTreeSet<Type>>);

impl TypeSet {
    pub fn iter(&self) -> btree_set::Iter<'_, Type> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, t: &Type) -> bool {
        self.0.contains(t)
    }

    pub fn only(&self) -> Option<&Type> {
        if self.0.len() == 1 {
            self.0.iter().next()
        } else {
            None
        }
    }

    pub fn union(&self, other: &TypeSet) -> TypeSet {
        TypeCache::mk_set(self.iter().chain(other.iter()).cloned())
    }

    pub fn intersection(&self, other: &TypeSet) -> TypeSet {
        TypeCache::mk_set(self.0.intersection(&other.0).cloned())
    }

    pub fn filter<P: Fn(&Type) -> bool>(&self, predicate: P) -> TypeSet {
        TypeCache::mk_set(self.iter().filter(|t| predicate(t)).cloned())
    }

    /// Reduces the set to the common supertype of its elements, untyped when empty
    pub fn common_supertype(&self) -> Type {
        let mut types = self.iter();
        match types.next() {
            None => Untyped,
            Some(first) => types.fold(first.clone(), |acc, t| acc.common_supertype(t)),
        }
    }

    pub fn is_shared_with(&self, other: &TypeSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a TypeSet {
    type Item = &'a Type;
    type IntoIter = btree_set::Iter<'a, Type>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

lazy_static! {
    static ref TYPE_CACHE: RwLock<HashSet<TypeSet>> = RwLock::new(HashSet::new());
}

/// Process-wide interning of type sets
pub struct TypeCache;

impl TypeCache {
    pub fn mk_set<I: IntoIterator<Item = Type>>(types: I) -> TypeSet {
        let set = TypeSet(Arc::new(types.into_iter().collect()));
        if let Some(existing) = TYPE_CACHE
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&set)
        {
            return existing.clone();
        }
        let mut cache = TYPE_CACHE.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = cache.get(&set) {
            return existing.clone();
        }
        cache.insert(set.clone());
        set
    }

    pub fn mk_empty_set() -> TypeSet {
        Self::mk_set(std::iter::empty())
    }

    pub fn mk_singleton_set(t: Type) -> TypeSet {
        Self::mk_set(std::iter::once(t))
    }

    pub fn size() -> usize {
        TYPE_CACHE.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_supertype_prefers_wider_and_signed() {
        assert_eq!(Int8.common_supertype(&Int32), Int32);
        assert_eq!(UInt32.common_supertype(&Int32), Int32);
        assert_eq!(UInt16.common_supertype(&UInt16), UInt16);
        assert_eq!(UInt64.common_supertype(&UInt64), UInt64);
        assert_eq!(Int64.common_supertype(&Float32), Float32);
        assert_eq!(Float32.common_supertype(&Float64), Float64);
    }

    #[test]
    fn unrelated_types_meet_in_untyped() {
        assert_eq!(Boolean.common_supertype(&Str), Untyped);
        assert_eq!(Type::unit("A").common_supertype(&Type::unit("B")), Untyped);
        assert_eq!(Null.common_supertype(&Type::unit("A")), Type::unit("A"));
    }

    #[test]
    fn reference_supertype_unions_inner_types() {
        let a = Type::reference_to(TypeCache::mk_singleton_set(Type::unit("A")));
        let b = Type::reference_to(TypeCache::mk_singleton_set(Type::unit("B")));
        let inner = TypeCache::mk_set(vec![Type::unit("A"), Type::unit("B")]);
        assert_eq!(a.common_supertype(&b), Type::reference_to(inner));
    }

    #[test]
    fn assignability() {
        assert!(Int32.can_be_assigned_to(&Int64));
        assert!(Int32.can_be_assigned_to(&Untyped));
        assert!(Null.can_be_assigned_to(&Type::unit("A")));
        assert!(!Str.can_be_assigned_to(&Int32));
        assert!(!Untyped.can_be_assigned_to(&Int32));
    }

    #[test]
    fn sets_are_interned() {
        let a = TypeCache::mk_set(vec![Int32, Boolean]);
        let b = TypeCache::mk_set(vec![Boolean, Int32, Boolean]);
        assert!(a.is_shared_with(&b));
        assert!(TypeCache::size() >= 1);
    }

    #[test]
    fn reduction_of_sets() {
        assert_eq!(TypeCache::mk_empty_set().common_supertype(), Untyped);
        assert_eq!(TypeCache::mk_set(vec![Int8, Int16]).common_supertype(), Int16);
        let set = TypeCache::mk_set(vec![Int8, Type::unit("A")]);
        assert_eq!(set.filter(|t| t.is_in_memory_type()).len(), 1);
    }
}
