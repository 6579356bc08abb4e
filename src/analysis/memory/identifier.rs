// This file is adapted from MIRAI (https://github.com/facebookexperimental/MIRAI)
// Original author: Herman Venter <hermanv@fb.com>
// Original copyright header:

// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::analysis::memory::types::{Type, TypeSet};
use crate::analysis::program_point::{CodeLocation, ScopeToken};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter, Result};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum IdentifierKind {
    /// A program variable, local to the scope it was declared in
    Variable,
    /// An abstract heap location; a weak one summarizes several concrete locations
    HeapLocation { weak: bool },
    /// A pointer to a heap location
    MemoryPointer { location: Rc<Identifier> },
    /// An identifier hidden by a call boundary
    OutOfScope {
        scope: ScopeToken,
        inner: Rc<Identifier>,
    },
}

/// A name-addressed abstract location
///
/// Equality, hashing and ordering look at the kind and the name only, so the same
/// identifier found with different runtime type annotations keys a single binding.
#[derive(Clone)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub name: Rc<str>,
    pub static_type: Type,
    pub runtime_types: Option<TypeSet>,
    pub location: CodeLocation,
}

impl Identifier {
    pub fn variable(name: &str, static_type: Type, location: CodeLocation) -> Self {
        Identifier {
            kind: IdentifierKind::Variable,
            name: Rc::from(name),
            static_type,
            runtime_types: None,
            location,
        }
    }

    pub fn heap_location(name: &str, static_type: Type, weak: bool, location: CodeLocation) -> Self {
        Identifier {
            kind: IdentifierKind::HeapLocation { weak },
            name: Rc::from(name),
            static_type,
            runtime_types: None,
            location,
        }
    }

    pub fn memory_pointer(static_type: Type, target: Identifier, location: CodeLocation) -> Self {
        Identifier {
            name: target.name.clone(),
            kind: IdentifierKind::MemoryPointer {
                location: Rc::new(target),
            },
            static_type,
            runtime_types: None,
            location,
        }
    }

    pub fn is_weak(&self) -> bool {
        match &self.kind {
            IdentifierKind::HeapLocation { weak } => *weak,
            IdentifierKind::OutOfScope { inner, .. } => inner.is_weak(),
            _ => false,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, IdentifierKind::Variable)
    }

    pub fn is_heap_location(&self) -> bool {
        matches!(self.kind, IdentifierKind::HeapLocation { .. })
    }

    pub fn is_memory_pointer(&self) -> bool {
        matches!(self.kind, IdentifierKind::MemoryPointer { .. })
    }

    /// The heap location a memory pointer points to
    pub fn pointed_location(&self) -> Option<&Identifier> {
        match &self.kind {
            IdentifierKind::MemoryPointer { location } => Some(location.as_ref()),
            _ => None,
        }
    }

    pub fn with_runtime_types(&self, runtime_types: TypeSet) -> Self {
        let mut result = self.clone();
        result.runtime_types = Some(runtime_types);
        result
    }

    /// The inferred runtime types, or every instance of the static type when none were inferred
    pub fn runtime_types_or_static(&self) -> TypeSet {
        match &self.runtime_types {
            Some(types) => types.clone(),
            None => self.static_type.all_instances(),
        }
    }

    /// Hides a variable behind `token`; heap identifiers are global and stay visible
    pub fn push_scope(&self, token: &ScopeToken) -> Identifier {
        match &self.kind {
            IdentifierKind::HeapLocation { .. } | IdentifierKind::MemoryPointer { .. } => {
                self.clone()
            }
            IdentifierKind::Variable | IdentifierKind::OutOfScope { .. } => Identifier {
                kind: IdentifierKind::OutOfScope {
                    scope: token.clone(),
                    inner: Rc::new(self.clone()),
                },
                name: self.name.clone(),
                static_type: self.static_type.clone(),
                runtime_types: self.runtime_types.clone(),
                location: self.location.clone(),
            },
        }
    }

    /// Undoes `push_scope(token)`.
    /// Returns `None` for identifiers that do not survive leaving the scope: the variables
    /// local to it and the ones hidden behind a different token.
    pub fn pop_scope(&self, token: &ScopeToken) -> Option<Identifier> {
        match &self.kind {
            IdentifierKind::HeapLocation { .. } | IdentifierKind::MemoryPointer { .. } => {
                Some(self.clone())
            }
            IdentifierKind::Variable => None,
            IdentifierKind::OutOfScope { scope, inner } => {
                if scope == token {
                    Some(inner.as_ref().clone())
                } else {
                    None
                }
            }
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Identifier) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.kind {
            IdentifierKind::Variable => write!(f, "{}", self.name),
            IdentifierKind::HeapLocation { weak: true } => write!(f, "heap[w]:{}", self.name),
            IdentifierKind::HeapLocation { weak: false } => write!(f, "heap[s]:{}", self.name),
            IdentifierKind::MemoryPointer { location } => write!(f, "&{:?}", location),
            IdentifierKind::OutOfScope { scope, inner } => write!(f, "[{:?}]{:?}", scope, inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::memory::types::TypeCache;

    fn var(name: &str) -> Identifier {
        Identifier::variable(name, Type::Int32, CodeLocation::Synthetic)
    }

    #[test]
    fn equality_ignores_annotations() {
        let x = var("x");
        let annotated = x.with_runtime_types(TypeCache::mk_singleton_set(Type::Int8));
        assert_eq!(x, annotated);
        let elsewhere = Identifier::variable("x", Type::Int32, CodeLocation::new("a.rs", 3, 4));
        assert_eq!(x, elsewhere);
        assert_ne!(x, var("y"));
    }

    #[test]
    fn scopes_nest_and_unwind() {
        let outer = ScopeToken::new(CodeLocation::new("a.rs", 1, 1));
        let inner = ScopeToken::new(CodeLocation::new("a.rs", 2, 1));
        let x = var("x");
        let hidden = x.push_scope(&outer).push_scope(&inner);
        assert_ne!(hidden, x);
        assert_eq!(hidden.pop_scope(&outer), None);
        let once = hidden.pop_scope(&inner).unwrap();
        assert_eq!(once.pop_scope(&outer), Some(x.clone()));
        assert_eq!(x.pop_scope(&outer), None);
    }

    #[test]
    fn heap_identifiers_ignore_scopes() {
        let token = ScopeToken::new(CodeLocation::Synthetic);
        let loc = Identifier::heap_location("A", Type::unit("A"), true, CodeLocation::Synthetic);
        assert_eq!(loc.push_scope(&token), loc);
        assert_eq!(loc.pop_scope(&token), Some(loc.clone()));
        assert!(loc.is_weak());
        let ptr = Identifier::memory_pointer(
            Type::reference_to(TypeCache::mk_singleton_set(Type::unit("A"))),
            loc.clone(),
            CodeLocation::Synthetic,
        );
        assert_eq!(ptr.pointed_location(), Some(&loc));
        assert!(!ptr.is_weak());
    }
}
