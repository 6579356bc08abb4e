use crate::analysis::analysis_result::Result;
use crate::analysis::lattices::functional_lattice::FunctionalLattice;
use crate::analysis::lattices::lattice::LatticeTrait;
use crate::analysis::lattices::set_lattice::SetLattice;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// A name under which a code member can be targeted by a call
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Symbol {
    /// The name of a code member, whatever unit defines it
    Name(Rc<str>),
    /// The name of a unit defining code members
    Qualifier(Rc<str>),
    QualifiedName { qualifier: Rc<str>, name: Rc<str> },
}

impl Symbol {
    pub fn name(name: &str) -> Self {
        Symbol::Name(Rc::from(name))
    }

    pub fn qualifier(qualifier: &str) -> Self {
        Symbol::Qualifier(Rc::from(qualifier))
    }

    pub fn qualified_name(qualifier: &str, name: &str) -> Self {
        Symbol::QualifiedName {
            qualifier: Rc::from(qualifier),
            name: Rc::from(name),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Name(name) => write!(f, "{}", name),
            Symbol::Qualifier(qualifier) => write!(f, "{}::", qualifier),
            Symbol::QualifiedName { qualifier, name } => write!(f, "{}::{}", qualifier, name),
        }
    }
}

/// The symbols a symbol is known to stand for; top means no aliasing is known
pub type Aliases = SetLattice<Symbol>;

/// Records which symbols are aliases of which, so calls can be resolved through them
#[derive(Clone, PartialEq, Default)]
pub struct SymbolAliasing {
    function: FunctionalLattice<Symbol, Aliases>,
}

impl SymbolAliasing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `alias` may be used in place of `to_alias`
    pub fn alias(&self, to_alias: Symbol, alias: Symbol) -> Self {
        let current = self.function.get_state(&to_alias);
        let aliases = if current.is_top() || current.is_bottom() {
            Aliases::singleton(alias)
        } else {
            current.add(alias)
        };
        SymbolAliasing {
            function: self.function.put_state(to_alias, aliases),
        }
    }

    pub fn get_aliases(&self, symbol: &Symbol) -> Aliases {
        self.function.get_state(symbol)
    }

    pub fn representation(&self) -> Value {
        self.function.representation_with(|aliases| aliases.representation())
    }
}

impl fmt::Debug for SymbolAliasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.function, f)
    }
}

impl LatticeTrait for SymbolAliasing {
    fn top() -> Self {
        SymbolAliasing {
            function: FunctionalLattice::top(),
        }
    }

    fn bottom() -> Self {
        SymbolAliasing {
            function: FunctionalLattice::bottom(),
        }
    }

    fn is_top(&self) -> bool {
        self.function.is_top()
    }

    fn is_bottom(&self) -> bool {
        self.function.is_bottom()
    }

    fn lub_aux(&self, other: &Self) -> Result<Self> {
        Ok(SymbolAliasing {
            function: self.function.lub(&other.function)?,
        })
    }

    fn glb_aux(&self, other: &Self) -> Result<Self> {
        Ok(SymbolAliasing {
            function: self.function.glb(&other.function)?,
        })
    }

    fn less_or_equal_aux(&self, other: &Self) -> Result<bool> {
        self.function.less_or_equal(&other.function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_accumulate() {
        let aliasing = SymbolAliasing::new()
            .alias(Symbol::name("print"), Symbol::name("println"))
            .alias(Symbol::name("print"), Symbol::name("echo"));
        let aliases = aliasing.get_aliases(&Symbol::name("print"));
        assert_eq!(aliases.len(), 2);
        assert!(aliases.contains(&Symbol::name("echo")));
        assert!(aliasing.get_aliases(&Symbol::name("echo")).is_empty());
    }

    #[test]
    fn join_keeps_shared_aliases() {
        let a = SymbolAliasing::new().alias(Symbol::qualifier("io"), Symbol::qualifier("std::io"));
        let b = SymbolAliasing::new()
            .alias(Symbol::qualifier("io"), Symbol::qualifier("tokio::io"))
            .alias(Symbol::name("f"), Symbol::name("g"));
        let joined = a.lub(&b).unwrap();
        assert_eq!(joined.get_aliases(&Symbol::qualifier("io")).len(), 2);
        assert!(joined.get_aliases(&Symbol::name("f")).is_top());
        assert!(a.less_or_equal(&joined).unwrap());
    }

    #[test]
    fn symbol_names() {
        assert_eq!(format!("{:?}", Symbol::qualified_name("m", "f")), "m::f");
        assert_eq!(format!("{:?}", Symbol::qualifier("m")), "m::");
    }
}
