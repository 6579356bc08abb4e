use std::fmt;
use std::rc::Rc;

/// A position in the analyzed source, or a synthetic one for nodes created by the analysis
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum CodeLocation {
    Source { file: Rc<str>, line: u32, col: u32 },
    Synthetic,
}

impl CodeLocation {
    pub fn new(file: &str, line: u32, col: u32) -> Self {
        CodeLocation::Source {
            file: Rc::from(file),
            line,
            col,
        }
    }
}

impl fmt::Debug for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeLocation::Source { file, line, col } => write!(f, "{}:{}:{}", file, line, col),
            CodeLocation::Synthetic => write!(f, "unknown location"),
        }
    }
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The syntactic location of a semantic operation.
/// Domains only use it as a context key, they never inspect it.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProgramPoint {
    pub location: CodeLocation,
}

impl ProgramPoint {
    pub fn new(location: CodeLocation) -> Self {
        ProgramPoint { location }
    }

    pub fn synthetic() -> Self {
        ProgramPoint {
            location: CodeLocation::Synthetic,
        }
    }
}

impl fmt::Debug for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.location)
    }
}

/// Marks a call boundary: identifiers of the caller are hidden behind it while the callee runs
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ScopeToken {
    pub scoper: CodeLocation,
}

impl ScopeToken {
    pub fn new(scoper: CodeLocation) -> Self {
        ScopeToken { scoper }
    }
}

impl fmt::Debug for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope@{:?}", self.scoper)
    }
}
