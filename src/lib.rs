#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate log;

// Modules for the abstract state algebra
pub mod analysis {
    // For error handling
    pub mod analysis_result;
    // Analysis options
    pub mod option;
    // Opaque program locations
    pub mod program_point;
    // Four-valued verdicts on boolean expressions
    pub mod satisfiability;
    // Generic lattices
    pub mod lattices {
        pub mod functional_lattice;
        pub mod lattice;
        pub mod set_lattice;
    }
    // Memory model: types, identifiers, expressions and heap abstractions
    pub mod memory {
        pub mod expression;
        pub mod heap_domain;
        pub mod identifier;
        pub mod rewriter;
        pub mod type_based_heap;
        pub mod types;
    }
    // Numerical domains
    pub mod numerical {
        pub mod int_interval;
        pub mod interval;
    }
    // Non-relational domains and the environments lifting them
    pub mod nonrelational {
        pub mod inferred_types;
        pub mod nonrelational_domain;
        pub mod type_environment;
        pub mod value_environment;
    }
    // Composite abstract state (heap x value x type)
    pub mod abstract_domain;
    // The state handed to the fixpoint driver
    pub mod analysis_state;
    // Symbols and their aliases
    pub mod symbols;
    // Semantics of calls through an interprocedural resolver
    pub mod call_semantics;
    // Per-statement results
    pub mod statement_store;
}
