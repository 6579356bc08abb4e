use failure::Fail;

pub type Result<T> = std::result::Result<T, SemanticError>;

/// The only kind of error raised by semantic operations.
/// It aborts the transfer function that raised it and is handed back to the driver unchanged.
#[derive(Debug, Fail)]
pub enum SemanticError {
    #[fail(display = "Expression {} cannot be processed by {}", expression, domain)]
    UnsupportedExpression { expression: String, domain: String },
    #[fail(display = "Rewriting {} produced {}, which is not an identifier", target, rewritten)]
    NotAnIdentifier { target: String, rewritten: String },
    #[fail(display = "Inconsistent substitution: {}", _0)]
    InconsistentSubstitution(String),
    #[fail(display = "Cannot compute the result of call {}: {}", call, reason)]
    CallResolution { call: String, reason: String },
    #[fail(display = "{}", _0)]
    Domain(String),
}

impl SemanticError {
    pub fn unsupported<E: std::fmt::Debug>(expression: &E, domain: &str) -> Self {
        SemanticError::UnsupportedExpression {
            expression: format!("{:?}", expression),
            domain: domain.to_owned(),
        }
    }
}
