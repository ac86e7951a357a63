use hoist_syntax::*;
use hoist_utils::err::{Blame, blame};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LowerError {
    /// The input broke an assumption of the pass.
    #[error("invariant violated: {message} (at {decl:?}); raised at {blame}")]
    Invariant { message: String, decl: Option<DeclId>, blame: Blame },
    /// The input has a shape the pass does not handle yet.
    #[error("not implemented: {what} (at {decl:?}); raised at {blame}")]
    Unimplemented { what: String, decl: Option<DeclId>, blame: Blame },
    #[error("IR validation failed:{}", lines(.0))]
    Validation(Vec<ValidationError>),
}

impl LowerError {
    #[track_caller]
    pub fn invariant(message: impl Into<String>, decl: impl Into<Option<DeclId>>) -> Self {
        LowerError::Invariant { message: message.into(), decl: decl.into(), blame: blame() }
    }
    #[track_caller]
    pub fn unimplemented(what: impl Into<String>, decl: impl Into<Option<DeclId>>) -> Self {
        LowerError::Unimplemented { what: what.into(), decl: decl.into(), blame: blame() }
    }
    pub fn is_invariant(&self) -> bool {
        matches!(self, LowerError::Invariant { .. })
    }
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, LowerError::Unimplemented { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{decl:?} is declared twice")]
    Redeclaration { decl: DeclId },
    #[error("{target:?} is referenced from {from:?} but not declared")]
    MissingDeclaration { target: DeclId, from: DeclId },
    #[error("{value:?} is read out of scope in {from:?}")]
    OutOfScope { value: ValueId, from: DeclId },
    #[error("local declaration {decl:?} is left in the body of {from:?}")]
    ResidualLocal { decl: DeclId, from: DeclId },
}

fn lines(errors: &[ValidationError]) -> String {
    errors.iter().map(|error| format!("\n\t{}", error)).collect()
}

pub type Result<T> = std::result::Result<T, LowerError>;
