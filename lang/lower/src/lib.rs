//! Lowering of local declarations.
//!
//! Every function and class declared inside a function body is lifted next to the
//! outermost declaration it was found in. Values it read from enclosing scopes become
//! extra leading parameters, or captured fields for classes, and every use site is
//! rewritten to pass them along.

/// Errors of the lowering.
pub mod err;
pub use err::*;
/// Configuration of generated names.
pub mod conf;
pub use conf::LowerConf;

/// Owners, closures and the local contexts of lifted declarations.
pub mod scope;
/// Closure analysis.
pub mod closure;
/// Discovery of local declarations below a root.
pub mod collect;
/// New declarations for everything that moves.
pub mod transform;
/// Body rewriting against the new declarations.
pub mod rewrite;
/// The pass over a whole program.
pub mod driver;
pub use driver::*;
/// Well-formedness of the lowered program.
pub mod validate;
mod log;
