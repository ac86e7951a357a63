//! The intermediate representation handed to the lowering passes.
//!
//! Declarations, values and expressions live in the arenas of a [`Program`] and refer
//! to each other by typed ids; identity is the id, never the address.

/// The IR.
pub mod syntax;
pub use syntax::*;
/// The arenas and declaration-chain queries.
pub mod arena;
pub use arena::*;
/// Hand-construction of IR trees.
pub mod construct;
/// Formatters.
pub mod fmt;
pub use fmt::*;

#[cfg(test)]
mod tests;
