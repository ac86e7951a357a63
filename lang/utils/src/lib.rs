#![allow(clippy::style)]
#![allow(clippy::useless_format)]

pub mod arena;
pub mod context;
pub mod err;
pub mod pass;

pub mod prelude {
    /// Data structures.
    pub use crate::{arena::*, context::Context};
    /// Compiler pass interface.
    pub use crate::pass::CompilerPass;
}
