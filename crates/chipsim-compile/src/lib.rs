//! Turns chip syntax into gate definitions.
//!
//! Parts are looked up first among the chip's own `BUILTIN` names, then as
//! HDL in the [`LookupContext`], then in the built-in registry. Compiled
//! definitions are cached per context and source text, so compiling the
//! same chip twice yields the same `Rc`.

pub mod compiler;
pub mod context;
pub mod error;

pub use compiler::Compiler;
pub use context::LookupContext;
pub use error::{Error, Result};
