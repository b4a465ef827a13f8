//! A small Lisp evaluator.
//!
//! Values are 64-bit tagged words: either a plain `f64` or a tag plus a
//! 48-bit index into the arena. The arena holds interned atom names in a
//! byte region growing up and cons cells in a cell region growing down;
//! garbage is dropped in bulk between top-level forms by moving the cell
//! watermark back to the head of the global environment.

pub mod config;
pub mod error;
pub mod eval;
pub mod globals;
pub mod heap;
pub mod primitives;
pub mod printer;
pub mod reader;
pub mod symbol;
pub mod value;

pub use error::{LispError, LispResult};
pub use eval::Interp;
pub use value::{Capture, Tag, Value, Word};
