//! The HDL front end.
//!
//! ```text
//! CHIP And {
//!     IN a, b;
//!     OUT out;
//!     PARTS:
//!     Nand(a=a, b=b, out=n);
//!     Nand(a=n, b=n, out=out);
//! }
//! ```

pub mod lex;
pub mod parse;

pub use parse::{parse, Error, ErrorKind};
