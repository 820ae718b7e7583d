pub mod bits;
pub mod line_info;

pub use bits::*;
pub use line_info::*;
