//! Built-in chips.
//!
//! Every chip here is a primitive: logic gates and arithmetic are plain
//! functions over input values, and the memory chips latch on the rising
//! edge and drive their outputs on the falling edge.

use chipsim_core::{Registry, Row};

mod arith;
mod logic;
mod memory;

/// A registry holding the whole catalog.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    logic::register(&mut registry);
    arith::register(&mut registry);
    memory::register(&mut registry);
    registry
}

/// Rows of a canonical truth table, one value per pin in `pins` order.
fn table<const N: usize>(pins: [&str; N], rows: &[[i64; N]]) -> Vec<Row> {
    rows.iter()
        .map(|row| pins.iter().copied().zip(row.iter().copied()).collect())
        .collect()
}

/// 0 or 1.
fn bit(value: bool) -> i64 {
    i64::from(value)
}
