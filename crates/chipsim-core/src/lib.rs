//! The simulation core: signals and the wires between them, gate
//! definitions (primitive or composite), instantiated circuits, the
//! two-phase clock, and batch evaluation over truth-table rows.
//!
//! A [`GateDefinition`] is plain data. Calling
//! [`GateDefinition::instantiate`] on a shared definition builds a
//! [`Circuit`] that owns every signal, wire and latch of one copy of the
//! gate, along with its own [`Clock`].

pub mod ast;
pub mod circuit;
pub mod clock;
pub mod error;
pub mod gate;
pub mod registry;
pub mod signal;
pub mod spec;
pub mod table;

pub use circuit::Circuit;
pub use clock::{Clock, ClockEvent, ClockValue};
pub use error::{Error, Result};
pub use gate::*;
pub use registry::Registry;
pub use signal::*;
pub use spec::*;
pub use table::*;
