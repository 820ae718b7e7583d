//! Gate definitions.
//!
//! A definition is either a [`Primitive`] with native behaviour or a
//! [`Composite`] wiring other definitions together. Definitions are shared
//! through `Rc` and never hold signal values; see [`crate::Circuit`] for an
//! instantiated gate.

use std::rc::Rc;

use derive_new::new;

use crate::circuit::Circuit;
use crate::error::Result;
use crate::signal::Bits;
use crate::spec::Spec;

/// Combinational behaviour: input values in port order to output values in
/// port order.
pub type EvalFn = fn(&[i64]) -> Vec<i64>;

/// Rising edge: read the inputs and update the latched state.
pub type ClockUpFn = fn(&[i64], &mut [i64]);

/// Falling edge: output values computed from the latched state.
pub type ClockDownFn = fn(&[i64]) -> Vec<i64>;

#[derive(Copy, Clone, Debug, new)]
pub struct Clocked {
    /// Number of state words each instance latches.
    pub state_size: usize,
    pub clock_up: ClockUpFn,
    pub clock_down: ClockDownFn,
}

#[derive(Copy, Clone, Debug)]
pub enum Behavior {
    Combinational(EvalFn),
    /// Outputs only change on the falling edge; `eval` does nothing.
    Clocked(Clocked),
}

#[derive(Clone, Debug, new)]
pub struct Primitive {
    pub spec: Spec,
    pub behavior: Behavior,
}

#[derive(Clone, Debug, new)]
pub struct Composite {
    /// Ports plus the internal signals, in creation order.
    pub spec: Spec,
    /// Evaluated in this order.
    pub parts: Vec<Part>,
}

/// One use of a definition inside a composite.
#[derive(Clone, Debug, new)]
pub struct Part {
    pub definition: Rc<GateDefinition>,
    #[new(default)]
    pub connections: Vec<Connection>,
    /// Values written once into part inputs when the composite is
    /// instantiated.
    #[new(default)]
    pub constants: Vec<PartConstant>,
}

impl Part {
    pub fn name(&self) -> &str {
        self.definition.name()
    }
}

/// A wire from one endpoint to another. Always runs chip to part input, or
/// part output to chip.
#[derive(Copy, Clone, Debug, PartialEq, Eq, new)]
pub struct Connection {
    pub from: Endpoint,
    pub to: Endpoint,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, new)]
pub struct Endpoint {
    pub terminal: Terminal,
    pub bits: Bits,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Terminal {
    /// A signal of the enclosing chip, numbered inputs, then outputs, then
    /// internals.
    Chip(usize),
    /// A port of the part, numbered inputs then outputs.
    Part(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, new)]
pub struct PartConstant {
    pub port: usize,
    pub bits: Bits,
    pub value: i64,
}

#[derive(Clone, Debug)]
pub enum GateDefinition {
    Primitive(Primitive),
    Composite(Composite),
}

impl GateDefinition {
    pub fn combinational(spec: Spec, eval: EvalFn) -> GateDefinition {
        GateDefinition::Primitive(Primitive::new(spec, Behavior::Combinational(eval)))
    }

    pub fn clocked(spec: Spec, clocked: Clocked) -> GateDefinition {
        GateDefinition::Primitive(Primitive::new(spec, Behavior::Clocked(clocked)))
    }

    pub fn spec(&self) -> &Spec {
        match self {
            GateDefinition::Primitive(primitive) => &primitive.spec,
            GateDefinition::Composite(composite) => &composite.spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec().name
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, GateDefinition::Primitive(_))
    }

    /// True if this gate, or any gate inside it, latches on the clock.
    pub fn is_clocked(&self) -> bool {
        match self {
            GateDefinition::Primitive(primitive) => {
                matches!(primitive.behavior, Behavior::Clocked(_))
            }
            GateDefinition::Composite(composite) => {
                composite.parts.iter().any(|part| part.definition.is_clocked())
            }
        }
    }

    /// Build a fresh, independent copy of this gate with all signals at zero.
    pub fn instantiate(self: &Rc<Self>) -> Result<Circuit> {
        Circuit::new(Rc::clone(self))
    }
}
