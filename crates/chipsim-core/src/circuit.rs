//! Instantiated gates.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::clock::{Clock, ClockEvent, ClockValue};
use crate::error::{Error, Result};
use crate::gate::{Behavior, GateDefinition, Terminal};
use crate::signal::{Netlist, Signal, SignalId, Wire};
use crate::spec::Spec;
use crate::table::Row;

/// One instance of a part in the tree of a circuit.
#[derive(Debug)]
struct GateInstance {
    definition: Rc<GateDefinition>,
    /// Inputs then outputs, matching the definition's port numbering.
    ports: Vec<SignalId>,
    inputs: usize,
    body: Body,
}

#[derive(Debug)]
enum Body {
    Primitive {
        state: Vec<i64>,
    },
    Composite {
        internals: Vec<SignalId>,
        parts: Vec<GateInstance>,
    },
}

impl GateInstance {
    /// Allocate the signals of `definition` and, for a composite, those of
    /// every part beneath it. `path` prefixes every signal name.
    fn build(
        netlist: &mut Netlist,
        definition: &Rc<GateDefinition>,
        path: &str,
    ) -> Result<GateInstance> {
        let spec = definition.spec();
        let qualify = |name: &str| {
            if path.is_empty() {
                name.to_owned()
            } else {
                format!("{path}.{name}")
            }
        };
        let ports = spec
            .ports()
            .map(|port| netlist.add_signal(qualify(&port.name), port.size))
            .collect::<Result<Vec<_>>>()?;

        let body = match definition.as_ref() {
            GateDefinition::Primitive(primitive) => {
                let state_size = match primitive.behavior {
                    Behavior::Combinational(_) => 0,
                    Behavior::Clocked(clocked) => clocked.state_size,
                };
                Body::Primitive {
                    state: vec![0; state_size],
                }
            }
            GateDefinition::Composite(composite) => {
                let internals = composite
                    .spec
                    .internals
                    .iter()
                    .map(|internal| netlist.add_signal(qualify(&internal.name), internal.size))
                    .collect::<Result<Vec<_>>>()?;
                let slots = [ports.as_slice(), internals.as_slice()].concat();

                let mut parts = Vec::with_capacity(composite.parts.len());
                for (k, part) in composite.parts.iter().enumerate() {
                    let child_path = qualify(&format!("{}#{k}", part.name()));
                    let child = GateInstance::build(netlist, &part.definition, &child_path)?;
                    let resolve = |terminal: Terminal| match terminal {
                        Terminal::Chip(slot) => slots[slot],
                        Terminal::Part(port) => child.ports[port],
                    };
                    for connection in &part.connections {
                        let wire = Wire::new(
                            resolve(connection.from.terminal),
                            resolve(connection.to.terminal),
                        )
                        .with_source_bits(connection.from.bits)
                        .with_dest_bits(connection.to.bits);
                        netlist.connect(wire)?;
                    }
                    for constant in &part.constants {
                        netlist.write(child.ports[constant.port], constant.bits, constant.value)?;
                    }
                    parts.push(child);
                }
                Body::Composite { internals, parts }
            }
        };

        Ok(GateInstance {
            definition: Rc::clone(definition),
            inputs: spec.inputs.len(),
            ports,
            body,
        })
    }

    fn behavior(&self) -> Option<Behavior> {
        match self.definition.as_ref() {
            GateDefinition::Primitive(primitive) => Some(primitive.behavior),
            GateDefinition::Composite(_) => None,
        }
    }

    fn input_values(&self, netlist: &Netlist) -> Vec<i64> {
        self.ports[..self.inputs]
            .iter()
            .map(|&id| netlist.value(id))
            .collect()
    }

    fn write_outputs(&self, netlist: &mut Netlist, values: &[i64]) {
        for (&id, &value) in self.ports[self.inputs..].iter().zip(values) {
            netlist.set_value(id, value);
        }
    }

    fn eval(&mut self, netlist: &mut Netlist) {
        match self.behavior() {
            Some(Behavior::Combinational(eval)) => {
                let outputs = eval(&self.input_values(netlist));
                self.write_outputs(netlist, &outputs);
            }
            Some(Behavior::Clocked(_)) => {}
            None => {
                if let Body::Composite { parts, .. } = &mut self.body {
                    for part in parts {
                        part.eval(netlist);
                    }
                }
            }
        }
    }

    fn clock_up(&mut self, netlist: &Netlist) {
        if let Some(Behavior::Clocked(clocked)) = self.behavior() {
            let inputs = self.input_values(netlist);
            if let Body::Primitive { state } = &mut self.body {
                (clocked.clock_up)(&inputs, state);
            }
        } else if let Body::Composite { parts, .. } = &mut self.body {
            for part in parts {
                part.clock_up(netlist);
            }
        }
    }

    fn clock_down(&mut self, netlist: &mut Netlist) {
        if let Some(Behavior::Clocked(clocked)) = self.behavior() {
            if let Body::Primitive { state } = &self.body {
                let outputs = (clocked.clock_down)(state);
                self.write_outputs(netlist, &outputs);
            }
        } else if let Body::Composite { parts, .. } = &mut self.body {
            for part in parts {
                part.clock_down(netlist);
            }
        }
    }

    fn internals(&self) -> &[SignalId] {
        match &self.body {
            Body::Composite { internals, .. } => internals,
            Body::Primitive { .. } => &[],
        }
    }
}

/// A running copy of a gate: its signals and wires, the latched state of
/// every clocked leaf, and the clock that drives them.
#[derive(Debug)]
pub struct Circuit {
    definition: Rc<GateDefinition>,
    netlist: Netlist,
    root: GateInstance,
    clock: Clock,
    /// Inputs, then internals, then outputs.
    pins: IndexMap<String, SignalId>,
}

impl Circuit {
    pub(crate) fn new(definition: Rc<GateDefinition>) -> Result<Circuit> {
        let mut netlist = Netlist::new();
        let root = GateInstance::build(&mut netlist, &definition, "")?;
        let spec = definition.spec();

        let mut pins = IndexMap::new();
        for (port, &id) in spec.inputs.iter().zip(&root.ports) {
            pins.insert(port.name.clone(), id);
        }
        for (port, &id) in spec.internals.iter().zip(root.internals()) {
            pins.insert(port.name.clone(), id);
        }
        for (port, &id) in spec.outputs.iter().zip(&root.ports[root.inputs..]) {
            pins.insert(port.name.clone(), id);
        }

        debug!(
            gate = %spec.name,
            signals = netlist.signals().count(),
            wires = netlist.wire_count(),
            "instantiated"
        );
        Ok(Circuit {
            definition,
            netlist,
            root,
            clock: Clock::new(),
            pins,
        })
    }

    pub fn definition(&self) -> &Rc<GateDefinition> {
        &self.definition
    }

    pub fn spec(&self) -> &Spec {
        self.definition.spec()
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    pub fn is_clocked(&self) -> bool {
        self.definition.is_clocked()
    }

    /// Pin names in row order: inputs, internals, outputs.
    pub fn pin_names(&self) -> impl Iterator<Item = &str> {
        self.pins.keys().map(String::as_str)
    }

    fn pin_id(&self, name: &str) -> Result<SignalId> {
        self.pins.get(name).copied().ok_or_else(|| Error::UnknownPin {
            gate: self.spec().name.clone(),
            pin: name.to_owned(),
        })
    }

    pub fn pin(&self, name: &str) -> Result<&Signal> {
        Ok(self.netlist.signal(self.pin_id(name)?))
    }

    pub fn get_pin(&self, name: &str) -> Result<i64> {
        Ok(self.pin(name)?.value())
    }

    pub fn set_pin(&mut self, name: &str, value: i64) -> Result<()> {
        let id = self.pin_id(name)?;
        self.netlist.set_value(id, value);
        Ok(())
    }

    /// Write several pins. Stops at the first unknown name.
    pub fn set_pin_values<'a>(
        &mut self,
        values: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> Result<()> {
        for (name, value) in values {
            self.set_pin(name, value)?;
        }
        Ok(())
    }

    /// The current value of every pin.
    pub fn get_pin_values(&self) -> Row {
        self.pins
            .iter()
            .map(|(name, &id)| (name.clone(), self.netlist.value(id)))
            .collect()
    }

    /// One pass over the parts in declaration order. Clocked leaves are
    /// left alone.
    pub fn eval(&mut self) {
        self.root.eval(&mut self.netlist);
    }

    pub fn clock(&self) -> ClockValue {
        self.clock.value()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(ClockEvent) + 'static) {
        self.clock.subscribe(listener);
    }

    /// Rising edge: every clocked leaf latches its inputs. Does nothing if
    /// the clock is already up.
    pub fn tick(&mut self) -> bool {
        if !self.clock.tick() {
            return false;
        }
        self.root.clock_up(&self.netlist);
        true
    }

    /// Falling edge: every clocked leaf drives its outputs from the latched
    /// state. Does nothing if the clock is already down.
    pub fn tock(&mut self) -> bool {
        if !self.clock.tock() {
            return false;
        }
        self.root.clock_down(&mut self.netlist);
        true
    }

    /// Whichever edge comes next.
    pub fn next(&mut self) {
        if self.clock.is_down() {
            self.tick();
        } else {
            self.tock();
        }
    }

    /// Exactly one rising and one falling edge, starting from either phase.
    pub fn cycle(&mut self) {
        if self.clock.is_down() {
            self.tick();
            self.tock();
        } else {
            self.tock();
            self.tick();
        }
    }

    pub fn cycles(&mut self, n: u64) {
        for _ in 0..n {
            self.cycle();
        }
    }

    /// Assign the clock directly, restarting its half-cycle count. Latched
    /// state is untouched.
    pub fn set_clock(&mut self, value: ClockValue) {
        self.clock.set_value(value);
    }

    /// Back to `-0`. Latched state is untouched.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::gate::{Clocked, Composite, Connection, Endpoint, Part, PartConstant};
    use crate::signal::Bits;

    fn nand(inputs: &[i64]) -> Vec<i64> {
        vec![i64::from(inputs[0] & inputs[1] == 0)]
    }

    fn latch(inputs: &[i64], state: &mut [i64]) {
        state[0] = inputs[0];
    }

    fn emit(state: &[i64]) -> Vec<i64> {
        vec![state[0]]
    }

    fn wire(from: Terminal, to: Terminal) -> Connection {
        Connection::new(Endpoint::new(from, Bits::All), Endpoint::new(to, Bits::All))
    }

    fn nand_gate() -> Rc<GateDefinition> {
        Rc::new(GateDefinition::combinational(
            Spec::new("Nand", ["a", "b"], ["out"]),
            nand,
        ))
    }

    /// `And` built from two `Nand`s through an internal `n`.
    fn and_gate() -> Rc<GateDefinition> {
        let mut spec = Spec::new("And", ["a", "b"], ["out"]);
        spec.internals.push("n".into());
        let mut first = Part::new(nand_gate());
        first.connections = vec![
            wire(Terminal::Chip(0), Terminal::Part(0)),
            wire(Terminal::Chip(1), Terminal::Part(1)),
            wire(Terminal::Part(2), Terminal::Chip(3)),
        ];
        let mut second = Part::new(nand_gate());
        second.connections = vec![
            wire(Terminal::Chip(3), Terminal::Part(0)),
            wire(Terminal::Chip(3), Terminal::Part(1)),
            wire(Terminal::Part(2), Terminal::Chip(2)),
        ];
        Rc::new(GateDefinition::Composite(Composite::new(
            spec,
            vec![first, second],
        )))
    }

    fn dff_gate() -> Rc<GateDefinition> {
        Rc::new(GateDefinition::clocked(
            Spec::new("DFF", ["in"], ["out"]),
            Clocked::new(1, latch, emit),
        ))
    }

    #[test]
    fn test_composite_eval() {
        let mut circuit = and_gate().instantiate().unwrap();
        assert_eq!(circuit.pin_names().collect::<Vec<_>>(), ["a", "b", "n", "out"]);
        circuit.set_pin_values([("a", 1), ("b", 1)]).unwrap();
        circuit.eval();
        assert_eq!(circuit.get_pin("n").unwrap(), 0);
        assert_eq!(circuit.get_pin("out").unwrap(), 1);
        circuit.set_pin("b", 0).unwrap();
        circuit.eval();
        assert_eq!(
            circuit.get_pin_values(),
            Row::from([("a", 1), ("b", 0), ("n", 1), ("out", 0)])
        );
    }

    #[test]
    fn test_instances_are_independent() {
        let and = and_gate();
        let mut one = and.instantiate().unwrap();
        let two = and.instantiate().unwrap();
        one.set_pin_values([("a", 1), ("b", 1)]).unwrap();
        one.eval();
        assert_eq!(one.get_pin("out").unwrap(), 1);
        assert_eq!(two.get_pin("out").unwrap(), 0);
        assert!(Rc::ptr_eq(one.definition(), two.definition()));
    }

    #[test]
    fn test_unknown_pin() {
        let mut circuit = and_gate().instantiate().unwrap();
        assert_eq!(
            circuit.set_pin("c", 1),
            Err(Error::UnknownPin {
                gate: "And".to_owned(),
                pin: "c".to_owned()
            })
        );
        assert!(circuit.pin("c").is_err());
    }

    #[test]
    fn test_constant_inputs() {
        // Not(in) as Nand(a=in, b=true).
        let mut part = Part::new(nand_gate());
        part.connections = vec![
            wire(Terminal::Chip(0), Terminal::Part(0)),
            wire(Terminal::Part(2), Terminal::Chip(1)),
        ];
        part.constants = vec![PartConstant::new(1, Bits::All, -1)];
        let not = Rc::new(GateDefinition::Composite(Composite::new(
            Spec::new("Not", ["in"], ["out"]),
            vec![part],
        )));
        let mut circuit = not.instantiate().unwrap();
        circuit.eval();
        assert_eq!(circuit.get_pin("out").unwrap(), 1);
        circuit.set_pin("in", 1).unwrap();
        circuit.eval();
        assert_eq!(circuit.get_pin("out").unwrap(), 0);
    }

    #[test]
    fn test_clocked_leaf_updates_on_falling_edge() {
        let mut part = Part::new(dff_gate());
        part.connections = vec![
            wire(Terminal::Chip(0), Terminal::Part(0)),
            wire(Terminal::Part(1), Terminal::Chip(1)),
        ];
        let reg = Rc::new(GateDefinition::Composite(Composite::new(
            Spec::new("Reg", ["in"], ["out"]),
            vec![part],
        )));
        let mut circuit = reg.instantiate().unwrap();
        assert!(circuit.is_clocked());

        circuit.set_pin("in", 1).unwrap();
        circuit.eval();
        assert_eq!(circuit.get_pin("out").unwrap(), 0);
        assert!(circuit.tick());
        assert_eq!(circuit.get_pin("out").unwrap(), 0);
        assert!(circuit.tock());
        assert_eq!(circuit.get_pin("out").unwrap(), 1);

        // Latched on the rising edge only.
        circuit.tick();
        circuit.set_pin("in", 0).unwrap();
        circuit.tock();
        assert_eq!(circuit.get_pin("out").unwrap(), 1);
        circuit.cycle();
        assert_eq!(circuit.get_pin("out").unwrap(), 0);
        assert_eq!(circuit.clock(), ClockValue::new(3, false));
    }

    #[test]
    fn test_cycle_emits_one_tick_and_one_tock() {
        let mut circuit = dff_gate().instantiate().unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        circuit.subscribe(move |event| sink.borrow_mut().push(event));

        circuit.cycle();
        circuit.next();
        circuit.cycle();
        let edges = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, ClockEvent::Tick(_) | ClockEvent::Tock(_)))
            .count();
        assert_eq!(edges, 5);
        assert_eq!(circuit.clock(), ClockValue::new(2, true));

        circuit.reset_clock();
        circuit.cycles(3);
        assert_eq!(circuit.clock(), ClockValue::new(3, false));
    }

    #[test]
    fn test_set_clock_restarts_half_cycles() {
        let mut circuit = dff_gate().instantiate().unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        circuit.subscribe(move |event| sink.borrow_mut().push(event));

        circuit.tick();
        circuit.set_clock(ClockValue::new(5, true));
        assert_eq!(circuit.clock(), ClockValue::new(5, true));
        circuit.tock();
        circuit.tick();
        assert_eq!(circuit.clock(), ClockValue::new(6, true));
        assert_eq!(
            *events.borrow(),
            [
                ClockEvent::Tick(ClockValue::new(0, true)),
                ClockEvent::Change(ClockValue::new(5, true)),
                ClockEvent::Tock(ClockValue::new(6, false)),
                ClockEvent::Tick(ClockValue::new(6, true)),
                ClockEvent::Cycle(ClockValue::new(6, true)),
            ]
        );
    }

    #[test]
    fn test_eval_on_clocked_primitive_is_a_no_op() {
        let mut circuit = dff_gate().instantiate().unwrap();
        circuit.set_pin("in", 1).unwrap();
        circuit.eval();
        assert_eq!(circuit.get_pin("out").unwrap(), 0);
    }
}
