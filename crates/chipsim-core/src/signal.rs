//! Signals, the wires between them, and the netlist that owns both.
//!
//! Every write to a signal pushes the new value along each wire leaving it
//! before the write returns. Propagation is plain recursion: a wire into a
//! signal with wires of its own keeps going until it reaches a signal with
//! no fanout. Wires only ever run from a chip signal into a part's input or
//! from a part's output into a chip signal, so the wire graph is acyclic.
//! Feedback through gates happens across `eval` calls, never inside one
//! write.

use chipsim_support::bits;
use la_arena::{Arena, Idx};
use serde::Serialize;

use crate::error::{Error, Result};

pub type SignalId = Idx<Signal>;
pub type WireId = Idx<Wire>;

/// Which bits of a signal an endpoint addresses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Bits {
    #[default]
    All,
    Bit(u32),
    /// Inclusive on both ends.
    Range { from: u32, to: u32 },
}

impl Bits {
    /// Number of bits addressed within a signal of `size` bits.
    pub fn width(self, size: u32) -> u32 {
        match self {
            Bits::All => size,
            Bits::Bit(_) => 1,
            Bits::Range { from, to } => to - from + 1,
        }
    }

    /// Check that these bits lie inside a signal called `name` of `size` bits.
    pub fn check(self, name: &str, size: u32) -> Result<()> {
        match self {
            Bits::All => Ok(()),
            Bits::Bit(index) if index < size => Ok(()),
            Bits::Bit(index) => Err(Error::BitOutOfRange {
                signal: name.to_owned(),
                index,
                size,
            }),
            Bits::Range { from, to } if from <= to && to < size => Ok(()),
            Bits::Range { from, to } => Err(Error::SliceOutOfRange {
                signal: name.to_owned(),
                from,
                to,
                size,
            }),
        }
    }
}

/// A named, sized storage cell. Width 1 is a pin, anything wider a bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
    name: String,
    size: u32,
    value: i64,
    fanout: Vec<WireId>,
}

impl Signal {
    pub fn new(name: impl Into<String>, size: u32) -> Result<Signal> {
        let name = name.into();
        if size == 0 || size > bits::MAX_WIDTH {
            return Err(Error::InvalidWidth { name, size });
        }
        Ok(Signal {
            name,
            size,
            value: 0,
            fanout: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// The wires fed by this signal, in the order they were connected.
    pub fn fanout(&self) -> &[WireId] {
        &self.fanout
    }

    pub fn value_at(&self, index: u32) -> Result<i64> {
        self.read(Bits::Bit(index))
    }

    pub fn slice(&self, from: u32, to: u32) -> Result<i64> {
        self.read(Bits::Range { from, to })
    }

    /// Read the addressed bits. Whole-signal reads return the stored value;
    /// bit and slice reads are unsigned.
    pub fn read(&self, bits: Bits) -> Result<i64> {
        bits.check(&self.name, self.size)?;
        Ok(self.read_unchecked(bits))
    }

    fn read_unchecked(&self, bits: Bits) -> i64 {
        match bits {
            Bits::All => self.value,
            Bits::Bit(index) => bits::extract(self.value, index, index),
            Bits::Range { from, to } => bits::extract(self.value, from, to),
        }
    }

    /// The stored value after writing `value` into the addressed bits.
    fn merged(&self, bits: Bits, value: i64) -> i64 {
        let merged = match bits {
            Bits::All => value,
            Bits::Bit(index) => bits::deposit(self.value, index, index, value),
            Bits::Range { from, to } => bits::deposit(self.value, from, to, value),
        };
        bits::normalize(merged, self.size)
    }
}

/// A propagation edge copying bits of one signal into bits of another.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Wire {
    pub source: SignalId,
    pub source_bits: Bits,
    pub dest: SignalId,
    pub dest_bits: Bits,
}

impl Wire {
    pub fn new(source: SignalId, dest: SignalId) -> Wire {
        Wire {
            source,
            source_bits: Bits::All,
            dest,
            dest_bits: Bits::All,
        }
    }

    pub fn with_source_bits(mut self, bits: Bits) -> Wire {
        self.source_bits = bits;
        self
    }

    pub fn with_dest_bits(mut self, bits: Bits) -> Wire {
        self.dest_bits = bits;
        self
    }
}

/// Owns the signals and wires of one instantiated circuit.
#[derive(Debug, Default)]
pub struct Netlist {
    signals: Arena<Signal>,
    wires: Arena<Wire>,
}

impl Netlist {
    pub fn new() -> Netlist {
        Netlist::default()
    }

    pub fn add_signal(&mut self, name: impl Into<String>, size: u32) -> Result<SignalId> {
        Ok(self.signals.alloc(Signal::new(name, size)?))
    }

    /// Add a wire. Both ends are range-checked here, so propagation never
    /// has to.
    pub fn connect(&mut self, wire: Wire) -> Result<WireId> {
        let source = &self.signals[wire.source];
        wire.source_bits.check(&source.name, source.size)?;
        let dest = &self.signals[wire.dest];
        wire.dest_bits.check(&dest.name, dest.size)?;
        let id = self.wires.alloc(wire);
        self.signals[wire.source].fanout.push(id);
        Ok(id)
    }

    pub fn signal(&self, id: SignalId) -> &Signal {
        &self.signals[id]
    }

    pub fn signals(&self) -> impl Iterator<Item = (SignalId, &Signal)> {
        self.signals.iter()
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn value(&self, id: SignalId) -> i64 {
        self.signals[id].value
    }

    pub fn set_value(&mut self, id: SignalId, value: i64) {
        self.store(id, Bits::All, value);
    }

    pub fn set_value_at(&mut self, id: SignalId, index: u32, bit: i64) -> Result<()> {
        self.write(id, Bits::Bit(index), bit)
    }

    pub fn set_slice(&mut self, id: SignalId, from: u32, to: u32, value: i64) -> Result<()> {
        self.write(id, Bits::Range { from, to }, value)
    }

    /// Write `value` into the addressed bits of a signal and propagate.
    pub fn write(&mut self, id: SignalId, bits: Bits, value: i64) -> Result<()> {
        let signal = &self.signals[id];
        bits.check(&signal.name, signal.size)?;
        self.store(id, bits, value);
        Ok(())
    }

    fn store(&mut self, id: SignalId, bits: Bits, value: i64) {
        let signal = &mut self.signals[id];
        signal.value = signal.merged(bits, value);
        self.propagate(id);
    }

    /// Fire every wire leaving `id`, in connection order. Fires on every
    /// write, not only on change.
    fn propagate(&mut self, id: SignalId) {
        for k in 0..self.signals[id].fanout.len() {
            let wire = self.wires[self.signals[id].fanout[k]];
            let value = self.signals[wire.source].read_unchecked(wire.source_bits);
            self.store(wire.dest, wire.dest_bits, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_width_is_rejected() {
        let err = Signal::new("a", 0).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidWidth {
                name: "a".to_owned(),
                size: 0
            }
        );
        assert!(Signal::new("wide", 65).is_err());
    }

    #[test]
    fn test_bit_access_is_bounds_checked() {
        let mut net = Netlist::new();
        let a = net.add_signal("a", 4).unwrap();
        assert!(net.set_value_at(a, 4, 1).unwrap_err().is_range());
        assert!(net.signal(a).value_at(4).unwrap_err().is_range());
        assert!(net.signal(a).slice(2, 4).unwrap_err().is_range());
        assert!(net.signal(a).slice(3, 2).unwrap_err().is_range());
        net.set_value_at(a, 3, 1).unwrap();
        assert_eq!(net.value(a), 0b1000);
        assert_eq!(net.signal(a).value_at(3).unwrap(), 1);
    }

    #[test]
    fn test_slice_matches_bits() {
        let mut net = Netlist::new();
        let bus = net.add_signal("bus", 16).unwrap();
        for value in [0, -1, 0x1234, -21846, 0x7FFF, -32768] {
            net.set_value(bus, value);
            let signal = net.signal(bus);
            for from in 0..16 {
                for to in from..16 {
                    let mut rebuilt = 0;
                    for i in from..=to {
                        rebuilt |= signal.value_at(i).unwrap() << (i - from);
                    }
                    assert_eq!(signal.slice(from, to).unwrap(), rebuilt);
                }
            }
        }
    }

    #[test]
    fn test_sixteen_bit_values_are_signed() {
        let mut net = Netlist::new();
        let bus = net.add_signal("bus", 16).unwrap();
        net.set_value(bus, 0xFFFF);
        assert_eq!(net.value(bus), -1);
        net.set_slice(bus, 0, 14, 0).unwrap();
        assert_eq!(net.value(bus), -32768);
        let narrow = net.add_signal("sel", 3).unwrap();
        net.set_value(narrow, -1);
        assert_eq!(net.value(narrow), 7);
    }

    #[test]
    fn test_wire_propagates_before_returning() {
        let mut net = Netlist::new();
        let a = net.add_signal("a", 1).unwrap();
        let b = net.add_signal("b", 1).unwrap();
        let c = net.add_signal("c", 1).unwrap();
        let ab = net.connect(Wire::new(a, b)).unwrap();
        let bc = net.connect(Wire::new(b, c)).unwrap();
        assert_eq!(net.signal(a).fanout(), [ab]);
        assert_eq!(net.signal(b).fanout(), [bc]);
        assert!(net.signal(c).fanout().is_empty());
        net.set_value(a, 1);
        assert_eq!(net.value(b), 1);
        assert_eq!(net.value(c), 1);
    }

    #[test]
    fn test_bit_wire_tracks_only_its_bit() {
        let mut net = Netlist::new();
        let a = net.add_signal("a", 4).unwrap();
        let x = net.add_signal("x", 1).unwrap();
        net.connect(Wire::new(a, x).with_source_bits(Bits::Bit(1))).unwrap();
        net.set_value(a, 0b0010);
        assert_eq!(net.value(x), 1);
        net.set_value(a, 0b1101);
        assert_eq!(net.value(x), 0);
        net.set_value_at(a, 0, 0).unwrap();
        assert_eq!(net.value(x), 0);
        net.set_value_at(a, 1, 1).unwrap();
        assert_eq!(net.value(x), 1);
    }

    #[test]
    fn test_slice_wires_assemble_a_bus() {
        let mut net = Netlist::new();
        let lo = net.add_signal("lo", 8).unwrap();
        let hi = net.add_signal("hi", 8).unwrap();
        let out = net.add_signal("out", 16).unwrap();
        net.connect(Wire::new(lo, out).with_dest_bits(Bits::Range { from: 0, to: 7 }))
            .unwrap();
        net.connect(Wire::new(hi, out).with_dest_bits(Bits::Range { from: 8, to: 15 }))
            .unwrap();
        net.set_value(lo, 0x34);
        net.set_value(hi, 0x12);
        assert_eq!(net.value(out), 0x1234);
        net.set_value(hi, 0xFF);
        assert_eq!(net.value(out), -204);
    }

    #[test]
    fn test_last_write_wins() {
        let mut net = Netlist::new();
        let a = net.add_signal("a", 1).unwrap();
        let b = net.add_signal("b", 1).unwrap();
        let out = net.add_signal("out", 1).unwrap();
        net.connect(Wire::new(a, out)).unwrap();
        net.connect(Wire::new(b, out)).unwrap();
        net.set_value(a, 1);
        assert_eq!(net.value(out), 1);
        net.set_value(b, 0);
        assert_eq!(net.value(out), 0);
    }

    #[test]
    fn test_connect_checks_ranges() {
        let mut net = Netlist::new();
        let a = net.add_signal("a", 4).unwrap();
        let b = net.add_signal("b", 1).unwrap();
        let err = net
            .connect(Wire::new(a, b).with_source_bits(Bits::Range { from: 2, to: 4 }))
            .unwrap_err();
        assert!(err.is_range());
        assert_eq!(net.wire_count(), 0);
    }
}
