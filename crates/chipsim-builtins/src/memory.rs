//! Clocked chips. Inputs are sampled on the rising edge; outputs change on
//! the falling edge.

use chipsim_core::{Clocked, GateDefinition, Registry, Spec};
use chipsim_support::bits::int16;

pub(crate) fn register(registry: &mut Registry) {
    registry.register(GateDefinition::clocked(
        Spec::new("DFF", ["in"], ["out"])
            .with_description("Data flip-flop: out(t) = in(t-1)."),
        Clocked::new(1, latch, first),
    ));
    registry.register(GateDefinition::clocked(
        Spec::new("Bit", ["in", "load"], ["out"])
            .with_description("1-bit register: stores in when load is set."),
        Clocked::new(1, load, first),
    ));
    for (name, description) in [
        ("Register", "16-bit register: stores in when load is set."),
        ("ARegister", "Address register of the CPU."),
        ("DRegister", "Data register of the CPU."),
    ] {
        registry.register(GateDefinition::clocked(
            Spec::new(name, [("in", 16), ("load", 1)], [("out", 16)])
                .with_description(description),
            Clocked::new(1, load, first),
        ));
    }
    registry.register(GateDefinition::clocked(
        Spec::new(
            "PC",
            [("in", 16), ("load", 1), ("inc", 1), ("reset", 1)],
            [("out", 16)],
        )
        .with_description("Program counter: reset, else load, else increment, else hold."),
        Clocked::new(1, counter, first),
    ));
    registry.register(GateDefinition::clocked(
        Spec::new(
            "RAM8",
            [("in", 16), ("load", 1), ("address", 3)],
            [("out", 16)],
        )
        .with_description("Eight 16-bit registers."),
        Clocked::new(8 + 1, ram_up::<8>, ram_down::<8>),
    ));
    registry.register(GateDefinition::clocked(
        Spec::new(
            "RAM64",
            [("in", 16), ("load", 1), ("address", 6)],
            [("out", 16)],
        )
        .with_description("Sixty-four 16-bit registers."),
        Clocked::new(64 + 1, ram_up::<64>, ram_down::<64>),
    ));
}

fn first(state: &[i64]) -> Vec<i64> {
    vec![state[0]]
}

fn latch(inputs: &[i64], state: &mut [i64]) {
    state[0] = inputs[0];
}

fn load(inputs: &[i64], state: &mut [i64]) {
    if inputs[1] != 0 {
        state[0] = inputs[0];
    }
}

fn counter(inputs: &[i64], state: &mut [i64]) {
    let [input, load, inc, reset] = [inputs[0], inputs[1], inputs[2], inputs[3]];
    if reset != 0 {
        state[0] = 0;
    } else if load != 0 {
        state[0] = input;
    } else if inc != 0 {
        state[0] = int16(state[0] + 1);
    }
}

/// Word index of `address` in a memory of `N` words.
fn slot<const N: usize>(address: i64) -> usize {
    usize::try_from(address).map_or(0, |address| address % N)
}

/// State holds the `N` words, then the address seen on the last rising edge.
fn ram_up<const N: usize>(inputs: &[i64], state: &mut [i64]) {
    let [input, load, address] = [inputs[0], inputs[1], inputs[2]];
    if load != 0 {
        state[slot::<N>(address)] = input;
    }
    state[N] = address;
}

fn ram_down<const N: usize>(state: &[i64]) -> Vec<i64> {
    vec![state[slot::<N>(state[N])]]
}

#[cfg(test)]
mod tests {
    use crate::registry;

    #[test]
    fn test_bit_holds_without_load() {
        let mut bit = registry().get("Bit").unwrap().instantiate().unwrap();
        bit.set_pin_values([("in", 1), ("load", 1)]).unwrap();
        bit.cycle();
        assert_eq!(bit.get_pin("out").unwrap(), 1);
        bit.set_pin_values([("in", 0), ("load", 0)]).unwrap();
        bit.cycle();
        assert_eq!(bit.get_pin("out").unwrap(), 1);
    }

    #[test]
    fn test_pc_priority() {
        let mut pc = registry().get("PC").unwrap().instantiate().unwrap();
        pc.set_pin_values([("inc", 1)]).unwrap();
        pc.cycles(3);
        assert_eq!(pc.get_pin("out").unwrap(), 3);

        pc.set_pin_values([("in", -32768), ("load", 1)]).unwrap();
        pc.cycle();
        assert_eq!(pc.get_pin("out").unwrap(), -32768);

        pc.set_pin_values([("reset", 1)]).unwrap();
        pc.cycle();
        assert_eq!(pc.get_pin("out").unwrap(), 0);

        pc.set_pin_values([("reset", 0), ("load", 0), ("in", -1)]).unwrap();
        pc.cycle();
        assert_eq!(pc.get_pin("out").unwrap(), 1);
    }

    #[test]
    fn test_pc_wraps() {
        let mut pc = registry().get("PC").unwrap().instantiate().unwrap();
        pc.set_pin_values([("in", 32767), ("load", 1)]).unwrap();
        pc.cycle();
        pc.set_pin_values([("load", 0), ("inc", 1)]).unwrap();
        pc.cycle();
        assert_eq!(pc.get_pin("out").unwrap(), -32768);
    }

    #[test]
    fn test_ram_words_are_independent() {
        let mut ram = registry().get("RAM8").unwrap().instantiate().unwrap();
        for address in 0..8 {
            ram.set_pin_values([("in", 1000 + address), ("load", 1), ("address", address)])
                .unwrap();
            ram.cycle();
        }
        ram.set_pin("load", 0).unwrap();
        for address in (0..8).rev() {
            ram.set_pin_values([("in", -1), ("address", address)]).unwrap();
            ram.cycle();
            assert_eq!(ram.get_pin("out").unwrap(), 1000 + address);
        }
    }
}
