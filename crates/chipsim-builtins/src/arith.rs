use chipsim_core::{GateDefinition, Registry, Spec};
use chipsim_support::bits::int16;

use crate::{bit, table};

pub(crate) fn register(registry: &mut Registry) {
    registry.register(GateDefinition::combinational(
        Spec::new("HalfAdder", ["a", "b"], ["sum", "carry"])
            .with_description("Sum and carry of two bits.")
            .with_truth_table(table(
                ["a", "b", "sum", "carry"],
                &[[0, 0, 0, 0], [0, 1, 1, 0], [1, 0, 1, 0], [1, 1, 0, 1]],
            )),
        half_adder,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("FullAdder", ["a", "b", "c"], ["sum", "carry"])
            .with_description("Sum and carry of three bits.")
            .with_truth_table(table(
                ["a", "b", "c", "sum", "carry"],
                &[
                    [0, 0, 0, 0, 0],
                    [0, 0, 1, 1, 0],
                    [0, 1, 0, 1, 0],
                    [0, 1, 1, 0, 1],
                    [1, 0, 0, 1, 0],
                    [1, 0, 1, 0, 1],
                    [1, 1, 0, 0, 1],
                    [1, 1, 1, 1, 1],
                ],
            )),
        full_adder,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Add16", [("a", 16), ("b", 16)], [("out", 16)])
            .with_description("16-bit two's complement adder. Overflow is dropped.")
            .with_truth_table(table(
                ["a", "b", "out"],
                &[
                    [0, 0, 0],
                    [0, -1, -1],
                    [-1, -1, -2],
                    [-21846, 21845, -1],
                    [15555, 4080, 19635],
                    [4660, -26506, -21846],
                ],
            )),
        add16,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Inc16", [("in", 16)], [("out", 16)])
            .with_description("16-bit incrementer.")
            .with_truth_table(table(
                ["in", "out"],
                &[[0, 1], [-1, 0], [5, 6], [-5, -4]],
            )),
        inc16,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new(
            "ALU",
            [
                ("x", 16),
                ("y", 16),
                ("zx", 1),
                ("nx", 1),
                ("zy", 1),
                ("ny", 1),
                ("f", 1),
                ("no", 1),
            ],
            [("out", 16), ("zr", 1), ("ng", 1)],
        )
        .with_description(
            "Computes x+y or x&y after optionally zeroing and negating each \
             input, then optionally negates the result. zr is set when out is \
             0, ng when out is negative.",
        )
        .with_truth_table(table(
            ["x", "y", "zx", "nx", "zy", "ny", "f", "no", "out", "zr", "ng"],
            &alu_rows(),
        )),
        alu,
    ));
}

/// The eighteen standard control settings, for two pairs of operands.
fn alu_rows() -> Vec<[i64; 11]> {
    vec![
        [0, -1, 1, 0, 1, 0, 1, 0, 0, 1, 0],
        [0, -1, 1, 1, 1, 1, 1, 1, 1, 0, 0],
        [0, -1, 1, 1, 1, 0, 1, 0, -1, 0, 1],
        [0, -1, 0, 0, 1, 1, 0, 0, 0, 1, 0],
        [0, -1, 1, 1, 0, 0, 0, 0, -1, 0, 1],
        [0, -1, 0, 0, 1, 1, 0, 1, -1, 0, 1],
        [0, -1, 1, 1, 0, 0, 0, 1, 0, 1, 0],
        [0, -1, 0, 0, 1, 1, 1, 1, 0, 1, 0],
        [0, -1, 1, 1, 0, 0, 1, 1, 1, 0, 0],
        [0, -1, 0, 1, 1, 1, 1, 1, 1, 0, 0],
        [0, -1, 1, 1, 0, 1, 1, 1, 0, 1, 0],
        [0, -1, 0, 0, 1, 1, 1, 0, -1, 0, 1],
        [0, -1, 1, 1, 0, 0, 1, 0, -2, 0, 1],
        [0, -1, 0, 0, 0, 0, 1, 0, -1, 0, 1],
        [0, -1, 0, 1, 0, 0, 1, 1, 1, 0, 0],
        [0, -1, 0, 0, 0, 1, 1, 1, -1, 0, 1],
        [0, -1, 0, 0, 0, 0, 0, 0, 0, 1, 0],
        [0, -1, 0, 1, 0, 1, 0, 1, -1, 0, 1],
        [17, 3, 1, 0, 1, 0, 1, 0, 0, 1, 0],
        [17, 3, 1, 1, 1, 1, 1, 1, 1, 0, 0],
        [17, 3, 1, 1, 1, 0, 1, 0, -1, 0, 1],
        [17, 3, 0, 0, 1, 1, 0, 0, 17, 0, 0],
        [17, 3, 1, 1, 0, 0, 0, 0, 3, 0, 0],
        [17, 3, 0, 0, 1, 1, 0, 1, -18, 0, 1],
        [17, 3, 1, 1, 0, 0, 0, 1, -4, 0, 1],
        [17, 3, 0, 0, 1, 1, 1, 1, -17, 0, 1],
        [17, 3, 1, 1, 0, 0, 1, 1, -3, 0, 1],
        [17, 3, 0, 1, 1, 1, 1, 1, 18, 0, 0],
        [17, 3, 1, 1, 0, 1, 1, 1, 4, 0, 0],
        [17, 3, 0, 0, 1, 1, 1, 0, 16, 0, 0],
        [17, 3, 1, 1, 0, 0, 1, 0, 2, 0, 0],
        [17, 3, 0, 0, 0, 0, 1, 0, 20, 0, 0],
        [17, 3, 0, 1, 0, 0, 1, 1, 14, 0, 0],
        [17, 3, 0, 0, 0, 1, 1, 1, -14, 0, 1],
        [17, 3, 0, 0, 0, 0, 0, 0, 1, 0, 0],
        [17, 3, 0, 1, 0, 1, 0, 1, 19, 0, 0],
    ]
}

fn half_adder(inputs: &[i64]) -> Vec<i64> {
    let total = inputs[0] + inputs[1];
    vec![total & 1, total >> 1]
}

fn full_adder(inputs: &[i64]) -> Vec<i64> {
    let total = inputs[0] + inputs[1] + inputs[2];
    vec![total & 1, total >> 1]
}

fn add16(inputs: &[i64]) -> Vec<i64> {
    vec![int16(inputs[0] + inputs[1])]
}

fn inc16(inputs: &[i64]) -> Vec<i64> {
    vec![int16(inputs[0] + 1)]
}

fn alu(inputs: &[i64]) -> Vec<i64> {
    let set = |k: usize| inputs[k] != 0;
    let mut x = inputs[0];
    let mut y = inputs[1];
    if set(2) {
        x = 0;
    }
    if set(3) {
        x = !x;
    }
    if set(4) {
        y = 0;
    }
    if set(5) {
        y = !y;
    }
    let mut out = if set(6) { x + y } else { x & y };
    if set(7) {
        out = !out;
    }
    let out = int16(out);
    vec![out, bit(out == 0), bit(out < 0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add16_wraps() {
        assert_eq!(add16(&[32767, 1]), [-32768]);
        assert_eq!(add16(&[-32768, -1]), [32767]);
        assert_eq!(inc16(&[-1]), [0]);
    }

    #[test]
    fn test_alu_flags() {
        // x - y with x = 3, y = 5.
        assert_eq!(alu(&[3, 5, 0, 1, 0, 0, 1, 1]), [-2, 0, 1]);
        // x & y.
        assert_eq!(alu(&[12, 10, 0, 0, 0, 0, 0, 0]), [8, 0, 0]);
        // constant 0.
        assert_eq!(alu(&[1234, -1, 1, 0, 1, 0, 1, 0]), [0, 1, 0]);
    }
}
