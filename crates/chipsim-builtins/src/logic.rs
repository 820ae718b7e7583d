use chipsim_core::{GateDefinition, Registry, Spec};
use chipsim_support::bits::int16;

use crate::{bit, table};

const WAY: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

pub(crate) fn register(registry: &mut Registry) {
    registry.register(GateDefinition::combinational(
        Spec::new("Nand", ["a", "b"], ["out"])
            .with_description("Not and: 0 only when both inputs are 1.")
            .with_truth_table(table(
                ["a", "b", "out"],
                &[[0, 0, 1], [0, 1, 1], [1, 0, 1], [1, 1, 0]],
            )),
        nand,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Not", ["in"], ["out"])
            .with_description("Inverter.")
            .with_truth_table(table(["in", "out"], &[[0, 1], [1, 0]])),
        not,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("And", ["a", "b"], ["out"])
            .with_description("1 when both inputs are 1.")
            .with_truth_table(table(
                ["a", "b", "out"],
                &[[0, 0, 0], [0, 1, 0], [1, 0, 0], [1, 1, 1]],
            )),
        and,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Or", ["a", "b"], ["out"])
            .with_description("1 when either input is 1.")
            .with_truth_table(table(
                ["a", "b", "out"],
                &[[0, 0, 0], [0, 1, 1], [1, 0, 1], [1, 1, 1]],
            )),
        or,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Xor", ["a", "b"], ["out"])
            .with_description("1 when the inputs differ.")
            .with_truth_table(table(
                ["a", "b", "out"],
                &[[0, 0, 0], [0, 1, 1], [1, 0, 1], [1, 1, 0]],
            )),
        xor,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Mux", ["a", "b", "sel"], ["out"])
            .with_description("out = a if sel == 0, else b.")
            .with_truth_table(table(
                ["a", "b", "sel", "out"],
                &[
                    [0, 0, 0, 0],
                    [0, 0, 1, 0],
                    [0, 1, 0, 0],
                    [0, 1, 1, 1],
                    [1, 0, 0, 1],
                    [1, 0, 1, 0],
                    [1, 1, 0, 1],
                    [1, 1, 1, 1],
                ],
            )),
        mux,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("DMux", ["in", "sel"], ["a", "b"])
            .with_description("Routes in to a if sel == 0, else to b.")
            .with_truth_table(table(
                ["in", "sel", "a", "b"],
                &[[0, 0, 0, 0], [0, 1, 0, 0], [1, 0, 1, 0], [1, 1, 0, 1]],
            )),
        dmux,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Not16", [("in", 16)], [("out", 16)])
            .with_description("16-bit inverter.")
            .with_truth_table(table(
                ["in", "out"],
                &[
                    [0, -1],
                    [-1, 0],
                    [-21846, 21845],
                    [15555, -15556],
                    [4660, -4661],
                ],
            )),
        not16,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("And16", [("a", 16), ("b", 16)], [("out", 16)])
            .with_description("16-bit bitwise and.")
            .with_truth_table(table(
                ["a", "b", "out"],
                &[
                    [0, 0, 0],
                    [0, -1, 0],
                    [-1, -1, -1],
                    [-21846, 21845, 0],
                    [15555, 4080, 3264],
                    [4660, -26506, 4148],
                ],
            )),
        and,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Or16", [("a", 16), ("b", 16)], [("out", 16)])
            .with_description("16-bit bitwise or.")
            .with_truth_table(table(
                ["a", "b", "out"],
                &[
                    [0, 0, 0],
                    [0, -1, -1],
                    [-1, -1, -1],
                    [-21846, 21845, -1],
                    [15555, 4080, 16371],
                    [4660, -26506, -25994],
                ],
            )),
        or,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Mux16", [("a", 16), ("b", 16), ("sel", 1)], [("out", 16)])
            .with_description("16-bit multiplexor.")
            .with_truth_table(table(
                ["a", "b", "sel", "out"],
                &[
                    [0, 0, 0, 0],
                    [0, 0, 1, 0],
                    [0, 4660, 0, 0],
                    [0, 4660, 1, 4660],
                    [-26506, 0, 0, -26506],
                    [-26506, 0, 1, 0],
                    [-21846, 21845, 0, -21846],
                    [-21846, 21845, 1, 21845],
                ],
            )),
        mux,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("Or8Way", [("in", 8)], ["out"])
            .with_description("1 when any of the 8 input bits is 1.")
            .with_truth_table(table(
                ["in", "out"],
                &[[0, 0], [255, 1], [16, 1], [1, 1], [38, 1]],
            )),
        or8way,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new(
            "Mux4Way16",
            [("a", 16), ("b", 16), ("c", 16), ("d", 16), ("sel", 2)],
            [("out", 16)],
        )
        .with_description("Selects one of four 16-bit inputs.")
        .with_truth_table(table(
            ["a", "b", "c", "d", "sel", "out"],
            &[
                [0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 1, 0],
                [0, 0, 0, 0, 2, 0],
                [0, 0, 0, 0, 3, 0],
                [4660, -26506, -21846, 21845, 0, 4660],
                [4660, -26506, -21846, 21845, 1, -26506],
                [4660, -26506, -21846, 21845, 2, -21846],
                [4660, -26506, -21846, 21845, 3, 21845],
            ],
        )),
        select,
    ));
    let words = [4660, 9029, 13398, 17767, 22136, 26505, 30874, -30293];
    let mut mux8_rows = Vec::new();
    for sel in 0..8 {
        let mut row = [0; 10];
        row[8] = sel;
        mux8_rows.push(row);
    }
    for (sel, &word) in (0..8).zip(&words) {
        let mut row = [0; 10];
        row[..8].copy_from_slice(&words);
        row[8] = sel;
        row[9] = word;
        mux8_rows.push(row);
    }
    registry.register(GateDefinition::combinational(
        Spec::new(
            "Mux8Way16",
            WAY.iter().map(|&name| (name, 16_u32)).chain([("sel", 3)]),
            [("out", 16)],
        )
        .with_description("Selects one of eight 16-bit inputs.")
        .with_truth_table(table(
            ["a", "b", "c", "d", "e", "f", "g", "h", "sel", "out"],
            &mux8_rows,
        )),
        select,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("DMux4Way", [("in", 1), ("sel", 2)], WAY[..4].iter().copied())
            .with_description("Routes in to one of four outputs.")
            .with_truth_table(table(
                ["in", "sel", "a", "b", "c", "d"],
                &demux_rows::<4, 6>(),
            )),
        route,
    ));
    registry.register(GateDefinition::combinational(
        Spec::new("DMux8Way", [("in", 1), ("sel", 3)], WAY)
            .with_description("Routes in to one of eight outputs.")
            .with_truth_table(table(
                ["in", "sel", "a", "b", "c", "d", "e", "f", "g", "h"],
                &demux_rows::<8, 10>(),
            )),
        route,
    ));
}

/// Every `in`/`sel` combination of a demultiplexor with `WAYS` outputs.
/// `N` is `WAYS + 2`.
fn demux_rows<const WAYS: usize, const N: usize>() -> Vec<[i64; N]> {
    let mut rows = Vec::new();
    for input in 0..2 {
        for (sel, target) in (0..).zip(0..WAYS) {
            let mut row = [0; N];
            row[0] = input;
            row[1] = sel;
            row[2 + target] = input;
            rows.push(row);
        }
    }
    rows
}

fn nand(inputs: &[i64]) -> Vec<i64> {
    vec![bit(inputs[0] & inputs[1] == 0)]
}

fn not(inputs: &[i64]) -> Vec<i64> {
    vec![bit(inputs[0] == 0)]
}

fn and(inputs: &[i64]) -> Vec<i64> {
    vec![inputs[0] & inputs[1]]
}

fn or(inputs: &[i64]) -> Vec<i64> {
    vec![inputs[0] | inputs[1]]
}

fn xor(inputs: &[i64]) -> Vec<i64> {
    vec![inputs[0] ^ inputs[1]]
}

fn mux(inputs: &[i64]) -> Vec<i64> {
    vec![if inputs[2] == 0 { inputs[0] } else { inputs[1] }]
}

fn dmux(inputs: &[i64]) -> Vec<i64> {
    let [input, sel] = [inputs[0], inputs[1]];
    vec![bit(sel == 0) & input, bit(sel == 1) & input]
}

fn not16(inputs: &[i64]) -> Vec<i64> {
    vec![int16(!inputs[0])]
}

fn or8way(inputs: &[i64]) -> Vec<i64> {
    vec![bit(inputs[0] != 0)]
}

/// The last input selects among the others.
fn select(inputs: &[i64]) -> Vec<i64> {
    let Some((&sel, words)) = inputs.split_last() else {
        return vec![0];
    };
    let word = usize::try_from(sel).ok().and_then(|index| words.get(index));
    vec![word.copied().unwrap_or(0)]
}

/// `in` goes to the output numbered by `sel`, the others are 0. Values past
/// the last output are dropped by the caller.
fn route(inputs: &[i64]) -> Vec<i64> {
    let [input, sel] = [inputs[0], inputs[1]];
    (0..8).map(|k| if k == sel { input } else { 0 }).collect()
}
