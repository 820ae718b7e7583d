//! Batch evaluation over truth-table rows.

use std::rc::Rc;

use chipsim_support::bits;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::circuit::Circuit;
use crate::clock::ClockValue;
use crate::error::{Error, Result};

/// Inputs up to this many bits in total are enumerated exhaustively.
pub const EXHAUSTIVE_INPUT_BITS: u32 = 10;

/// Number of rows generated for wider inputs.
pub const SAMPLED_ROWS: usize = 5;

const SAMPLE_SEED: u64 = 0x6e61_6e64;

/// Pin values by name, in insertion order. Sequential tables also carry the
/// clock as a `$clock` column.
///
/// `$clock` serialises as a string such as `"+3"` or `"-0"`, not a number,
/// since the falling edge of cycle zero is `-0` and an integer cannot hold
/// the sign.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    #[serde(flatten)]
    values: IndexMap<String, i64>,
    #[serde(rename = "$clock", skip_serializing_if = "Option::is_none")]
    clock: Option<ClockValue>,
}

impl Row {
    pub fn new() -> Row {
        Row::default()
    }

    pub fn get(&self, pin: &str) -> Option<i64> {
        self.values.get(pin).copied()
    }

    pub fn set(&mut self, pin: impl Into<String>, value: i64) {
        self.values.insert(pin.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(name, &value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clock(&self) -> Option<ClockValue> {
        self.clock
    }

    #[must_use]
    pub fn with_clock(mut self, clock: ClockValue) -> Row {
        self.clock = Some(clock);
        self
    }
}

impl<const N: usize> From<[(&str, i64); N]> for Row {
    fn from(values: [(&str, i64); N]) -> Row {
        values.into_iter().collect()
    }
}

impl<'a> FromIterator<(&'a str, i64)> for Row {
    fn from_iter<T: IntoIterator<Item = (&'a str, i64)>>(iter: T) -> Row {
        iter.into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect()
    }
}

impl FromIterator<(String, i64)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Row {
        Row {
            values: iter.into_iter().collect(),
            clock: None,
        }
    }
}

/// The pins of one row whose simulated value differs from the expected one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub row: usize,
    pub pins: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExecReport {
    pub result: Vec<Row>,
    pub conflicts: Vec<Conflict>,
}

impl ExecReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TruthTableOptions {
    /// Draw sampled rows from entropy instead of the fixed seed.
    pub enforce_random: bool,
    pub seed: Option<u64>,
}

impl TruthTableOptions {
    pub fn new() -> TruthTableOptions {
        TruthTableOptions::default()
    }

    #[must_use]
    pub fn with_enforce_random(mut self, enforce_random: bool) -> TruthTableOptions {
        self.enforce_random = enforce_random;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> TruthTableOptions {
        self.seed = Some(seed);
        self
    }

    fn rng(self) -> StdRng {
        if self.enforce_random {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(self.seed.unwrap_or(SAMPLE_SEED))
        }
    }
}

impl Circuit {
    /// Drive every row through one `eval` and compare.
    ///
    /// Each row's input and output values are written to the matching pins
    /// (other names are ignored), then every input and output the row
    /// mentions is checked against the simulated value. Mismatches are
    /// reported, never raised. Clocked circuits are not clocked here.
    pub fn exec_on_data(&mut self, rows: &[Row]) -> Result<ExecReport> {
        let definition = Rc::clone(self.definition());
        let spec = definition.spec();
        let mut report = ExecReport::default();

        for (index, row) in rows.iter().enumerate() {
            for (name, value) in row.iter() {
                if spec.port(name).is_some() {
                    self.set_pin(name, value)?;
                }
            }
            self.eval();

            let mut pins = Vec::new();
            for port in spec.ports() {
                let Some(expected) = row.get(&port.name) else {
                    continue;
                };
                if bits::normalize(expected, port.size) != self.get_pin(&port.name)? {
                    pins.push(port.name.clone());
                }
            }
            if !pins.is_empty() {
                report.conflicts.push(Conflict { row: index, pins });
            }

            let mut result = self.get_pin_values();
            if let Some(clock) = row.clock() {
                result = result.with_clock(clock);
            }
            report.result.push(result);
        }
        Ok(report)
    }

    /// Synthesise a truth table from the current behaviour of the circuit.
    ///
    /// Small inputs are enumerated with the first input varying slowest;
    /// wider ones get [`SAMPLED_ROWS`] sampled rows, re-run to check that
    /// the table reproduces. Combinational rows are computed on fresh
    /// instances, so every table starts from the power-on state and this
    /// circuit's pins are left alone. Clocked circuits run each row through
    /// `eval`, `tick`, `tock`, `eval` on this circuit and record the clock.
    pub fn generate_truth_table(&mut self, options: TruthTableOptions) -> Result<Vec<Row>> {
        let spec = self.spec().clone();
        let width = spec.input_width();
        let exhaustive = width <= EXHAUSTIVE_INPUT_BITS;

        let inputs: Vec<Row> = if exhaustive {
            (0..1_i64 << width)
                .map(|combination| {
                    let mut shift = width;
                    spec.inputs
                        .iter()
                        .map(|port| {
                            shift -= port.size;
                            let value = (combination >> shift) & bits::mask(port.size);
                            (port.name.as_str(), bits::normalize(value, port.size))
                        })
                        .collect::<Row>()
                })
                .collect()
        } else {
            let mut rng = options.rng();
            (0..SAMPLED_ROWS)
                .map(|_| {
                    spec.inputs
                        .iter()
                        .map(|port| (port.name.as_str(), bits::normalize(rng.gen(), port.size)))
                        .collect::<Row>()
                })
                .collect()
        };
        debug!(gate = %spec.name, rows = inputs.len(), exhaustive, "generating truth table");

        if self.is_clocked() {
            let mut rows = Vec::with_capacity(inputs.len());
            for row in &inputs {
                self.set_pin_values(row.iter())?;
                self.eval();
                self.tick();
                self.tock();
                self.eval();
                rows.push(self.get_pin_values().with_clock(self.clock()));
            }
            return Ok(rows);
        }

        let definition = Rc::clone(self.definition());
        let rows = definition.instantiate()?.exec_on_data(&inputs)?.result;
        if !exhaustive {
            let check = definition.instantiate()?.exec_on_data(&rows)?;
            if let Some(conflict) = check.conflicts.first() {
                return Err(Error::UnstableTruthTable {
                    gate: spec.name.clone(),
                    row: conflict.row,
                });
            }
        }
        Ok(rows)
    }
}
