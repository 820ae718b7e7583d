//! Port specifications and the public description of a gate.

use std::collections::HashSet;

use chipsim_support::bits;
use derive_new::new;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::table::Row;

/// A named port and its width in bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, new)]
pub struct PortSpec {
    pub name: String,
    pub size: u32,
}

impl From<&str> for PortSpec {
    fn from(name: &str) -> PortSpec {
        PortSpec::new(name.to_owned(), 1)
    }
}

impl From<(&str, u32)> for PortSpec {
    fn from((name, size): (&str, u32)) -> PortSpec {
        PortSpec::new(name.to_owned(), size)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PortKind {
    Input,
    Output,
}

/// Where a port sits on a gate: its kind, and its position among all ports
/// with inputs numbered before outputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub kind: PortKind,
    pub index: usize,
}

/// The externally visible description of a gate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Spec {
    pub name: String,
    pub description: String,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    /// Signals created inside a compiled chip, in creation order.
    pub internals: Vec<PortSpec>,
    /// The canonical truth table. Always empty for compiled chips.
    pub truth_table: Vec<Row>,
}

impl Spec {
    pub fn new<I, O>(name: impl Into<String>, inputs: I, outputs: O) -> Spec
    where
        I: IntoIterator,
        I::Item: Into<PortSpec>,
        O: IntoIterator,
        O::Item: Into<PortSpec>,
    {
        Spec {
            name: name.into(),
            description: String::new(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            internals: Vec::new(),
            truth_table: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Spec {
        self.description = description.into();
        self
    }

    pub fn with_truth_table(mut self, rows: Vec<Row>) -> Spec {
        self.truth_table = rows;
        self
    }

    /// Check widths and that no name is used twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for port in self.ports().chain(&self.internals) {
            if port.size == 0 || port.size > bits::MAX_WIDTH {
                return Err(Error::InvalidWidth {
                    name: port.name.clone(),
                    size: port.size,
                });
            }
            if !seen.insert(port.name.as_str()) {
                return Err(Error::DuplicatePort {
                    gate: self.name.clone(),
                    port: port.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Inputs then outputs.
    pub fn ports(&self) -> impl Iterator<Item = &PortSpec> {
        self.inputs.iter().chain(&self.outputs)
    }

    pub fn port(&self, name: &str) -> Option<PortRef> {
        if let Some(index) = self.inputs.iter().position(|p| p.name == name) {
            return Some(PortRef {
                kind: PortKind::Input,
                index,
            });
        }
        self.outputs
            .iter()
            .position(|p| p.name == name)
            .map(|index| PortRef {
                kind: PortKind::Output,
                index: self.inputs.len() + index,
            })
    }

    /// The port at a position returned by [`Spec::port`].
    pub fn port_at(&self, index: usize) -> &PortSpec {
        match index.checked_sub(self.inputs.len()) {
            Some(output) => &self.outputs[output],
            None => &self.inputs[index],
        }
    }

    /// Total number of input bits.
    pub fn input_width(&self) -> u32 {
        self.inputs.iter().map(|p| p.size).sum()
    }
}
