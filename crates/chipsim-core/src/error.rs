//! Error types for the simulation core.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or driving a circuit.
///
/// Truth-table mismatches are never errors; see [`crate::ExecReport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A signal or port declared with a width of zero, or wider than a
    /// value can hold.
    #[error("`{name}` has invalid width {size}")]
    InvalidWidth { name: String, size: u32 },

    /// Two ports of one gate share a name.
    #[error("`{gate}` declares `{port}` more than once")]
    DuplicatePort { gate: String, port: String },

    /// A bit index outside the signal.
    #[error("bit {index} is out of range for `{signal}` of width {size}")]
    BitOutOfRange {
        signal: String,
        index: u32,
        size: u32,
    },

    /// A slice that is reversed or reaches outside the signal.
    #[error("bits {from}..{to} are out of range for `{signal}` of width {size}")]
    SliceOutOfRange {
        signal: String,
        from: u32,
        to: u32,
        size: u32,
    },

    /// A pin name that the gate does not declare.
    #[error("`{gate}` has no pin named `{pin}`")]
    UnknownPin { gate: String, pin: String },

    /// Re-running a generated truth table did not reproduce it.
    #[error("truth table generated for `{gate}` does not reproduce at row {row}")]
    UnstableTruthTable { gate: String, row: usize },
}

impl Error {
    /// True for the out-of-range family of errors.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Error::BitOutOfRange { .. } | Error::SliceOutOfRange { .. }
        )
    }
}
