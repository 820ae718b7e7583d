//! Error types for the compiler.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad widths, duplicate ports, or an index outside a signal.
    #[error(transparent)]
    Core(#[from] chipsim_core::Error),

    #[error("syntax error at {0}")]
    Parse(#[from] chipsim_hdl::Error),

    /// A part that is neither built in nor found in the lookup context.
    #[error("unknown chip `{name}`")]
    UnknownChip { name: String },

    /// A part argument naming a port the part does not have.
    #[error("`{part}` has no port named `{port}`")]
    UnknownPort { part: String, port: String },

    #[error("cannot bind a constant to output `{port}` of `{part}`")]
    ConstantOutput { part: String, port: String },

    /// A chip that uses itself, directly or through other chips.
    #[error("`{name}` is used inside its own definition")]
    RecursiveChip { name: String },

    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
