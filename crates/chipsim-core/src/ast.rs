//! The chip syntax tree consumed by the compiler.

use derive_new::new;

use crate::signal::Bits;

#[derive(Clone, Debug, PartialEq, Eq, Hash, new)]
pub struct Chip {
    pub name: String,
    pub inputs: Vec<Name>,
    pub outputs: Vec<Name>,
    pub parts: Vec<ChipCall>,
    pub builtins: Vec<Name>,
    pub clocked: Vec<Name>,
}

impl Chip {
    /// True when the chip only names a built-in and has no body.
    pub fn is_builtin_only(&self) -> bool {
        self.parts.is_empty() && !self.builtins.is_empty()
    }
}

/// A pin reference: `a`, `a[16]` in a declaration, `a[3]` or `a[0..7]` in
/// an argument.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Name {
    pub value: String,
    pub size: Option<u32>,
    pub index: Option<u32>,
    pub range: Option<BitRange>,
}

impl Name {
    pub fn simple(value: impl Into<String>) -> Name {
        Name {
            value: value.into(),
            ..Name::default()
        }
    }

    pub fn sized(value: impl Into<String>, size: u32) -> Name {
        Name {
            size: Some(size),
            ..Name::simple(value)
        }
    }

    pub fn indexed(value: impl Into<String>, index: u32) -> Name {
        Name {
            index: Some(index),
            ..Name::simple(value)
        }
    }

    pub fn ranged(value: impl Into<String>, from: u32, to: u32) -> Name {
        Name {
            range: Some(BitRange::new(from, to)),
            ..Name::simple(value)
        }
    }

    /// The bits this name addresses.
    pub fn bits(&self) -> Bits {
        match (self.index, self.range) {
            (Some(index), _) => Bits::Bit(index),
            (None, Some(BitRange { from, to })) => Bits::Range { from, to },
            (None, None) => Bits::All,
        }
    }
}

/// An inclusive bit range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, new)]
pub struct BitRange {
    pub from: u32,
    pub to: u32,
}

/// One part instantiation: `Name(arg=value, ...)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, new)]
pub struct ChipCall {
    pub name: String,
    pub arguments: Vec<Argument>,
}

/// `name=value`; `name` is the part's port, `value` the chip side.
#[derive(Clone, Debug, PartialEq, Eq, Hash, new)]
pub struct Argument {
    pub name: Name,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Name(Name),
    Constant(Constant),
}

/// A literal bound to a part input. `true` is all ones at any width.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, new)]
pub struct Constant {
    pub value: i64,
}

impl Constant {
    pub const TRUE: Constant = Constant { value: -1 };
    pub const FALSE: Constant = Constant { value: 0 };
}
