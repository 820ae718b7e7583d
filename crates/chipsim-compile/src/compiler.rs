use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use chipsim_core::ast::{Argument, Chip, ChipCall, Name, Value};
use chipsim_core::{
    Bits, Composite, Connection, Endpoint, GateDefinition, Part, PartConstant, PortKind, PortSpec,
    Registry, Spec, Terminal,
};
use indexmap::IndexMap;
use tracing::debug;

use crate::context::LookupContext;
use crate::error::{Error, Result};

/// Compiles chips, caching the result per lookup context and source text.
#[derive(Debug)]
pub struct Compiler {
    registry: Registry,
    cache: HashMap<LookupContext, HashMap<String, Rc<GateDefinition>>>,
    /// Chips being compiled, outermost first.
    in_progress: Vec<String>,
}

impl Default for Compiler {
    /// A compiler over the standard built-in catalog.
    fn default() -> Compiler {
        Compiler::new(chipsim_builtins::registry())
    }
}

impl Compiler {
    pub fn new(registry: Registry) -> Compiler {
        Compiler {
            registry,
            cache: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Compile HDL text. Returns the cached definition when this exact text
    /// was already compiled in `context`.
    pub fn compile_source(
        &mut self,
        source: &str,
        context: &LookupContext,
    ) -> Result<Rc<GateDefinition>> {
        if let Some(definition) = self.cache.get(context).and_then(|chips| chips.get(source)) {
            debug!(chip = definition.name(), "cache hit");
            return Ok(Rc::clone(definition));
        }
        let chip = chipsim_hdl::parse(source)?;
        let definition = self.compile_chip(&chip, context)?;
        self.cache
            .entry(context.clone())
            .or_default()
            .insert(source.to_owned(), Rc::clone(&definition));
        Ok(definition)
    }

    /// Compile a chip file, resolving custom parts from its directory.
    pub fn compile_file(&mut self, path: &Path) -> Result<Rc<GateDefinition>> {
        let source = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_owned(),
            _ => ".".into(),
        };
        self.compile_source(&source, &LookupContext::Directory(dir))
    }

    /// Compile a parsed chip. A chip that only names a built-in yields that
    /// built-in's own definition.
    pub fn compile_chip(
        &mut self,
        chip: &Chip,
        context: &LookupContext,
    ) -> Result<Rc<GateDefinition>> {
        if chip.is_builtin_only() {
            let name = &chip.builtins[0].value;
            debug!(chip = %chip.name, builtin = %name, "built-in chip");
            return self.builtin(name);
        }

        self.in_progress.push(chip.name.clone());
        let result = self.compile_composite(chip, context);
        self.in_progress.pop();
        let definition = Rc::new(result?);
        debug!(chip = %chip.name, parts = chip.parts.len(), "compiled");
        Ok(definition)
    }

    fn builtin(&self, name: &str) -> Result<Rc<GateDefinition>> {
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownChip {
                name: name.to_owned(),
            })
    }

    fn compile_composite(
        &mut self,
        chip: &Chip,
        context: &LookupContext,
    ) -> Result<GateDefinition> {
        let mut builder = ChipBuilder::new(chip)?;
        for call in &chip.parts {
            let definition = self.resolve_part(chip, &call.name, context)?;
            let part = builder.bind_part(definition, call)?;
            builder.parts.push(part);
        }
        for pin in &chip.clocked {
            if !builder.is_port(&pin.value) {
                return Err(chipsim_core::Error::UnknownPin {
                    gate: chip.name.clone(),
                    pin: pin.value.clone(),
                }
                .into());
            }
        }
        builder.finish()
    }

    /// Find the definition of a part used inside `chip`.
    fn resolve_part(
        &mut self,
        chip: &Chip,
        name: &str,
        context: &LookupContext,
    ) -> Result<Rc<GateDefinition>> {
        if chip.builtins.iter().any(|builtin| builtin.value == name) {
            debug!(part = name, "pinned to built-in");
            return self.builtin(name);
        }
        if let Some(source) = context.find(name)? {
            if self.in_progress.iter().any(|outer| outer == name) {
                return Err(Error::RecursiveChip {
                    name: name.to_owned(),
                });
            }
            debug!(part = name, "custom");
            return self.compile_source(&source, context);
        }
        debug!(part = name, "built-in");
        self.builtin(name)
    }
}

/// The signals of a chip under construction, numbered inputs, outputs,
/// then internals in order of first use.
struct ChipBuilder {
    spec: Spec,
    signals: IndexMap<String, u32>,
    parts: Vec<Part>,
}

impl ChipBuilder {
    fn new(chip: &Chip) -> Result<ChipBuilder> {
        let declared = |names: &[Name]| -> Vec<PortSpec> {
            names
                .iter()
                .map(|name| PortSpec::new(name.value.clone(), name.size.unwrap_or(1)))
                .collect()
        };
        let spec = Spec::new(chip.name.clone(), declared(&chip.inputs), declared(&chip.outputs));
        spec.validate()?;
        let signals = spec
            .ports()
            .map(|port| (port.name.clone(), port.size))
            .collect();
        Ok(ChipBuilder {
            spec,
            signals,
            parts: Vec::new(),
        })
    }

    fn is_port(&self, name: &str) -> bool {
        self.spec.port(name).is_some()
    }

    /// The slot and size of a chip signal, creating an internal signal on
    /// first use. A new signal is wide enough for the bits `value` addresses;
    /// a bare name takes the width of the part bits it is bound to.
    fn signal(&mut self, value: &Name, bound_width: u32) -> Result<(usize, u32)> {
        if let Some((slot, _, &size)) = self.signals.get_full(&value.value) {
            return Ok((slot, size));
        }
        let size = match value.bits() {
            Bits::All => Some(bound_width),
            Bits::Bit(index) => index.checked_add(1),
            Bits::Range { to, .. } => to.checked_add(1),
        }
        .ok_or_else(|| chipsim_core::Error::InvalidWidth {
            name: value.value.clone(),
            size: u32::MAX,
        })?;
        self.spec.internals.push(PortSpec::new(value.value.clone(), size));
        let (slot, _) = self.signals.insert_full(value.value.clone(), size);
        Ok((slot, size))
    }

    fn bind_part(&mut self, definition: Rc<GateDefinition>, call: &ChipCall) -> Result<Part> {
        let mut part = Part::new(Rc::clone(&definition));
        let part_spec = definition.spec();
        for Argument { name, value } in &call.arguments {
            let port = part_spec.port(&name.value).ok_or_else(|| Error::UnknownPort {
                part: call.name.clone(),
                port: name.value.clone(),
            })?;
            let port_size = part_spec.port_at(port.index).size;
            let port_bits = name.bits();
            port_bits.check(&name.value, port_size)?;

            let value = match value {
                Value::Constant(constant) => {
                    if port.kind == PortKind::Output {
                        return Err(Error::ConstantOutput {
                            part: call.name.clone(),
                            port: name.value.clone(),
                        });
                    }
                    part.constants
                        .push(PartConstant::new(port.index, port_bits, constant.value));
                    continue;
                }
                Value::Name(value) => value,
            };

            let (slot, size) = self.signal(value, port_bits.width(port_size))?;
            let value_bits = value.bits();
            value_bits.check(&value.value, size)?;
            let chip_end = Endpoint::new(Terminal::Chip(slot), value_bits);
            let part_end = Endpoint::new(Terminal::Part(port.index), port_bits);
            part.connections.push(match port.kind {
                PortKind::Input => Connection::new(chip_end, part_end),
                PortKind::Output => Connection::new(part_end, chip_end),
            });
        }
        Ok(part)
    }

    fn finish(self) -> Result<GateDefinition> {
        self.spec.validate()?;
        Ok(GateDefinition::Composite(Composite::new(self.spec, self.parts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> Result<Rc<GateDefinition>> {
        Compiler::default().compile_source(source, &LookupContext::Empty)
    }

    #[test]
    fn test_internal_signals_in_creation_order() {
        let and = compile(
            "CHIP And2 {
                IN a, b;
                OUT out;
                PARTS:
                Nand(a=a, b=b, out=n);
                Not(in=n, out=m);
                Not(in=m, out=k);
                Not(in=k, out=out);
            }",
        )
        .unwrap();
        let names = and
            .spec()
            .internals
            .iter()
            .map(|port| port.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["n", "m", "k"]);
        assert!(and.spec().truth_table.is_empty());
    }

    #[test]
    fn test_internal_width() {
        let chip = compile(
            "CHIP W {
                IN a[16], b[16];
                OUT out;
                PARTS:
                Add16(a=a, b=b, out=sum, out[0..3]=low);
                Or(a=sum[15], b=bit[2], out=out);
            }",
        )
        .unwrap();
        assert_eq!(
            chip.spec().internals,
            [
                PortSpec::new("sum".to_owned(), 16),
                PortSpec::new("low".to_owned(), 4),
                PortSpec::new("bit".to_owned(), 3),
            ]
        );
    }

    #[test]
    fn test_builtin_only_returns_registry_entry() {
        let mut compiler = Compiler::default();
        let nand = compiler
            .compile_source("CHIP Nand { IN a, b; OUT out; BUILTIN Nand; }", &LookupContext::Empty)
            .unwrap();
        assert!(Rc::ptr_eq(&nand, compiler.registry().get("Nand").unwrap()));
    }

    #[test]
    fn test_unknown_part_and_port() {
        let err = compile("CHIP X { IN a; OUT out; PARTS: Frob(in=a, out=out); }").unwrap_err();
        assert!(matches!(err, Error::UnknownChip { name } if name == "Frob"));

        let err = compile("CHIP X { IN a; OUT out; PARTS: Not(x=a, out=out); }").unwrap_err();
        assert!(matches!(err, Error::UnknownPort { part, port } if part == "Not" && port == "x"));
    }

    #[test]
    fn test_constant_output() {
        let err = compile("CHIP X { IN a; OUT out; PARTS: Not(in=a, out=true); }").unwrap_err();
        assert!(matches!(err, Error::ConstantOutput { .. }));
    }

    #[test]
    fn test_range_errors() {
        let err = compile("CHIP X { IN a[4]; OUT out; PARTS: Not(in=a[4], out=out); }").unwrap_err();
        assert!(matches!(err, Error::Core(ref core) if core.is_range()), "{err}");

        let err = compile("CHIP X { IN a; OUT out; PARTS: Not(in[1]=a, out=out); }").unwrap_err();
        assert!(matches!(err, Error::Core(ref core) if core.is_range()), "{err}");
    }

    #[test]
    fn test_internal_width_overflow() {
        for reference in ["x[4294967295]", "x[0..4294967295]"] {
            let source =
                format!("CHIP X {{ IN a; OUT out; PARTS: Not(in={reference}, out=out); }}");
            let err = compile(&source).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::Core(chipsim_core::Error::InvalidWidth { ref name, .. }) if name == "x"
                ),
                "{err}"
            );
        }

        let err = compile("CHIP X { IN a; OUT out; PARTS: Not(in=x[100], out=out); }").unwrap_err();
        assert!(matches!(
            err,
            Error::Core(chipsim_core::Error::InvalidWidth { size: 101, .. })
        ));
    }

    #[test]
    fn test_duplicate_port() {
        let err = compile("CHIP X { IN a, a; OUT out; PARTS: Not(in=a, out=out); }").unwrap_err();
        assert!(matches!(
            err,
            Error::Core(chipsim_core::Error::DuplicatePort { .. })
        ));
    }

    #[test]
    fn test_clocked_pin_must_be_declared() {
        let err = compile("CHIP X { IN a; OUT out; PARTS: DFF(in=a, out=out); CLOCKED b; }")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(chipsim_core::Error::UnknownPin { .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        let err = compile("CHIP X { IN a OUT out; }").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.to_string(), "syntax error at 1:15: expected `,` or `;`");
    }
}
