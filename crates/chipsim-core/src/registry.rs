//! Name lookup for built-in gate definitions.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::gate::GateDefinition;

/// Built-in definitions by chip name.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    gates: BTreeMap<String, Rc<GateDefinition>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Add a definition under its own name, replacing any earlier one.
    pub fn register(&mut self, definition: GateDefinition) -> Rc<GateDefinition> {
        let definition = Rc::new(definition);
        self.gates
            .insert(definition.name().to_owned(), Rc::clone(&definition));
        definition
    }

    /// The shared definition; every call returns the same `Rc`.
    pub fn get(&self, name: &str) -> Option<&Rc<GateDefinition>> {
        self.gates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.gates.contains_key(name)
    }

    /// Sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<GateDefinition>> {
        self.gates.values()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;

    fn not(inputs: &[i64]) -> Vec<i64> {
        vec![1 - inputs[0]]
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(GateDefinition::combinational(
            Spec::new("Xor", ["a", "b"], ["out"]),
            |inputs| vec![inputs[0] ^ inputs[1]],
        ));
        let not = registry.register(GateDefinition::combinational(
            Spec::new("Not", ["in"], ["out"]),
            not,
        ));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["Not", "Xor"]);
        assert!(Rc::ptr_eq(registry.get("Not").unwrap(), &not));
        assert!(registry.contains("Xor"));
        assert!(registry.get("Nand").is_none());
        assert_eq!(registry.len(), 2);
    }
}
