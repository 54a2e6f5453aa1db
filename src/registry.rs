//! Instruction set providers.
//!
//! Hosts embedding the processor can ship alternative instruction sets
//! (reduced teaching sets, extended experimental sets). Providers are
//! registered explicitly on a [`ProviderRegistry`] the host constructs and
//! passes around; there is no global registry and no load-time discovery, so
//! two hosts in one process can carry different catalogs without seeing each
//! other.

use crate::instruction::InstructionSet;
use crate::instructions;

/// A named source of an [`InstructionSet`].
pub trait InstructionSetProvider: Send + Sync {
    /// Stable identifier hosts select the set by.
    fn name(&self) -> &str;
    /// Builds a fresh instruction set.
    fn instruction_set(&self) -> InstructionSet;
}

/// The built-in instruction set under the name `"default"`.
pub struct DefaultProvider;

impl InstructionSetProvider for DefaultProvider {
    fn name(&self) -> &str {
        "default"
    }

    fn instruction_set(&self) -> InstructionSet {
        instructions::default_set()
    }
}

/// An explicit, host-owned catalog of instruction set providers.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn InstructionSetProvider>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// A registry holding only the built-in set.
    pub fn with_default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(DefaultProvider));
        registry
    }

    /// Registers a provider. A later registration under an existing name
    /// replaces the earlier one.
    pub fn register(&mut self, provider: Box<dyn InstructionSetProvider>) {
        self.providers
            .retain(|existing| existing.name() != provider.name());
        self.providers.push(provider);
    }

    /// Builds the instruction set registered under `name`.
    pub fn build(&self, name: &str) -> Option<InstructionSet> {
        self.providers
            .iter()
            .find(|provider| provider.name() == name)
            .map(|provider| provider.instruction_set())
    }

    /// Registered provider names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;

    struct Tiny;
    impl InstructionSetProvider for Tiny {
        fn name(&self) -> &str {
            "tiny"
        }

        fn instruction_set(&self) -> InstructionSet {
            InstructionSet::new(vec![Instruction::new("NOP", 0x00, 0, |_, _| Ok(()))])
        }
    }

    #[test]
    fn test_default_registry_builds_default_set() {
        let registry = ProviderRegistry::default();
        let set = registry.build("default").unwrap();
        assert!(set.by_keyword("ADD").is_some());
        assert!(registry.build("missing").is_none());
    }

    #[test]
    fn test_registration_replaces_same_name() {
        let mut registry = ProviderRegistry::with_default();
        registry.register(Box::new(Tiny));
        registry.register(Box::new(Tiny));
        assert_eq!(registry.names(), vec!["default", "tiny"]);
        assert_eq!(registry.build("tiny").unwrap().len(), 1);
    }
}
