//! Registry of instruction sources.
//!
//! Provides a `SourceRegistry` struct for registering and retrieving source
//! factories by name. Constructed by the caller and passed by value; there is
//! no global registry.

use crate::sources::register_builtin_sources;
use hwi_common::instr::{HwError, InstructionSource, SourceFactory};
use std::collections::HashMap;
use tracing::debug;

/// Registry of available instruction sources.
pub struct SourceRegistry {
    factories: HashMap<&'static str, SourceFactory>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding the `native` and `simulation` sources.
    pub fn with_builtin_sources() -> Self {
        let mut registry = Self::new();
        register_builtin_sources(&mut registry);
        registry
    }

    /// Register a source factory.
    ///
    /// # Panics
    /// Panics if a source with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: SourceFactory) {
        if self.factories.contains_key(name) {
            panic!("Source '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a source factory by name.
    pub fn get_factory(&self, name: &str) -> Option<SourceFactory> {
        self.factories.get(name).copied()
    }

    /// Create a source instance by name.
    ///
    /// # Errors
    /// Returns `HwError::SourceNotFound` if no source with the given name is registered.
    pub fn create_source(&self, name: &str) -> Result<Box<dyn InstructionSource>, HwError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HwError::SourceNotFound(name.to_string()))?;
        let source = factory();
        debug!(source = source.name(), capabilities = %source.capabilities(), "Source created");
        Ok(source)
    }

    /// List all registered source names, sorted.
    pub fn list_sources(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
