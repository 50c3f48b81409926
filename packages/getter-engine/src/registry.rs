//! Registry of known getters.
//!
//! Built once at startup by calling [`GetterRegistry::register`] for every
//! getter the application ships, then shared read-only. Registration order
//! is kept: it is the order `run all` executes in.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = GetterRegistry::new();
//! registry.register(ZorgkaartGetter::new(client.clone(), concurrency))?;
//! registry.register_fn("nl_static_list", || async { Ok(vec![]) })?;
//!
//! let getter = registry.find("nl_static_list")?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::traits::getter::{FnGetter, Getter};
use crate::types::record::Record;

/// Ordered, name-indexed set of getters.
#[derive(Default)]
pub struct GetterRegistry {
    getters: Vec<Arc<dyn Getter>>,
    index: HashMap<&'static str, usize>,
}

impl GetterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a getter under its own name.
    ///
    /// Fails with [`EngineError::DuplicateJob`] if the name is taken, so a
    /// second getter can never silently shadow the first.
    pub fn register<G: Getter>(&mut self, getter: G) -> Result<()> {
        self.register_arc(Arc::new(getter))
    }

    /// Register a getter from a name and an async closure.
    pub fn register_fn<F, Fut>(&mut self, name: &'static str, fetch: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<Record>>> + Send + 'static,
    {
        self.register(FnGetter::new(name, fetch))
    }

    /// Register an already shared getter.
    pub fn register_arc(&mut self, getter: Arc<dyn Getter>) -> Result<()> {
        let name = getter.name();
        if self.index.contains_key(name) {
            return Err(EngineError::DuplicateJob {
                name: name.to_string(),
            });
        }

        self.index.insert(name, self.getters.len());
        self.getters.push(getter);
        Ok(())
    }

    /// Find a getter by name. Surrounding whitespace is ignored.
    pub fn find(&self, name: &str) -> Result<Arc<dyn Getter>> {
        let name = name.trim();
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.getters[i]))
            .ok_or_else(|| EngineError::JobNotFound {
                name: name.to_string(),
            })
    }

    /// Check if a getter name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name.trim())
    }

    /// All getters in registration order.
    pub fn list(&self) -> &[Arc<dyn Getter>] {
        &self.getters
    }

    /// All getter names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.getters.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.getters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.getters.is_empty()
    }
}

impl std::fmt::Debug for GetterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetterRegistry")
            .field("getters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_getter(registry: &mut GetterRegistry, name: &'static str) -> Result<()> {
        registry.register_fn(name, || async { Ok(Vec::new()) })
    }

    #[test]
    fn keeps_registration_order() {
        let mut registry = GetterRegistry::new();
        empty_getter(&mut registry, "nl_c").unwrap();
        empty_getter(&mut registry, "nl_a").unwrap();
        empty_getter(&mut registry, "nl_b").unwrap();

        assert_eq!(registry.names(), vec!["nl_c", "nl_a", "nl_b"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = GetterRegistry::new();
        empty_getter(&mut registry, "nl_a").unwrap();

        let err = empty_getter(&mut registry, "nl_a").unwrap_err();
        assert!(matches!(err, EngineError::DuplicateJob { ref name } if name == "nl_a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn find_by_name() {
        let mut registry = GetterRegistry::new();
        empty_getter(&mut registry, "nl_a").unwrap();

        assert_eq!(registry.find("nl_a").unwrap().name(), "nl_a");
        assert_eq!(registry.find(" nl_a\n").unwrap().name(), "nl_a");
        assert!(registry.contains("nl_a"));
    }

    #[test]
    fn unknown_name_is_not_found() {
        let registry = GetterRegistry::new();

        let err = registry.find("nl_missing").err().unwrap();
        assert!(matches!(err, EngineError::JobNotFound { ref name } if name == "nl_missing"));
        assert!(!registry.contains("nl_missing"));
    }
}
