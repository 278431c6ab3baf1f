//! Named singletons
//!
//! Process-wide objects the host looks up by name. Entries are created and
//! destroyed explicitly by the module that owns them.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ModuleError, ModuleResult};

struct SingletonEntry {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    /// Registration order
    order: usize,
}

/// Registry of named singletons
#[derive(Default)]
pub struct SingletonRegistry {
    entries: RwLock<HashMap<String, SingletonEntry>>,
    next_order: AtomicUsize,
}

impl SingletonRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value` under `name`
    pub fn register<T: Send + Sync + 'static>(&self, name: &str, value: Arc<T>) -> ModuleResult<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            return Err(ModuleError::SingletonExists(name.to_string()));
        }

        let order = self.next_order.fetch_add(1, Ordering::Relaxed);

        entries.insert(
            name.to_string(),
            SingletonEntry {
                value,
                type_name: std::any::type_name::<T>(),
                order,
            },
        );
        log::debug!("Registered singleton '{}'", name);
        Ok(())
    }

    /// Remove a singleton
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.entries.write().remove(name).is_some();
        if removed {
            log::debug!("Unregistered singleton '{}'", name);
        }
        removed
    }

    /// Typed lookup; `None` if absent or of another type
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        let value = self.entries.read().get(name)?.value.clone();
        value.downcast::<T>().ok()
    }

    /// True if `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read();
        let mut names: Vec<_> = entries.iter().map(|(name, e)| (e.order, name.clone())).collect();
        names.sort();
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// Type name of a registered singleton
    pub fn type_name(&self, name: &str) -> Option<&'static str> {
        self.entries.read().get(name).map(|e| e.type_name)
    }
}

impl std::fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_get_unregister() {
        let registry = SingletonRegistry::new();
        registry.register("Answer", Arc::new(42u32)).unwrap();
        registry.register("Name", Arc::new(String::from("void"))).unwrap();

        assert_eq!(registry.get::<u32>("Answer").as_deref(), Some(&42));
        assert!(registry.get::<String>("Answer").is_none());
        assert_eq!(registry.names(), vec!["Answer", "Name"]);
        assert_eq!(registry.type_name("Answer"), Some("u32"));

        assert!(registry.unregister("Answer"));
        assert!(!registry.unregister("Answer"));
        assert!(!registry.contains("Answer"));
    }

    #[test]
    fn test_duplicate_name() {
        let registry = SingletonRegistry::new();
        registry.register("Answer", Arc::new(1u32)).unwrap();
        let err = registry.register("Answer", Arc::new(2u32)).unwrap_err();
        assert!(matches!(err, ModuleError::SingletonExists(_)));
        assert_eq!(registry.get::<u32>("Answer").as_deref(), Some(&1));
    }

    #[test]
    fn test_concurrent_registration_orders_unique() {
        let registry = Arc::new(SingletonRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        registry.register(&format!("s{}_{}", i, j), Arc::new(j)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut orders: Vec<_> = registry.entries.read().values().map(|e| e.order).collect();
        orders.sort_unstable();
        assert_eq!(orders, (0..200).collect::<Vec<_>>());

        // Each thread's entries keep their relative order
        let names = registry.names();
        let s0: Vec<_> = names.iter().filter(|n| n.starts_with("s0_")).cloned().collect();
        assert_eq!(s0, (0..25).map(|j| format!("s0_{}", j)).collect::<Vec<_>>());
    }
}
