//! Driver and factory registries keyed by engine and extension.
//!
//! Lookup order is: exact `(engine, extension)`, then the wildcard engine
//! [`ANY_ENGINE`] with the same extension. The driver registry falls
//! through to one explicit default driver; the factory registry has no
//! default and reports `None`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::driver::FormatDriver;
use crate::factory::ObjectFactory;
use crate::formats::TarDriver;
use crate::formats::UnknownDriver;
use crate::formats::ZipDriver;

/// Engine key matching every engine.
pub const ANY_ENGINE: &str = "*";

type Key = (String, String);

fn key(engine: &str, extension: &str) -> Key {
    (
        engine.to_ascii_lowercase(),
        extension.trim_start_matches('.').to_ascii_lowercase(),
    )
}

struct Keyed<T: ?Sized> {
    entries: HashMap<Key, Arc<T>>,
}

impl<T: ?Sized> Keyed<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, engine: &str, extension: &str, value: Arc<T>) -> Option<Arc<T>> {
        self.entries.insert(key(engine, extension), value)
    }

    fn get(&self, engine: &str, extension: &str) -> Option<&Arc<T>> {
        self.entries
            .get(&key(engine, extension))
            .or_else(|| self.entries.get(&key(ANY_ENGINE, extension)))
    }

    fn sorted_keys(&self) -> Vec<(&str, &str)> {
        let mut keys: Vec<(&str, &str)> = self
            .entries
            .keys()
            .map(|(engine, ext)| (engine.as_str(), ext.as_str()))
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// Maps `(engine, extension)` to a format driver.
///
/// # Examples
///
/// ```
/// use gamepak_core::registry::DriverRegistry;
///
/// let drivers = DriverRegistry::with_defaults();
/// assert_eq!(drivers.resolve("quake", "tar").name(), "tar");
/// assert_eq!(drivers.resolve("quake", "bsp").name(), "unknown");
/// assert!(drivers.is_container("quake", "PAK"));
/// assert!(!drivers.is_container("quake", "bsp"));
/// ```
pub struct DriverRegistry {
    drivers: Keyed<dyn FormatDriver>,
    fallback: Arc<dyn FormatDriver>,
}

impl DriverRegistry {
    /// Creates a registry with only the default driver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            drivers: Keyed::new(),
            fallback: Arc::new(UnknownDriver),
        }
    }

    /// Creates a registry with the bundled tar and zip drivers for every
    /// engine; `pak` files are read as zip.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let zip: Arc<dyn FormatDriver> = Arc::new(ZipDriver);
        registry.register(ANY_ENGINE, "tar", Arc::new(TarDriver));
        registry.register(ANY_ENGINE, "zip", Arc::clone(&zip));
        registry.register(ANY_ENGINE, "pak", zip);
        registry
    }

    /// Registers `driver`, replacing any previous one for the same key.
    pub fn register(
        &mut self,
        engine: &str,
        extension: &str,
        driver: Arc<dyn FormatDriver>,
    ) -> &mut Self {
        if let Some(previous) = self.drivers.insert(engine, extension, driver) {
            tracing::debug!(engine, extension, previous = previous.name(), "driver replaced");
        }
        self
    }

    /// Replaces the default driver.
    pub fn set_default(&mut self, driver: Arc<dyn FormatDriver>) -> &mut Self {
        self.fallback = driver;
        self
    }

    /// Returns the explicitly registered driver, if any.
    pub fn lookup(&self, engine: &str, extension: &str) -> Option<Arc<dyn FormatDriver>> {
        self.drivers.get(engine, extension).map(Arc::clone)
    }

    /// Returns the registered driver or the default one.
    pub fn resolve(&self, engine: &str, extension: &str) -> Arc<dyn FormatDriver> {
        self.lookup(engine, extension)
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// The default driver.
    pub fn default_driver(&self) -> &Arc<dyn FormatDriver> {
        &self.fallback
    }

    /// Whether files with this extension are containers for `engine`.
    ///
    /// Only explicit registrations count; the default driver never makes a
    /// file a container.
    pub fn is_container(&self, engine: &str, extension: &str) -> bool {
        self.drivers.get(engine, extension).is_some()
    }

    /// Number of explicit registrations.
    pub fn len(&self) -> usize {
        self.drivers.entries.len()
    }

    /// Returns `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.drivers.entries.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("keys", &self.drivers.sorted_keys())
            .field("default", &self.fallback.name())
            .finish()
    }
}

/// Maps `(engine, extension)` to an object factory.
pub struct FactoryRegistry {
    factories: Keyed<dyn ObjectFactory>,
}

impl FactoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: Keyed::new(),
        }
    }

    /// Registers `factory`, replacing any previous one for the same key.
    pub fn register(
        &mut self,
        engine: &str,
        extension: &str,
        factory: Arc<dyn ObjectFactory>,
    ) -> &mut Self {
        self.factories.insert(engine, extension, factory);
        self
    }

    /// Returns the factory for the combination, if any.
    pub fn resolve(&self, engine: &str, extension: &str) -> Option<Arc<dyn ObjectFactory>> {
        self.factories.get(engine, extension).map(Arc::clone)
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.factories.entries.len()
    }

    /// Returns `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.factories.entries.is_empty()
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("keys", &self.factories.sorted_keys())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Result;
    use crate::catalog::CatalogEntry;
    use crate::driver::DataContext;
    use crate::factory::ArchiveObject;
    use crate::factory::UnknownFile;

    struct Echo;

    impl ObjectFactory for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn create(
            &self,
            _ctx: &DataContext<'_>,
            entry: &CatalogEntry,
            bytes: Vec<u8>,
        ) -> Result<Box<dyn ArchiveObject>> {
            Ok(Box::new(UnknownFile::new(entry.path(), bytes)))
        }
    }

    #[test]
    fn test_exact_beats_wildcard() {
        let mut drivers = DriverRegistry::new();
        drivers.register(ANY_ENGINE, "pak", Arc::new(ZipDriver));
        drivers.register("quake", "pak", Arc::new(TarDriver));

        assert_eq!(drivers.resolve("quake", "pak").name(), "tar");
        assert_eq!(drivers.resolve("doom", "pak").name(), "zip");
        assert_eq!(drivers.len(), 2);
    }

    #[test]
    fn test_unknown_falls_through_to_default() {
        let drivers = DriverRegistry::new();
        assert!(drivers.is_empty());
        assert_eq!(drivers.resolve("quake", "pak").name(), "unknown");
        assert!(drivers.lookup("quake", "pak").is_none());
        assert!(!drivers.is_container("quake", "pak"));
    }

    #[test]
    fn test_default_driver_can_be_replaced() {
        let mut context = crate::ArchiveContext::default();
        assert_eq!(context.drivers().default_driver().name(), "unknown");

        context.drivers_mut().set_default(Arc::new(ZipDriver));
        let drivers = context.drivers();
        assert_eq!(drivers.default_driver().name(), "zip");
        assert_eq!(drivers.resolve("generic", "grp").name(), "zip");
        assert_eq!(drivers.resolve("generic", "tar").name(), "tar");
        assert!(!drivers.is_container("generic", "grp"));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let drivers = DriverRegistry::with_defaults();
        assert!(drivers.is_container("Quake", ".ZIP"));
    }

    #[test]
    fn test_factory_registry_has_no_default() {
        let mut factories = FactoryRegistry::new();
        assert!(factories.resolve("quake", "bsp").is_none());

        factories.register("quake", "bsp", Arc::new(Echo));
        assert_eq!(factories.resolve("quake", "bsp").unwrap().name(), "echo");
        assert!(factories.resolve("doom", "bsp").is_none());
    }
}
