use crate::config::Strictness;
use crate::di::ExternalModuleProvider;
use crate::error::{ConfigurationError, Result};
use crate::module::{Module, RegistrationItem, TypeKey, downcast_module};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
struct ModuleEntry {
    key: TypeKey,
    instance: Arc<dyn Module>,
}

/// Flat mapping from concrete module type to its single instance.
///
/// Built once from a possibly nested list of [`RegistrationItem`]s and
/// read-only afterwards. Iteration follows registration order: the order in
/// which each type was first met during the depth-first expansion of groups.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
    index: HashMap<TypeId, usize>,
}

impl ModuleRegistry {
    /// Flatten `items` into a registry.
    ///
    /// A second instance of an already registered type is a
    /// [`ConfigurationError::DuplicateRegistration`]. Under [`Strictness::Strict`]
    /// it is returned immediately; under [`Strictness::Lenient`] the first
    /// instance is kept and the error is returned alongside the registry.
    pub fn from_items(
        items: impl IntoIterator<Item = RegistrationItem>,
        strictness: Strictness,
    ) -> Result<(Self, Vec<ConfigurationError>)> {
        let mut registry = Self {
            modules: Vec::new(),
            index: HashMap::new(),
        };
        let mut warnings = Vec::new();

        for item in items {
            registry.register(item, strictness, &mut warnings)?;
        }

        tracing::debug!("Registered {} modules", registry.len());
        Ok((registry, warnings))
    }

    fn register(
        &mut self,
        item: RegistrationItem,
        strictness: Strictness,
        warnings: &mut Vec<ConfigurationError>,
    ) -> Result<()> {
        let (key, instance) = match item {
            RegistrationItem::Leaf { key, module } => (key, module),
            RegistrationItem::Group(group) => {
                tracing::trace!("Expanding module group {}", group.name());
                for child in group.into_items() {
                    self.register(child, strictness, warnings)?;
                }
                return Ok(());
            }
        };

        if self.index.contains_key(&key.id()) {
            let error = ConfigurationError::duplicate(key.name());
            if strictness.is_strict() {
                tracing::error!("{}", error);
                return Err(error);
            }
            tracing::warn!("{}; keeping the first instance", error);
            warnings.push(error);
            return Ok(());
        }

        self.index.insert(key.id(), self.modules.len());
        self.modules.push(ModuleEntry { key, instance });
        Ok(())
    }

    pub fn get<T: Module>(&self) -> Option<Arc<T>> {
        self.get_by_key(TypeKey::of::<T>())
            .and_then(downcast_module::<T>)
    }

    pub fn get_by_key(&self, key: TypeKey) -> Option<Arc<dyn Module>> {
        self.get_by_type_id(key.id())
    }

    pub fn get_by_type_id(&self, type_id: TypeId) -> Option<Arc<dyn Module>> {
        let position = self.index.get(&type_id)?;
        self.modules
            .get(*position)
            .map(|entry| Arc::clone(&entry.instance))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    /// Registered types, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.modules.iter().map(|entry| entry.key)
    }

    /// Registered modules, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeKey, &Arc<dyn Module>)> + '_ {
        self.modules.iter().map(|entry| (entry.key, &entry.instance))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ExternalModuleProvider for ModuleRegistry {
    fn try_resolve(&self, key: TypeKey) -> Option<Arc<dyn Module>> {
        self.get_by_key(key)
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
