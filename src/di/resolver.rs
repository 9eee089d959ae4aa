use super::{ExternalModuleProvider, Inject};
use crate::error::ConfigurationError;
use crate::module::{Module, TypeKey, downcast_module};
use crate::registry::ModuleRegistry;
use std::sync::Arc;

/// Types whose `#[inject]` fields can be filled from a [`Resolver`].
///
/// This trait is typically implemented automatically via `#[derive(Injectable)]`.
///
/// # Example
/// ```rust,ignore
/// use modhandler::{DeriveInjectable, Inject, Injectable, Module, Resolver};
///
/// #[derive(DeriveInjectable)]
/// pub struct UserService {
///     #[inject]
///     database: Inject<DatabaseModule>,
///     cache_ttl: u64,
/// }
///
/// impl Module for UserService {
///     fn set_dependencies(&self, resolver: &mut Resolver<'_>) {
///         self.inject_dependencies(resolver);
///     }
/// }
/// ```
pub trait Injectable {
    /// Resolve every injectable field. Failures are recorded on the resolver;
    /// fields that fail stay unset and the remaining fields are still resolved.
    fn inject_dependencies(&self, resolver: &mut Resolver<'_>);
}

/// Handed to [`Module::set_dependencies`] during the injection pass.
///
/// Looks dependencies up in the local registry first and only then in the
/// external provider.
pub struct Resolver<'a> {
    requester: TypeKey,
    registry: &'a ModuleRegistry,
    external: Option<&'a dyn ExternalModuleProvider>,
    errors: Vec<ConfigurationError>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        requester: TypeKey,
        registry: &'a ModuleRegistry,
        external: Option<&'a dyn ExternalModuleProvider>,
    ) -> Self {
        Self {
            requester,
            registry,
            external,
            errors: Vec::new(),
        }
    }

    /// The module whose dependencies are being resolved.
    pub fn requester(&self) -> TypeKey {
        self.requester
    }

    /// Fill `slot` with the singleton of `T`. Returns whether it was resolved.
    pub fn inject<T: Module>(&mut self, slot: &Inject<T>) -> bool {
        match self.resolve::<T>() {
            Some(instance) => {
                slot.set(instance);
                true
            }
            None => false,
        }
    }

    /// Resolve `T`, recording a configuration error if it cannot be found.
    pub fn resolve<T: Module>(&mut self) -> Option<Arc<T>> {
        let target = TypeKey::of::<T>();
        let Some(instance) = self.lookup(target) else {
            tracing::debug!("{} could not resolve {}", self.requester, target);
            self.errors.push(ConfigurationError::unresolved(
                self.requester.name(),
                target.name(),
            ));
            return None;
        };

        let resolved = downcast_module::<T>(instance);
        if resolved.is_none() {
            // Only reachable when a provider hands back an instance of another type.
            self.errors.push(ConfigurationError::not_a_module(
                self.requester.name(),
                target.name(),
            ));
        }
        resolved
    }

    /// Resolve an optional dependency. Absence is not reported.
    pub fn try_resolve<T: Module>(&self) -> Option<Arc<T>> {
        self.lookup(TypeKey::of::<T>()).and_then(downcast_module::<T>)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn into_errors(self) -> Vec<ConfigurationError> {
        self.errors
    }

    fn lookup(&self, target: TypeKey) -> Option<Arc<dyn Module>> {
        if let Some(local) = self.registry.get_by_key(target) {
            return Some(local);
        }
        let external = self.external?;
        let found = external.try_resolve(target);
        if found.is_some() {
            tracing::debug!("{} resolved {} from external provider", self.requester, target);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strictness;
    use crate::module::RegistrationItem;

    struct Database;
    impl Module for Database {}

    struct Cache;
    impl Module for Cache {}

    struct Service {
        database: Inject<Database>,
        cache: Inject<Cache>,
    }
    impl Module for Service {}

    /// Hands back whatever it was built with, regardless of the requested type.
    struct MisbehavingProvider(Arc<dyn Module>);

    impl ExternalModuleProvider for MisbehavingProvider {
        fn try_resolve(&self, _key: TypeKey) -> Option<Arc<dyn Module>> {
            Some(Arc::clone(&self.0))
        }
    }

    fn registry_with_database() -> ModuleRegistry {
        let (registry, _) = ModuleRegistry::from_items(
            vec![RegistrationItem::module(Database)],
            Strictness::Strict,
        )
        .unwrap();
        registry
    }

    #[test]
    fn test_injection_is_best_effort_per_field() {
        let registry = registry_with_database();
        let service = Service {
            database: Inject::new(),
            cache: Inject::new(),
        };

        let mut resolver = Resolver::new(TypeKey::of::<Service>(), &registry, None);
        assert!(resolver.inject(&service.database));
        assert!(!resolver.inject(&service.cache));

        assert!(service.database.is_set());
        assert!(!service.cache.is_set());
        let errors = resolver.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ConfigurationError::InjectionTargetUnresolved { target, .. } if target.ends_with("Cache")
        ));
    }

    #[test]
    fn test_mismatched_external_instance_is_not_a_module() {
        let registry = registry_with_database();
        let provider = MisbehavingProvider(Arc::new(Database));

        let mut resolver = Resolver::new(
            TypeKey::of::<Service>(),
            &registry,
            Some(&provider as &dyn ExternalModuleProvider),
        );
        assert!(resolver.resolve::<Cache>().is_none());
        assert!(matches!(
            resolver.into_errors().as_slice(),
            [ConfigurationError::InjectionTargetNotAModule { .. }]
        ));
    }

    #[test]
    fn test_try_resolve_does_not_record_errors() {
        let registry = registry_with_database();
        let resolver = Resolver::new(TypeKey::of::<Service>(), &registry, None);
        assert!(resolver.try_resolve::<Cache>().is_none());
        assert!(resolver.try_resolve::<Database>().is_some());
        assert!(!resolver.has_errors());
    }
}
