use crate::module::{Module, TypeKey};
use std::sync::Arc;

/// Fallback lookup for dependencies that are not part of the local registry.
///
/// Lets two otherwise independent handlers cooperate (a host and a plugin
/// registry, for instance) without merging ownership of their modules.
/// [`ModuleRegistry`](crate::registry::ModuleRegistry) implements this trait, so
/// one handler's registry can be handed to another as its provider.
pub trait ExternalModuleProvider: Send + Sync {
    /// Returns `None` when the type is unknown; the caller decides whether that is fatal.
    fn try_resolve(&self, key: TypeKey) -> Option<Arc<dyn Module>>;
}
