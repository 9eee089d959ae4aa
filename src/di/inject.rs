use crate::module::Module;
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;

/// A field that receives another module's singleton during the injection pass.
///
/// The slot starts empty and is filled by [`Resolver::inject`](super::Resolver::inject)
/// after every module has been initialized. If the dependency cannot be
/// resolved the slot stays empty and the handler reports a configuration error.
///
/// # Example
/// ```
/// use modhandler::{Inject, Module, Resolver};
///
/// struct Database;
/// impl Module for Database {}
///
/// struct UserService {
///     database: Inject<Database>,
/// }
///
/// impl Module for UserService {
///     fn set_dependencies(&self, resolver: &mut Resolver<'_>) {
///         resolver.inject(&self.database);
///     }
/// }
/// ```
pub struct Inject<T: Module> {
    slot: ArcSwapOption<T>,
}

impl<T: Module> Inject<T> {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::from(None),
        }
    }

    /// The injected instance, if resolution succeeded.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    pub fn is_set(&self) -> bool {
        self.slot.load().is_some()
    }

    pub(crate) fn set(&self, instance: Arc<T>) {
        self.slot.store(Some(instance));
    }
}

impl<T: Module> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Module> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("target", &std::any::type_name::<T>())
            .field("set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Target;
    impl Module for Target {}

    #[test]
    fn test_slot_starts_empty_and_holds_same_instance() {
        let slot = Inject::<Target>::default();
        assert!(!slot.is_set());
        assert!(slot.get().is_none());

        let instance = Arc::new(Target);
        slot.set(Arc::clone(&instance));
        assert!(slot.is_set());
        assert!(Arc::ptr_eq(&slot.get().unwrap(), &instance));
    }
}
