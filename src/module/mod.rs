//! Module capability set
//!
//! Every entity the [`ModulesHandler`](crate::lifecycle::ModulesHandler) manages
//! implements [`Module`]. The handler drives three hooks in strict order:
//!
//! ```text
//! register_all (event sink) → initialize → set_dependencies → load
//!                                   ...running...
//! unload → unregister_all (event sink)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use modhandler::{async_trait, Inject, Module, Resolver};
//!
//! pub struct SessionStore {
//!     database: Inject<DatabaseModule>,
//! }
//!
//! #[async_trait]
//! impl Module for SessionStore {
//!     fn order(&self) -> i32 {
//!         10
//!     }
//!
//!     fn set_dependencies(&self, resolver: &mut Resolver<'_>) {
//!         resolver.inject(&self.database);
//!     }
//!
//!     async fn load(&self) -> anyhow::Result<()> {
//!         let database = self.database.get().ok_or_else(|| anyhow::anyhow!("no database"))?;
//!         database.warm_up().await
//!     }
//! }
//! ```

mod group;

pub use group::{ModuleGroup, RegistrationItem};

use crate::di::Resolver;
use crate::messaging::Subscription;
use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Runtime identity of a concrete module type.
///
/// Equality and hashing only consider the [`TypeId`]; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Upcast helper so a shared `Arc<dyn Module>` can be recovered as its concrete type.
pub trait AsAny: Any + Send + Sync {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Recover the concrete type behind a type-erased module handle.
pub fn downcast_module<T: Module>(module: Arc<dyn Module>) -> Option<Arc<T>> {
    AsAny::into_any_arc(module).downcast::<T>().ok()
}

/// A unit with Initialize / Load / Unload lifecycle hooks.
///
/// Hooks take `&self`: the same instance is shared between the registry and
/// every module it is injected into, so mutable state belongs behind interior
/// mutability.
#[async_trait]
pub trait Module: AsAny {
    /// Called once, before dependencies are injected.
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once all modules are initialized and dependencies are injected.
    async fn load(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called on stop, only if `load` succeeded.
    async fn unload(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Relative position among modules in the same phase. Lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// Event handlers handed to the event sink around initialize / unload.
    fn subscriptions(&self) -> Vec<Subscription> {
        Vec::new()
    }

    /// Resolve the module's dependencies.
    ///
    /// Called once per module after every `initialize` has run. Modules that
    /// derive [`Injectable`](crate::di::Injectable) usually forward to
    /// `inject_dependencies`.
    fn set_dependencies(&self, _resolver: &mut Resolver<'_>) {}
}
