//! # modhandler
//!
//! A module lifecycle container: registry, dependency injection and ordered
//! start/stop for the building blocks of an application.
//!
//! ## Features
//!
//! - **Registry**: one instance per concrete type, groups flattened depth-first
//! - **Dependency Injection**: `Inject<T>` slots filled after every module initialized
//! - **Ordered Lifecycle**: initialize and load ascending by order, unload in reverse
//! - **Partial-failure Safety**: only modules that completed a phase are unwound
//! - **Event Wiring**: subscriptions registered and removed around each module's lifetime
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use modhandler::prelude::*;
//!
//! #[derive(Default)]
//! pub struct DatabaseModule;
//!
//! #[async_trait]
//! impl Module for DatabaseModule {
//!     fn order(&self) -> i32 {
//!         -10
//!     }
//!
//!     async fn initialize(&self) -> anyhow::Result<()> {
//!         tracing::info!("Connecting to database");
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default, Injectable)]
//! pub struct UsersModule {
//!     #[inject]
//!     database: Inject<DatabaseModule>,
//! }
//!
//! #[async_trait]
//! impl Module for UsersModule {
//!     fn set_dependencies(&self, resolver: &mut Resolver<'_>) {
//!         self.inject_dependencies(resolver);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut handler = ModulesHandler::builder()
//!         .config(HandlerConfig::from_env()?)
//!         .module(DatabaseModule)
//!         .module(UsersModule::default())
//!         .build()?;
//!
//!     handler.start().await?;
//!     // Serve your app...
//!     handler.stop().await?;
//!     Ok(())
//! }
//! ```

extern crate self as modhandler;

pub mod config;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod messaging;
pub mod module;
pub mod registry;

// Re-export core types
pub use config::{ConfigSource, HandlerConfig, Strictness};
pub use di::{ExternalModuleProvider, Inject, Injectable, Resolver};
pub use error::{ConfigurationError, Result};
pub use lifecycle::{
    HandlerBuilder, HandlerState, LifecycleError, LifecycleErrors, ModulesHandler, Phase,
};
pub use messaging::{EventBus, EventSink, NoopEventSink, Subscription};
pub use module::{Module, ModuleGroup, RegistrationItem, TypeKey};
pub use registry::ModuleRegistry;

// Re-export macros
pub use modhandler_macro::Injectable as DeriveInjectable;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use modhandler::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{HandlerConfig, Strictness};
    pub use crate::di::{ExternalModuleProvider, Inject, Injectable, Resolver};
    pub use crate::error::ConfigurationError;
    pub use crate::lifecycle::{LifecycleError, LifecycleErrors, ModulesHandler, Phase};
    pub use crate::messaging::{EventBus, EventSink, Subscription};
    pub use crate::module::{Module, ModuleGroup, RegistrationItem, TypeKey};
    pub use crate::DeriveInjectable as Injectable;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
