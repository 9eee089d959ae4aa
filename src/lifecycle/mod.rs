//! Lifecycle Module
//!
//! Drives registered modules through start and stop.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Registration (flatten items and groups)
//!    ↓
//! 2. register_all(module) + initialize   ← ascending order, per module
//!    ↓
//! 3. set_dependencies (each module)
//!    ↓
//! 4. load                                ← ascending order, initialized only
//!    ↓
//! [Running...]
//!    ↓
//! 5. unload                              ← reverse load order, loaded only
//!    ↓
//! 6. unregister_all(module)              ← reverse initialize order
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use modhandler::{async_trait, Module, ModulesHandler};
//!
//! pub struct DatabaseModule;
//!
//! #[async_trait]
//! impl Module for DatabaseModule {
//!     async fn initialize(&self) -> anyhow::Result<()> {
//!         tracing::info!("Opening database connection");
//!         Ok(())
//!     }
//!
//!     async fn unload(&self) -> anyhow::Result<()> {
//!         tracing::info!("Closing database connections");
//!         Ok(())
//!     }
//! }
//!
//! let mut handler = ModulesHandler::builder().module(DatabaseModule).build()?;
//! handler.start().await?;
//! handler.stop().await?;
//! ```

mod builder;
mod error;
mod handler;
mod hook;
mod phase;

pub use builder::HandlerBuilder;
pub use error::{LifecycleError, LifecycleErrors, Result};
pub use handler::ModulesHandler;
pub use phase::{HandlerState, Phase};
