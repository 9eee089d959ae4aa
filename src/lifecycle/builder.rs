//! Handler Builder
//!
//! Fluent construction of a [`ModulesHandler`].

use super::ModulesHandler;
use crate::config::{HandlerConfig, Strictness};
use crate::di::ExternalModuleProvider;
use crate::messaging::{EventSink, NoopEventSink};
use crate::module::{Module, ModuleGroup, RegistrationItem};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Builder for [`ModulesHandler`]
///
/// Items are registered in the order they are added.
///
/// # Example
///
/// ```rust,ignore
/// use modhandler::{HandlerConfig, ModulesHandler};
///
/// let handler = ModulesHandler::builder()
///     .config(HandlerConfig::from_env()?)
///     .module(DatabaseModule::default())
///     .group(ModuleGroup::new("api").with(UsersModule::default()))
///     .hook_timeout(Duration::from_secs(30))
///     .build()?;
/// ```
#[derive(Default)]
pub struct HandlerBuilder {
    items: Vec<RegistrationItem>,
    event_sink: Option<Arc<dyn EventSink>>,
    external: Option<Arc<dyn ExternalModuleProvider>>,
    config: HandlerConfig,
    cancellation: Option<CancellationToken>,
}

impl HandlerBuilder {
    /// Create a new handler builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module the handler will own
    pub fn module<M: Module>(mut self, module: M) -> Self {
        self.items.push(RegistrationItem::module(module));
        self
    }

    /// Register a module the caller keeps a handle to
    pub fn shared<M: Module>(mut self, module: Arc<M>) -> Self {
        self.items.push(RegistrationItem::shared(module));
        self
    }

    /// Register every module of a group, depth-first
    pub fn group(mut self, group: ModuleGroup) -> Self {
        self.items.push(RegistrationItem::group(group));
        self
    }

    pub fn item(mut self, item: RegistrationItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = RegistrationItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Where module subscriptions go. Defaults to [`NoopEventSink`].
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Fallback for dependencies the handler's own registry cannot satisfy
    pub fn external_provider(mut self, provider: Arc<dyn ExternalModuleProvider>) -> Self {
        self.external = Some(provider);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: HandlerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.config.strictness = strictness;
        self
    }

    /// Set a timeout for every initialize / load / unload call
    pub fn hook_timeout(mut self, timeout: Duration) -> Self {
        self.config.hook_timeout = Some(timeout);
        self
    }

    /// Token that aborts a running start
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Build the handler, flattening all registered items
    pub fn build(self) -> crate::error::Result<ModulesHandler> {
        let event_sink = self
            .event_sink
            .unwrap_or_else(|| Arc::new(NoopEventSink));

        ModulesHandler::with_cancellation(
            self.items,
            event_sink,
            self.external,
            self.config,
            self.cancellation.unwrap_or_default(),
        )
    }
}
