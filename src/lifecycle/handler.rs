//! Modules Handler
//!
//! Owns the registry and drives every module through its lifecycle.

use super::hook::HookRunner;
use super::{HandlerBuilder, HandlerState, LifecycleError, LifecycleErrors, Phase};
use crate::config::HandlerConfig;
use crate::di::{ExternalModuleProvider, Resolver};
use crate::error::ConfigurationError;
use crate::messaging::EventSink;
use crate::module::{Module, RegistrationItem, TypeKey};
use crate::registry::ModuleRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A module that completed a phase, kept in the order it completed.
#[derive(Clone)]
struct Tracked {
    key: TypeKey,
    module: Arc<dyn Module>,
}

/// Registry, dependency injector and lifecycle orchestrator.
///
/// `start` runs three strictly sequential passes over all modules:
///
/// 1. **Initialize**, ascending by [`Module::order`] (ties keep registration
///    order): the event sink registers the module's subscriptions, then
///    `initialize` runs.
/// 2. **Inject**: every module's [`Module::set_dependencies`] is called with a
///    [`Resolver`] backed by the registry and the external provider.
/// 3. **Load**, same order, over the modules whose `initialize` succeeded.
///
/// `stop` unloads exactly the modules that loaded, in reverse load order, then
/// unregisters the subscriptions of exactly the modules that initialized, in
/// reverse initialize order. A failing hook never aborts a pass; its error is
/// collected and the module is left out of that phase's bookkeeping.
///
/// # Example
///
/// ```rust,ignore
/// use modhandler::{EventBus, ModulesHandler};
/// use std::sync::Arc;
///
/// let bus = EventBus::new();
/// let mut handler = ModulesHandler::builder()
///     .module(DatabaseModule::default())
///     .group(api_group)
///     .event_sink(Arc::new(bus.clone()))
///     .build()?;
///
/// if let Err(errors) = handler.start().await {
///     for error in &errors {
///         tracing::error!("{}", error);
///     }
/// }
/// // ... application runs ...
/// handler.stop().await?;
/// ```
pub struct ModulesHandler {
    registry: Arc<ModuleRegistry>,
    event_sink: Arc<dyn EventSink>,
    external: Option<Arc<dyn ExternalModuleProvider>>,
    config: HandlerConfig,
    hooks: HookRunner,
    registration_warnings: Vec<ConfigurationError>,
    initialized: Vec<Tracked>,
    loaded: Vec<Tracked>,
    state: HandlerState,
}

impl ModulesHandler {
    /// Create a new handler builder
    pub fn builder() -> HandlerBuilder {
        HandlerBuilder::new()
    }

    /// Flatten `items` into a registry and prepare the handler.
    ///
    /// Fails on the first duplicate type under [`Strictness::Strict`](crate::Strictness::Strict);
    /// under `Lenient` duplicates are skipped and reported by
    /// [`registration_warnings`](Self::registration_warnings).
    pub fn new(
        items: impl IntoIterator<Item = RegistrationItem>,
        event_sink: Arc<dyn EventSink>,
        external: Option<Arc<dyn ExternalModuleProvider>>,
        config: HandlerConfig,
    ) -> crate::error::Result<Self> {
        Self::with_cancellation(items, event_sink, external, config, CancellationToken::new())
    }

    /// Like [`new`](Self::new), with a token that cancels in-flight `initialize` / `load` hooks.
    pub fn with_cancellation(
        items: impl IntoIterator<Item = RegistrationItem>,
        event_sink: Arc<dyn EventSink>,
        external: Option<Arc<dyn ExternalModuleProvider>>,
        config: HandlerConfig,
        cancellation: CancellationToken,
    ) -> crate::error::Result<Self> {
        let (registry, registration_warnings) =
            ModuleRegistry::from_items(items, config.strictness)?;

        tracing::info!(
            "Module handler created ({} modules, {} strictness)",
            registry.len(),
            config.strictness
        );

        Ok(Self {
            registry: Arc::new(registry),
            event_sink,
            external,
            hooks: HookRunner::new(config.hook_timeout, cancellation),
            config,
            registration_warnings,
            initialized: Vec::new(),
            loaded: Vec::new(),
            state: HandlerState::Created,
        })
    }

    /// Run the initialize, inject and load passes.
    ///
    /// # Errors
    ///
    /// Returns every hook failure and configuration error reported during the
    /// three passes. Modules that did succeed stay tracked, so `stop` must
    /// still be called to unwind them.
    pub async fn start(&mut self) -> Result<(), LifecycleErrors> {
        if self.state != HandlerState::Created {
            return Err(LifecycleErrors::single(LifecycleError::invalid_state(
                "start", self.state,
            )));
        }
        self.state = HandlerState::Started;

        let order = self.execution_order();
        let mut errors = Vec::new();

        self.initialize_pass(&order, &mut errors).await;

        if self.inject_pass(&mut errors) {
            self.load_pass(&mut errors).await;
        } else {
            tracing::warn!("Skipping load pass after a configuration error in strict mode");
        }

        if errors.is_empty() {
            tracing::info!("Start complete ({} modules loaded)", self.loaded.len());
        } else {
            tracing::warn!(
                "Start finished with {} error(s) ({}/{} modules loaded)",
                errors.len(),
                self.loaded.len(),
                self.registry.len()
            );
        }
        LifecycleErrors::into_result(errors)
    }

    /// Unload loaded modules, then unregister initialized modules, both in reverse.
    ///
    /// Stopping a handler that never started, or stopping twice, does nothing.
    pub async fn stop(&mut self) -> Result<(), LifecycleErrors> {
        if self.state != HandlerState::Started {
            tracing::debug!("Stop ignored: handler is {}", self.state);
            return Ok(());
        }

        let mut errors = Vec::new();

        let loaded = std::mem::take(&mut self.loaded);
        tracing::info!("Unloading {} modules...", loaded.len());
        for entry in loaded.iter().rev() {
            if let Err(e) = self
                .hooks
                .run(entry.key, entry.module.as_ref(), Phase::Unload)
                .await
            {
                errors.push(e);
            }
        }

        let initialized = std::mem::take(&mut self.initialized);
        tracing::info!(
            "Unregistering event handlers for {} modules...",
            initialized.len()
        );
        for entry in initialized.iter().rev() {
            self.event_sink
                .unregister_all(entry.key, entry.module.as_ref());
        }

        self.state = HandlerState::Stopped;
        tracing::info!("Stop complete ({} error(s))", errors.len());
        LifecycleErrors::into_result(errors)
    }

    /// Ascending by order value; the stable sort keeps registration order for ties.
    fn execution_order(&self) -> Vec<Tracked> {
        let mut order: Vec<Tracked> = self
            .registry
            .iter()
            .map(|(key, module)| Tracked {
                key,
                module: Arc::clone(module),
            })
            .collect();
        order.sort_by_key(|entry| entry.module.order());
        order
    }

    async fn initialize_pass(&mut self, order: &[Tracked], errors: &mut Vec<LifecycleError>) {
        tracing::info!("Initializing {} modules...", order.len());

        for entry in order {
            self.event_sink
                .register_all(entry.key, entry.module.as_ref());

            match self
                .hooks
                .run(entry.key, entry.module.as_ref(), Phase::Initialize)
                .await
            {
                Ok(()) => self.initialized.push(entry.clone()),
                // Left off the initialized list: stop never unregisters it.
                Err(e) => errors.push(e),
            }
        }

        tracing::info!(
            "Initialize complete ({}/{} modules)",
            self.initialized.len(),
            order.len()
        );
    }

    /// Returns `false` when strict mode demands the start be cut short.
    fn inject_pass(&self, errors: &mut Vec<LifecycleError>) -> bool {
        tracing::info!("Injecting dependencies...");
        let external = self.external.as_deref();

        for (key, module) in self.registry.iter() {
            let mut resolver = Resolver::new(key, &self.registry, external);
            module.set_dependencies(&mut resolver);

            let failures = resolver.into_errors();
            if failures.is_empty() {
                continue;
            }

            for failure in &failures {
                tracing::warn!("{}", failure);
            }
            errors.extend(failures.into_iter().map(LifecycleError::from));

            if self.config.strictness.is_strict() {
                tracing::error!("Dependency injection failed for {}", key);
                return false;
            }
        }

        true
    }

    async fn load_pass(&mut self, errors: &mut Vec<LifecycleError>) {
        let candidates = self.initialized.clone();
        tracing::info!("Loading {} modules...", candidates.len());

        for entry in &candidates {
            match self
                .hooks
                .run(entry.key, entry.module.as_ref(), Phase::Load)
                .await
            {
                Ok(()) => self.loaded.push(entry.clone()),
                Err(e) => errors.push(e),
            }
        }

        tracing::info!(
            "Load complete ({}/{} modules)",
            self.loaded.len(),
            candidates.len()
        );
    }

    /// Look a module up by its concrete type.
    pub fn get<T: Module>(&self) -> Option<Arc<T>> {
        self.registry.get::<T>()
    }

    pub fn get_by_key(&self, key: TypeKey) -> Option<Arc<dyn Module>> {
        self.registry.get_by_key(key)
    }

    /// Shared handle to the registry, usable as another handler's external provider.
    pub fn registry(&self) -> Arc<ModuleRegistry> {
        Arc::clone(&self.registry)
    }

    /// Duplicates skipped at construction under lenient strictness.
    pub fn registration_warnings(&self) -> &[ConfigurationError] {
        &self.registration_warnings
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    /// Modules that completed `initialize`, in the order they did.
    pub fn initialized_modules(&self) -> Vec<TypeKey> {
        self.initialized.iter().map(|entry| entry.key).collect()
    }

    /// Modules that completed `load`, in the order they did.
    pub fn loaded_modules(&self) -> Vec<TypeKey> {
        self.loaded.iter().map(|entry| entry.key).collect()
    }
}

impl std::fmt::Debug for ModulesHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModulesHandler")
            .field("registry", &self.registry)
            .field("state", &self.state)
            .field("initialized", &self.initialized_modules())
            .field("loaded", &self.loaded_modules())
            .field("config", &self.config)
            .finish()
    }
}
