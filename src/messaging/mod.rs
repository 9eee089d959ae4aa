use crate::module::{Module, TypeKey};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type HandlerFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) + Send + Sync>;

/// Receives a module's event subscriptions around its lifecycle.
///
/// The handler calls `register_all` right before a module's `initialize`, and
/// `unregister_all` during stop for each module whose `initialize` succeeded.
/// Both must accept modules that declare no subscriptions.
pub trait EventSink: Send + Sync {
    fn register_all(&self, owner: TypeKey, module: &dyn Module);
    fn unregister_all(&self, owner: TypeKey, module: &dyn Module);
}

/// Sink for hosts without an event system.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn register_all(&self, _owner: TypeKey, _module: &dyn Module) {}
    fn unregister_all(&self, _owner: TypeKey, _module: &dyn Module) {}
}

/// One event handler declared by a module.
#[derive(Clone)]
pub struct Subscription {
    event: TypeKey,
    handler: HandlerFn,
}

impl Subscription {
    /// Handle every published `E`.
    pub fn on<E, F>(handler: F) -> Self
    where
        E: Send + Sync + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            event: TypeKey::of::<E>(),
            handler: Arc::new(move |event: &(dyn Any + Send + Sync)| {
                if let Some(event) = event.downcast_ref::<E>() {
                    handler(event);
                }
            }),
        }
    }

    pub fn event(&self) -> TypeKey {
        self.event
    }
}

/// A simple in-memory event bus
///
/// Handlers are grouped by the module that declared them, so unregistering a
/// module removes exactly its own handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    // Map of Event Type -> (owning module, handler)
    handlers: Arc<DashMap<TypeId, Vec<(TypeKey, HandlerFn)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event, returning how many handlers received it.
    pub fn publish<E: Send + Sync + 'static>(&self, event: E) -> usize {
        // Snapshot first so handlers may publish or subscribe themselves.
        let handlers: Vec<HandlerFn> = match self.handlers.get(&TypeId::of::<E>()) {
            Some(entry) => entry.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return 0,
        };

        let event: &(dyn Any + Send + Sync) = &event;
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn handler_count<E: 'static>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}

impl EventSink for EventBus {
    fn register_all(&self, owner: TypeKey, module: &dyn Module) {
        let subscriptions = module.subscriptions();
        tracing::debug!(
            "Registering {} event handlers for {}",
            subscriptions.len(),
            owner
        );

        for subscription in subscriptions {
            self.handlers
                .entry(subscription.event.id())
                .or_default()
                .push((owner, subscription.handler));
        }
    }

    fn unregister_all(&self, owner: TypeKey, _module: &dyn Module) {
        tracing::debug!("Unregistering event handlers for {}", owner);
        self.handlers.retain(|_, handlers| {
            handlers.retain(|(registered_by, _)| *registered_by != owner);
            !handlers.is_empty()
        });
    }
}
