//! Pub/Sub event bus for decoupled editor/host communication.
//!
//! Widgets never mutate the template directly: they push event structs into
//! an actions list, the host forwards them onto the bus, and the main loop
//! drains the queue into `TemplateEditor::handle_event`. Subscribers with
//! immediate callbacks are also supported for hosts that want to observe
//! edits (e.g. repaint on `TemplateCommittedEvent`).
//!
//! Callback order: FIFO within one event type. Cross-type ordering is
//! undefined - don't rely on it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::warn;

use crate::config::EVENT_QUEUE_MAX;

/// Marker trait for events. Blanket-implemented for every qualifying type.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Boxed event for queue storage and widget action lists.
pub type BoxedEvent = Box<dyn Event>;

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;
type Subscribers = Arc<RwLock<HashMap<TypeId, Vec<Callback>>>>;
type Queue = Arc<Mutex<Vec<BoxedEvent>>>;

fn dispatch_and_enqueue(subscribers: &Subscribers, queue: &Queue, type_id: TypeId, event: BoxedEvent) {
    if let Some(cbs) = subscribers.read().unwrap_or_else(|e| e.into_inner()).get(&type_id) {
        for cb in cbs {
            // Explicit deref: go through dyn Event's vtable, not the
            // blanket impl on Box (see downcast_event).
            cb((*event).as_any());
        }
    }

    let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
    if queue.len() >= EVENT_QUEUE_MAX {
        let evict = queue.len() / 2;
        warn!("event queue full ({} events), evicting oldest {}", queue.len(), evict);
        queue.drain(0..evict);
    }
    queue.push(event);
}

/// Event bus with immediate callbacks plus a bounded deferred queue.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Subscribers,
    queue: Queue,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of type `E`; the callback runs synchronously at
    /// emit time, before the event is queued.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Emit an event: invoke callbacks immediately AND queue it for
    /// deferred processing via [`poll`](Self::poll).
    pub fn emit<E: Event>(&self, event: E) {
        dispatch_and_enqueue(&self.subscribers, &self.queue, TypeId::of::<E>(), Box::new(event));
    }

    /// Emit an already-boxed event (widget action lists hand these over).
    pub fn emit_boxed(&self, event: BoxedEvent) {
        let type_id = (*event).type_id();
        dispatch_and_enqueue(&self.subscribers, &self.queue, type_id, event);
    }

    /// Drain all queued events for batch processing in the main loop.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Lightweight emitter handle for passing into widgets.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            subscribers: Arc::clone(&self.subscribers),
            queue: Arc::clone(&self.queue),
        }
    }

    /// Remove every subscriber for event type `E`.
    pub fn unsubscribe_all<E: Event>(&self) {
        self.subscribers.write().unwrap_or_else(|e| e.into_inner()).remove(&TypeId::of::<E>());
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Cloneable emitter handle; emits like the bus it came from.
#[derive(Clone)]
pub struct EventEmitter {
    subscribers: Subscribers,
    queue: Queue,
}

impl EventEmitter {
    pub fn emit<E: Event>(&self, event: E) {
        dispatch_and_enqueue(&self.subscribers, &self.queue, TypeId::of::<E>(), Box::new(event));
    }

    pub fn emit_boxed(&self, event: BoxedEvent) {
        let type_id = (*event).type_id();
        dispatch_and_enqueue(&self.subscribers, &self.queue, type_id, event);
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscriber_types", &self.subscribers.read().map(|s| s.len()).unwrap_or(0))
            .field("queue_len", &self.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

/// Downcast a boxed event to a concrete type.
///
/// Must explicitly deref to `dyn Event` before calling `as_any()`: the
/// blanket `Event` impl also covers `Box<dyn Event>`, and without the deref
/// the Box's own impl answers with the wrong `TypeId`, making every
/// downcast fail.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Clone, Debug)]
    struct Ping {
        value: i32,
    }

    #[derive(Clone, Debug)]
    struct Pong;

    #[test]
    fn test_subscribe_emit_immediate() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        bus.subscribe::<Ping, _>(move |e| {
            c.fetch_add(e.value, Ordering::SeqCst);
        });

        bus.emit(Ping { value: 10 });
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        bus.emit(Ping { value: 5 });
        assert_eq!(counter.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn test_emit_queues_for_poll() {
        let bus = EventBus::new();
        bus.emit(Ping { value: 1 });
        bus.emit(Pong);
        assert_eq!(bus.poll().len(), 2);
        assert_eq!(bus.poll().len(), 0);
    }

    #[test]
    fn test_emitter_handle_reaches_bus() {
        let bus = EventBus::new();
        let emitter = bus.emitter();
        emitter.emit(Ping { value: 42 });
        let events = bus.poll();
        assert_eq!(events.len(), 1);
        assert_eq!(downcast_event::<Ping>(&events[0]).unwrap().value, 42);
    }

    #[test]
    fn test_emit_boxed_preserves_type() {
        let bus = EventBus::new();
        let boxed: BoxedEvent = Box::new(Ping { value: 7 });
        bus.emit_boxed(boxed);
        let events = bus.poll();
        assert!(downcast_event::<Ping>(&events[0]).is_some());
        assert!(downcast_event::<Pong>(&events[0]).is_none());
    }

    #[test]
    fn test_unsubscribe_all() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);
        bus.subscribe::<Ping, _>(move |e| {
            c.fetch_add(e.value, Ordering::SeqCst);
        });
        bus.unsubscribe_all::<Ping>();
        bus.emit(Ping { value: 10 });
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        // Still queued for poll
        assert_eq!(bus.queue_len(), 1);
    }
}
