//! Core engine: event bus, host seams, transactions, the editor itself.

pub mod editor;
pub mod event_bus;
pub mod host;
pub mod transaction;

pub use editor::{EventOutcome, TemplateEditor};
pub use event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use host::{
    CloneInstantiator, Instantiator, MemorySelection, NullPersistence, PersistenceService,
    SelectionHost,
};
pub use transaction::{CorrespondenceMap, Transaction};
