pub mod entity_store;
pub mod memory_store;

pub use entity_store::{EntityStore, TransactionId};
pub use memory_store::{InMemoryEntityStore, StoreSnapshot};

#[cfg(test)]
pub use entity_store::MockEntityStore;
