//! Signal persistence.

pub mod memory;
pub mod questdb;
pub mod store;

pub use memory::InMemorySignalStore;
pub use questdb::QuestDatabase;
pub use store::SignalStore;
