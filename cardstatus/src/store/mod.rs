pub mod base;
pub mod memory;
pub mod postgres;

pub use base::CardStatusStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
