pub mod agi_client;
pub mod in_memory;
pub mod protocol;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
