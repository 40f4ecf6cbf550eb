//! Persistent storage for the device registry
//!
//! Devices live in a single SQLite table; an in-memory implementation of the
//! same trait backs the tests.

pub mod repository;

pub use repository::{
    create_memory_repository, create_sqlite_repository, DeviceRepository, MemoryDeviceRepository,
    RegistryError, RegistryResult, SharedDeviceRepository, SqliteDeviceRepository,
};
