//! Repository Pattern for the device registry
//!
//! Query logic only sees the [`DeviceRepository`] trait, so the SQLite store
//! used in production can be swapped for the in-memory one in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  QueryService / HTTP API                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DeviceRepository                         │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                           │
//!                  ▼                           ▼
//!        ┌─────────────────┐         ┌─────────────────┐
//!        │     SQLite      │         │    In-memory    │
//!        └─────────────────┘         └─────────────────┘
//! ```
//!
//! Name lookups fold ASCII case on both implementations. Uniqueness of names
//! is not enforced on insert; a lookup that matches several rows fails with
//! [`RegistryError::Ambiguous`].

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::models::{Device, NewDevice};

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by the device registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No device matched the lookup
    #[error("Device not found: {0}")]
    NotFound(String),

    /// More than one device matched a lookup that must be unique
    #[error("{count} devices match {key}")]
    Ambiguous { key: String, count: usize },

    /// Submitted fields were rejected
    #[error("Invalid device: {0}")]
    Validation(String),

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem failure while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage lock was poisoned by a panicking writer
    #[error("Registry lock poisoned")]
    Poisoned,
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

// ============================================================================
// Repository Trait
// ============================================================================

/// Registry of vessel to channel bindings
pub trait DeviceRepository: Send + Sync {
    /// All devices in insertion order
    fn list(&self) -> RegistryResult<Vec<Device>>;

    /// Device by surrogate id
    fn get(&self, id: i64) -> RegistryResult<Device>;

    /// Device by ship name, ignoring case
    fn get_by_name(&self, ship_name: &str) -> RegistryResult<Device>;

    /// Device by ship and owner name, ignoring case
    fn get_by_name_owner(&self, ship_name: &str, owner_name: &str) -> RegistryResult<Device>;

    /// Validate and store a new device
    fn create(&self, device: &NewDevice) -> RegistryResult<Device>;

    /// Remove a device, returning whether a row existed
    fn delete(&self, id: i64) -> RegistryResult<bool>;

    /// Number of registered devices
    fn count(&self) -> RegistryResult<usize> {
        Ok(self.list()?.len())
    }
}

/// Reduce a set of matches to exactly one device
fn single_match(key: String, mut matches: Vec<Device>) -> RegistryResult<Device> {
    match matches.len() {
        0 => Err(RegistryError::NotFound(key)),
        1 => Ok(matches.remove(0)),
        count => Err(RegistryError::Ambiguous { key, count }),
    }
}

fn validated(device: &NewDevice) -> RegistryResult<NewDevice> {
    let device = device.normalized();
    device.validate().map_err(RegistryError::Validation)?;
    Ok(device)
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of DeviceRepository
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteDeviceRepository {
    conn: Mutex<Connection>,
}

impl SqliteDeviceRepository {
    /// Open (or create) a registry database at `path`
    pub fn new(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "Device registry initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> RegistryResult<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn lock(&self) -> RegistryResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RegistryError::Poisoned)
    }

    fn create_schema(&self) -> RegistryResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS devices (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ship_name TEXT NOT NULL,
                    owner_name TEXT NOT NULL,
                    read_key TEXT NOT NULL,
                    channel_id TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_devices_ship_name
                    ON devices(ship_name COLLATE NOCASE);
                "#,
        )?;

        Ok(())
    }

    fn row_to_device(row: &Row<'_>) -> rusqlite::Result<Device> {
        let created_at = DateTime::parse_from_rfc3339(&row.get::<_, String>(5)?)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(Device {
            id: row.get(0)?,
            ship_name: row.get(1)?,
            owner_name: row.get(2)?,
            read_key: row.get(3)?,
            channel_id: row.get(4)?,
            created_at,
        })
    }

    fn query_devices(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RegistryResult<Vec<Device>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let devices = stmt
            .query_map(params, Self::row_to_device)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(devices)
    }
}

const SELECT_DEVICE: &str =
    "SELECT id, ship_name, owner_name, read_key, channel_id, created_at FROM devices";

impl DeviceRepository for SqliteDeviceRepository {
    fn list(&self) -> RegistryResult<Vec<Device>> {
        self.query_devices(&format!("{SELECT_DEVICE} ORDER BY id"), &[])
    }

    fn get(&self, id: i64) -> RegistryResult<Device> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{SELECT_DEVICE} WHERE id = ?1"),
            params![id],
            Self::row_to_device,
        )
        .optional()?
        .ok_or_else(|| RegistryError::NotFound(format!("id {id}")))
    }

    fn get_by_name(&self, ship_name: &str) -> RegistryResult<Device> {
        let matches = self.query_devices(
            &format!("{SELECT_DEVICE} WHERE ship_name = ?1 COLLATE NOCASE ORDER BY id"),
            &[&ship_name],
        )?;
        single_match(format!("ship '{ship_name}'"), matches)
    }

    fn get_by_name_owner(&self, ship_name: &str, owner_name: &str) -> RegistryResult<Device> {
        let matches = self.query_devices(
            &format!(
                "{SELECT_DEVICE} WHERE ship_name = ?1 COLLATE NOCASE \
                 AND owner_name = ?2 COLLATE NOCASE ORDER BY id"
            ),
            &[&ship_name, &owner_name],
        )?;
        single_match(format!("ship '{ship_name}' owned by '{owner_name}'"), matches)
    }

    fn create(&self, device: &NewDevice) -> RegistryResult<Device> {
        let device = validated(device)?;
        let created_at = Utc::now();

        let id = {
            let conn = self.lock()?;
            conn.execute(
                r#"
                    INSERT INTO devices (ship_name, owner_name, read_key, channel_id, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                params![
                    device.ship_name,
                    device.owner_name,
                    device.read_key,
                    device.channel_id,
                    created_at.to_rfc3339()
                ],
            )?;
            conn.last_insert_rowid()
        };

        tracing::info!(id, ship_name = %device.ship_name, "Device registered");

        Ok(Device {
            id,
            ship_name: device.ship_name,
            owner_name: device.owner_name,
            read_key: device.read_key,
            channel_id: device.channel_id,
            created_at,
        })
    }

    fn delete(&self, id: i64) -> RegistryResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM devices WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn count(&self) -> RegistryResult<usize> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;
        Ok(total as usize)
    }
}

// ============================================================================
// In-memory Implementation (for testing)
// ============================================================================

/// In-memory implementation of DeviceRepository
///
/// Useful for testing without database dependencies.
pub struct MemoryDeviceRepository {
    devices: RwLock<Vec<Device>>,
    next_id: RwLock<i64>,
}

impl MemoryDeviceRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(Vec::new()),
            next_id: RwLock::new(1),
        }
    }

    /// Create a repository pre-filled with `devices`
    pub fn with_devices(devices: &[NewDevice]) -> RegistryResult<Self> {
        let repo = Self::new();
        for device in devices {
            repo.create(device)?;
        }
        Ok(repo)
    }

    fn matching(&self, predicate: impl Fn(&Device) -> bool) -> RegistryResult<Vec<Device>> {
        let devices = self.devices.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(devices.iter().filter(|d| predicate(d)).cloned().collect())
    }
}

impl Default for MemoryDeviceRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRepository for MemoryDeviceRepository {
    fn list(&self) -> RegistryResult<Vec<Device>> {
        self.matching(|_| true)
    }

    fn get(&self, id: i64) -> RegistryResult<Device> {
        self.matching(|d| d.id == id)?
            .pop()
            .ok_or_else(|| RegistryError::NotFound(format!("id {id}")))
    }

    fn get_by_name(&self, ship_name: &str) -> RegistryResult<Device> {
        let matches = self.matching(|d| d.ship_name.eq_ignore_ascii_case(ship_name))?;
        single_match(format!("ship '{ship_name}'"), matches)
    }

    fn get_by_name_owner(&self, ship_name: &str, owner_name: &str) -> RegistryResult<Device> {
        let matches = self.matching(|d| {
            d.ship_name.eq_ignore_ascii_case(ship_name)
                && d.owner_name.eq_ignore_ascii_case(owner_name)
        })?;
        single_match(format!("ship '{ship_name}' owned by '{owner_name}'"), matches)
    }

    fn create(&self, device: &NewDevice) -> RegistryResult<Device> {
        let device = validated(device)?;

        let id = {
            let mut next_id = self.next_id.write().map_err(|_| RegistryError::Poisoned)?;
            let id = *next_id;
            *next_id += 1;
            id
        };

        let stored = Device {
            id,
            ship_name: device.ship_name,
            owner_name: device.owner_name,
            read_key: device.read_key,
            channel_id: device.channel_id,
            created_at: Utc::now(),
        };

        self.devices
            .write()
            .map_err(|_| RegistryError::Poisoned)?
            .push(stored.clone());

        Ok(stored)
    }

    fn delete(&self, id: i64) -> RegistryResult<bool> {
        let mut devices = self.devices.write().map_err(|_| RegistryError::Poisoned)?;
        let before = devices.len();
        devices.retain(|d| d.id != id);
        Ok(devices.len() != before)
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository wrapper
pub type SharedDeviceRepository = Arc<dyn DeviceRepository>;

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> RegistryResult<SharedDeviceRepository> {
    let repo = SqliteDeviceRepository::new(path)?;
    Ok(Arc::new(repo))
}

/// Create a shared in-memory repository
pub fn create_memory_repository() -> SharedDeviceRepository {
    Arc::new(MemoryDeviceRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
