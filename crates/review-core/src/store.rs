//! Persisted rotation order.
//!
//! Layout:
//!   .review/rotation.yaml   `{version, order, updated_at}`
//!
//! The whole order is overwritten at the end of every assignment run. There
//! is no locking; runs are expected to be serialized by the scheduler.

use crate::error::{Result, ReviewError};
use crate::io;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub trait RotationStore {
    /// Fails with `PersistedStateUnreadable` when missing or corrupt.
    fn load(&self) -> Result<Vec<String>>;

    fn save(&self, order: &[String]) -> Result<()>;

    /// Forget the stored order. Returns true if anything was removed.
    fn clear(&self) -> Result<bool>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationState {
    #[serde(default = "default_version")]
    pub version: u32,
    pub order: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// YAML file
// ---------------------------------------------------------------------------

pub struct FileRotationStore {
    path: PathBuf,
}

impl FileRotationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_root(root: &Path) -> Self {
        Self::new(paths::rotation_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full state including the write timestamp, for display.
    pub fn load_state(&self) -> Result<RotationState> {
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            ReviewError::PersistedStateUnreadable(format!("{}: {e}", self.path.display()))
        })?;
        serde_yaml::from_str(&data).map_err(|e| {
            ReviewError::PersistedStateUnreadable(format!("{}: {e}", self.path.display()))
        })
    }
}

impl RotationStore for FileRotationStore {
    fn load(&self) -> Result<Vec<String>> {
        Ok(self.load_state()?.order)
    }

    fn save(&self, order: &[String]) -> Result<()> {
        let state = RotationState {
            version: default_version(),
            order: order.to_vec(),
            updated_at: Utc::now(),
        };
        let data = serde_yaml::to_string(&state)?;
        io::atomic_write(&self.path, data.as_bytes())
    }

    fn clear(&self) -> Result<bool> {
        io::remove_if_exists(&self.path)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Store that lives for one process; `None` behaves like a missing file.
#[derive(Debug, Default)]
pub struct MemoryRotationStore {
    order: RefCell<Option<Vec<String>>>,
}

impl MemoryRotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: RefCell::new(Some(order.into_iter().map(Into::into).collect())),
        }
    }

    pub fn snapshot(&self) -> Option<Vec<String>> {
        self.order.borrow().clone()
    }
}

impl RotationStore for MemoryRotationStore {
    fn load(&self) -> Result<Vec<String>> {
        self.order
            .borrow()
            .clone()
            .ok_or_else(|| ReviewError::PersistedStateUnreadable("no saved order".to_string()))
    }

    fn save(&self, order: &[String]) -> Result<()> {
        *self.order.borrow_mut() = Some(order.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        Ok(self.order.borrow_mut().take().is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
