//! Bank persistence backends.
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::BankStore;

/// Volatile store; clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryBankStore {
    slots: Rc<RefCell<HashMap<String, u64>>>,
}

impl MemoryBankStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a banked value in `slot`.
    #[must_use]
    pub fn with_balance(slot: &str, value: u64) -> Self {
        let store = Self::default();
        store.slots.borrow_mut().insert(slot.to_string(), value);
        store
    }

    #[must_use]
    pub fn get(&self, slot: &str) -> Option<u64> {
        self.slots.borrow().get(slot).copied()
    }
}

impl BankStore for MemoryBankStore {
    type Error = Infallible;

    fn load_bank(&self, slot: &str) -> Result<Option<u64>, Self::Error> {
        Ok(self.get(slot))
    }

    fn save_bank(&self, slot: &str, value: u64) -> Result<(), Self::Error> {
        self.slots.borrow_mut().insert(slot.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bank file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bank file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed store holding every slot in one JSON object.
#[derive(Debug, Clone)]
pub struct JsonFileBankStore {
    path: PathBuf,
}

impl JsonFileBankStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_slots(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl BankStore for JsonFileBankStore {
    type Error = StoreError;

    fn load_bank(&self, slot: &str) -> Result<Option<u64>, Self::Error> {
        Ok(self.read_slots()?.get(slot).copied())
    }

    fn save_bank(&self, slot: &str, value: u64) -> Result<(), Self::Error> {
        let mut slots = self.read_slots()?;
        slots.insert(slot.to_string(), value);
        let text = serde_json::to_string_pretty(&slots)?;
        fs::write(&self.path, text).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
