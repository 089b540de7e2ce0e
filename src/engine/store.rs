//! In-memory record store backing one preview instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::types;
use crate::record::{MODULE_TYPE, Record};

/// Title-keyed record set. Later preloads replace earlier ones.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: BTreeMap<String, Arc<Record>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records; untitled ones are dropped.
    pub fn preload<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Arc<Record>>,
    {
        for record in records {
            if let Some(title) = record.title() {
                self.records.insert(title.to_string(), Arc::clone(&record));
            }
        }
    }

    pub fn get(&self, title: &str) -> Option<&Arc<Record>> {
        self.records.get(title)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.records.values()
    }

    /// JavaScript records flagged `module-type: startup`, in title order.
    pub fn startup_scripts(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.records.values().filter(|record| {
            record.get(MODULE_TYPE) == Some("startup") && record.kind() == Some(types::JAVASCRIPT)
        })
    }
}
