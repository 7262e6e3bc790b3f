//! Persistence of extraction results, keyed by account and invoice.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::models::record::ExtractionOutput;

pub type Result<T> = std::result::Result<T, StoreError>;

/// A persisted extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: u64,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<String>,
    pub saved_at: DateTime<Utc>,
    pub output: ExtractionOutput,
}

/// What a save attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new record was created.
    Created { id: u64 },
    /// A record with the same account/invoice pair already exists; nothing
    /// was written.
    AlreadyExists { id: u64 },
}

/// Store for extraction results.
///
/// Records are keyed by `(account, invoice)`: saving an output whose invoice
/// matches an existing record for the same account is a no-op. Outputs with
/// no invoice always create a new record.
pub trait RecordStore {
    fn save(&mut self, output: &ExtractionOutput) -> Result<SaveOutcome>;

    /// All records for one account, in insertion order.
    fn records_for_account(&self, account: &str) -> Vec<&StoredRecord>;
}

/// In-memory store, also the backing state of [`JsonFileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, Vec<StoredRecord>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_records(records: Vec<StoredRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut map: HashMap<String, Vec<StoredRecord>> = HashMap::new();
        for record in records {
            map.entry(record.account.clone()).or_default().push(record);
        }
        Self {
            records: map,
            next_id,
        }
    }

    fn all_records(&self) -> Vec<&StoredRecord> {
        let mut all: Vec<&StoredRecord> = self.records.values().flatten().collect();
        all.sort_by_key(|r| r.id);
        all
    }
}

impl RecordStore for MemoryStore {
    fn save(&mut self, output: &ExtractionOutput) -> Result<SaveOutcome> {
        let account = output.summary.account.clone().unwrap_or_default();
        let invoice = output.summary.invoice.clone();

        if let Some(invoice) = &invoice {
            let existing = self
                .records
                .get(&account)
                .and_then(|records| records.iter().find(|r| r.invoice.as_ref() == Some(invoice)));
            if let Some(existing) = existing {
                debug!(account, invoice, id = existing.id, "record already stored");
                return Ok(SaveOutcome::AlreadyExists { id: existing.id });
            }
        }

        self.next_id += 1;
        let id = self.next_id;
        self.records.entry(account.clone()).or_default().push(StoredRecord {
            id,
            account,
            invoice,
            saved_at: Utc::now(),
            output: output.clone(),
        });
        Ok(SaveOutcome::Created { id })
    }

    fn records_for_account(&self, account: &str) -> Vec<&StoredRecord> {
        self.records
            .get(account)
            .map(|records| records.iter().collect())
            .unwrap_or_default()
    }
}

/// File-backed store: a JSON array of records, rewritten on every save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open a store at `path`, loading any existing records. A missing file
    /// starts an empty store; a corrupt one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let inner = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let records: Vec<StoredRecord> = serde_json::from_str(&content)?;
            MemoryStore::from_records(records)
        } else {
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    fn flush(&self) -> Result<()> {
        let all = self.inner.all_records();
        let content = serde_json::to_string_pretty(&all)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn save(&mut self, output: &ExtractionOutput) -> Result<SaveOutcome> {
        let outcome = self.inner.save(output)?;
        if matches!(outcome, SaveOutcome::Created { .. }) {
            self.flush()?;
        }
        Ok(outcome)
    }

    fn records_for_account(&self, account: &str) -> Vec<&StoredRecord> {
        self.inner.records_for_account(account)
    }
}
