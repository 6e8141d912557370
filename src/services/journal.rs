//! Append-only JSON-lines journal of decisions and orders.
//!
//! One record per line, with a `logged_at` RFC 3339 timestamp added next to
//! the record's own fields.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{Evaluation, OrderIntent, Signal};

const DECISIONS_FILE: &str = "decisions.jsonl";
const ORDERS_FILE: &str = "orders.jsonl";

/// A journaled record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry<T> {
    pub logged_at: String,
    #[serde(flatten)]
    pub record: T,
}

/// File-backed decision and order journal.
pub struct DecisionJournal {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DecisionJournal {
    /// Open a journal in `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Journal directory: {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn append_decision(&self, decision: &Signal) -> Result<()> {
        self.append(DECISIONS_FILE, decision)
    }

    pub fn append_order(&self, order: &OrderIntent) -> Result<()> {
        self.append(ORDERS_FILE, order)
    }

    /// Journal an evaluation's decision and, if any, its order.
    pub fn record(&self, evaluation: &Evaluation) -> Result<()> {
        self.append_decision(&evaluation.decision)?;
        if let Some(order) = &evaluation.order {
            self.append_order(order)?;
        }
        Ok(())
    }

    /// The last `limit` journaled decisions, oldest first.
    pub fn read_decisions(&self, limit: usize) -> Result<Vec<JournalEntry<Signal>>> {
        self.read_last(DECISIONS_FILE, limit)
    }

    /// The last `limit` journaled orders, oldest first.
    pub fn read_orders(&self, limit: usize) -> Result<Vec<JournalEntry<OrderIntent>>> {
        self.read_last(ORDERS_FILE, limit)
    }

    fn append<T: Serialize>(&self, file: &str, record: &T) -> Result<()> {
        let entry = JournalEntry {
            logged_at: Utc::now().to_rfc3339(),
            record,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))?;
        handle.write_all(line.as_bytes())?;
        Ok(())
    }

    fn read_last<T: DeserializeOwned>(
        &self,
        file: &str,
        limit: usize,
    ) -> Result<Vec<JournalEntry<T>>> {
        let path = self.dir.join(file);
        if !path.exists() || limit == 0 {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(limit);

        let mut entries = Vec::with_capacity(lines.len() - start);
        for line in &lines[start..] {
            match serde_json::from_str(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping malformed journal line in {}: {}", file, e),
            }
        }
        Ok(entries)
    }
}
