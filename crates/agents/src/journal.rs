// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Append-only record of price and moderation decisions
//!
//! Every decision is written twice: as a CSV row for spreadsheets and as one
//! JSON object per line for tooling. The JSON-lines files are the ones read
//! back by [`FileJournal::read_negotiations`] and
//! [`FileJournal::read_moderations`].

use std::{
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use shared_types::{ModerationResult, PriceSuggestion, Product};
use tracing::{debug, info};

use crate::error::{AgentError, AgentResult};

const NEGOTIATION_CSV: &str = "negotiation_log.csv";
const MODERATION_CSV: &str = "moderation_log.csv";
const NEGOTIATION_JSONL: &str = "negotiation_log.jsonl";
const MODERATION_JSONL: &str = "moderation_log.jsonl";

const NEGOTIATION_HEADERS: [&str; 4] = ["timestamp", "product_id", "input", "output"];
const MODERATION_HEADERS: [&str; 3] = ["timestamp", "message", "output"];

/// One price suggestion as it was served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationEntry {
    /// When the suggestion was produced
    pub timestamp: DateTime<Utc>,
    /// Catalog id, absent for ad-hoc products
    pub product_id: Option<u64>,
    /// Product that was priced
    pub input: Product,
    /// Suggestion returned to the caller
    pub output: PriceSuggestion,
}

impl NegotiationEntry {
    /// Create an entry stamped with the current time
    pub fn new(product_id: Option<u64>, input: Product, output: PriceSuggestion) -> Self {
        Self {
            timestamp: Utc::now(),
            product_id,
            input,
            output,
        }
    }
}

/// One moderation verdict as it was served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationEntry {
    /// When the verdict was produced
    pub timestamp: DateTime<Utc>,
    /// Moderated message
    pub message: String,
    /// Verdict returned to the caller
    pub output: ModerationResult,
}

impl ModerationEntry {
    /// Create an entry stamped with the current time
    pub fn new(message: impl Into<String>, output: ModerationResult) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            output,
        }
    }
}

/// Sink for decision records
///
/// Implementations must tolerate concurrent callers; each record is appended
/// atomically with respect to other records.
#[cfg_attr(test, mockall::automock)]
pub trait DecisionJournal: Send + Sync {
    /// Append a price suggestion record
    fn record_negotiation(&self, entry: &NegotiationEntry) -> AgentResult<()>;

    /// Append a moderation record
    fn record_moderation(&self, entry: &ModerationEntry) -> AgentResult<()>;
}

/// Journal backed by CSV and JSON-lines files in one directory
///
/// Each record is one short CSV row plus one JSON line, appended on the
/// calling thread while holding the write lock.
#[derive(Debug)]
pub struct FileJournal {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileJournal {
    /// Open a journal directory, creating it and the CSV headers when missing
    pub fn open<P: AsRef<Path>>(dir: P) -> AgentResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            AgentError::journal(format!("Failed to create {}: {e}", dir.display()))
        })?;

        init_csv(&dir.join(NEGOTIATION_CSV), &NEGOTIATION_HEADERS)?;
        init_csv(&dir.join(MODERATION_CSV), &MODERATION_HEADERS)?;

        info!("Decision journal opened at {}", dir.display());

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// All price suggestion records, oldest first
    pub fn read_negotiations(&self) -> AgentResult<Vec<NegotiationEntry>> {
        read_json_lines(&self.dir.join(NEGOTIATION_JSONL))
    }

    /// All moderation records, oldest first
    pub fn read_moderations(&self) -> AgentResult<Vec<ModerationEntry>> {
        read_json_lines(&self.dir.join(MODERATION_JSONL))
    }
}

impl DecisionJournal for FileJournal {
    fn record_negotiation(&self, entry: &NegotiationEntry) -> AgentResult<()> {
        let row = [
            entry.timestamp.to_rfc3339(),
            entry
                .product_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            serde_json::to_string(&entry.input)?,
            serde_json::to_string(&entry.output)?,
        ];

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AgentError::journal("journal lock poisoned"))?;
        append_csv(&self.dir.join(NEGOTIATION_CSV), &row)?;
        append_json_line(&self.dir.join(NEGOTIATION_JSONL), entry)?;

        debug!(product_id = ?entry.product_id, "Negotiation recorded");
        Ok(())
    }

    fn record_moderation(&self, entry: &ModerationEntry) -> AgentResult<()> {
        let row = [
            entry.timestamp.to_rfc3339(),
            entry.message.clone(),
            serde_json::to_string(&entry.output)?,
        ];

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AgentError::journal("journal lock poisoned"))?;
        append_csv(&self.dir.join(MODERATION_CSV), &row)?;
        append_json_line(&self.dir.join(MODERATION_JSONL), entry)?;

        debug!(status = entry.output.status.as_str(), "Moderation recorded");
        Ok(())
    }
}

fn init_csv(path: &Path, headers: &[&str]) -> AgentResult<()> {
    if path.exists() {
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(headers)?;
    writer.flush()?;
    Ok(())
}

fn append_csv(path: &Path, row: &[String]) -> AgentResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(row)?;
    writer.flush()?;
    Ok(())
}

fn append_json_line<T: Serialize>(path: &Path, entry: &T) -> AgentResult<()> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

fn read_json_lines<T: DeserializeOwned>(path: &Path) -> AgentResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}
