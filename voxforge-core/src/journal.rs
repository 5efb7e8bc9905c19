//! # Forge Journal
//!
//! A fixed-capacity ring of recent forge events. When full, pushing a new
//! entry overwrites the oldest one. The journal belongs to whoever displays
//! it (the HTTP server state); the forge itself never touches it.

use crate::forge::ForgeMode;
use crate::provider::Usage;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// Prompts are clipped to this many characters in the journal
pub const PROMPT_PREVIEW_CHARS: usize = 80;

/// What happened to one forge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Forged {
        /// Voxels in the reply, when it had the shape of a model
        voxels: Option<usize>,
        usage: Usage,
    },
    Failed {
        kind: String,
        message: String,
    },
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub mode: ForgeMode,
    pub prompt: String,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl JournalEntry {
    pub fn new(mode: ForgeMode, prompt: &str, elapsed: Duration, outcome: Outcome) -> Self {
        Self {
            at: Utc::now(),
            mode,
            prompt: preview(prompt),
            elapsed_ms: elapsed.as_millis().min(u64::MAX as u128) as u64,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Forged { .. })
    }
}

fn preview(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let clipped: String = chars.by_ref().take(PROMPT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", clipped)
    } else {
        clipped
    }
}

/// Bounded, overwrite-oldest event log
#[derive(Debug)]
pub struct Journal {
    capacity: usize,
    entries: Mutex<VecDeque<JournalEntry>>,
}

impl Journal {
    /// Create a journal holding at most `capacity` entries (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Append an entry, dropping the oldest when full
    pub fn push(&self, entry: JournalEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Copy of all entries, oldest first
    pub fn snapshot(&self) -> Vec<JournalEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
