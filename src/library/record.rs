use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One imported document and its reading position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub full_text: String,
    pub current_page_index: usize,
    /// Cached for display; computed with the page size in effect at import.
    pub total_pages: usize,
    pub imported_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Reading progress for display, rounded to a whole percent.
    pub fn progress_percent(&self) -> u32 {
        progress_percent(self.current_page_index, self.total_pages)
    }
}

pub(crate) fn progress_percent(page: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((page as f64 / total as f64) * 100.0).round() as u32
}

/// All records plus the current-document pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub records: HashMap<String, DocumentRecord>,
    pub current_id: Option<String>,
}

impl Library {
    pub fn current(&self) -> Option<&DocumentRecord> {
        self.current_id.as_ref().and_then(|id| self.records.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by import time, oldest first.
    pub fn sorted_records(&self) -> Vec<&DocumentRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.imported_at.cmp(&b.imported_at).then_with(|| a.id.cmp(&b.id)));
        records
    }
}
