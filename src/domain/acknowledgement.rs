use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    pub name: String,
    #[serde(default)]
    pub dept: String,
}

impl LogEntry {
    pub fn new(name: impl Into<String>, dept: impl Into<String>) -> Self {
        Self { name: name.into(), dept: dept.into() }
    }
}

/// Audit view of one announcement: who confirmed reading it and who has not.
///
/// The two lists partition the eligible recipients. Management only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcknowledgementLog {
    #[serde(default)]
    pub acknowledged: Vec<LogEntry>,
    #[serde(default)]
    pub pending: Vec<LogEntry>,
}

impl AcknowledgementLog {
    /// Builds the partition from the recipient list and the set of names
    /// that have acknowledged.
    pub fn from_recipients<'a, I>(recipients: I, acknowledged_names: &BTreeSet<String>) -> Self
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let mut log = Self::default();
        for entry in recipients {
            if acknowledged_names.contains(&entry.name) {
                log.acknowledged.push(entry.clone());
            } else {
                log.pending.push(entry.clone());
            }
        }
        log.normalized()
    }

    pub fn total_recipients(&self) -> usize {
        self.acknowledged.len() + self.pending.len()
    }

    /// No recipient appears twice across both lists. Recipients are told
    /// apart by name and department together.
    pub fn is_partition(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.acknowledged
            .iter()
            .chain(self.pending.iter())
            .all(|entry| seen.insert(entry))
    }

    /// Collapses repeated entries and removes from `pending` anyone who
    /// already acknowledged. Acknowledgement is one-way, so the confirmed
    /// side wins.
    pub fn normalized(self) -> Self {
        let mut seen: BTreeSet<LogEntry> = BTreeSet::new();
        let acknowledged: Vec<LogEntry> = self
            .acknowledged
            .into_iter()
            .filter(|e| seen.insert(e.clone()))
            .collect();
        let pending: Vec<LogEntry> = self
            .pending
            .into_iter()
            .filter(|e| seen.insert(e.clone()))
            .collect();

        Self { acknowledged, pending }
    }
}
