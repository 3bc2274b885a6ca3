//! Competition entries (the dishes being judged).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a competition entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Generate a new random EntryId.
    pub fn new() -> Self {
        EntryId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presentation details carried alongside an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    /// Kitchen or restaurant presenting the dish.
    pub kitchen: String,
    /// Free-form category (e.g. "Prato Principal").
    pub category: Option<String>,
    /// Short description for boards and exports.
    pub description: Option<String>,
}

impl EntryDetails {
    pub fn new(kitchen: impl Into<String>) -> Self {
        Self {
            kitchen: kitchen.into(),
            category: None,
            description: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A dish in the competition catalog.
///
/// Entries are created and edited administratively; judges never mutate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    pub details: EntryDetails,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(name: impl Into<String>, details: EntryDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            name: name.into(),
            details,
            created_at: now,
        }
    }
}
