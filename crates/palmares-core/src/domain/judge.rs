//! Judges (the jurors rating entries).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a judge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JudgeId(pub String);

impl JudgeId {
    /// Generate a new random JudgeId.
    pub fn new() -> Self {
        JudgeId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for JudgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JudgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A juror on the panel.
///
/// `active = false` removes the judge from coverage statistics and
/// leaderboard gating while preserving every rating they already cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judge {
    pub id: JudgeId,
    pub name: String,
    /// Home city, as registered.
    pub city: Option<String>,
    /// Panel the judge sits on (e.g. "Júri Técnico Local").
    pub panel: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Judge {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: JudgeId::new(),
            name: name.into(),
            city: None,
            panel: None,
            active: true,
            created_at: now,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_panel(mut self, panel: impl Into<String>) -> Self {
        self.panel = Some(panel.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_judges_start_active() {
        let judge = Judge::new("Ana", Utc::now());
        assert!(judge.active);
        assert!(judge.city.is_none());
    }

    #[test]
    fn builders_fill_registration_fields() {
        let judge = Judge::new("Ana", Utc::now())
            .with_city("Salvador")
            .with_panel("Júri Técnico Nacional");
        assert_eq!(judge.city.as_deref(), Some("Salvador"));
        assert_eq!(judge.panel.as_deref(), Some("Júri Técnico Nacional"));
    }
}
