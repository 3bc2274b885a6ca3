//! Criteria registry and star values.
//!
//! A competition rates every entry against a fixed, ordered set of weighted
//! criteria. The registry is validated once at construction; after that all
//! registry queries are infallible.

use serde::{Deserialize, Serialize};

use super::error::{ScoreError, ScoreResult};

/// Upper bound of the star scale. A mark is always 1..=`MAX_STARS`.
pub const MAX_STARS: u8 = 5;

/// A single weighted criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Stable key used in scorecards and exports (e.g. "sabor").
    pub key: String,
    /// Display label (e.g. "Sabor").
    pub label: String,
    /// Relative weight, strictly positive.
    pub weight: u32,
}

impl Criterion {
    pub fn new(key: impl Into<String>, label: impl Into<String>, weight: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            weight,
        }
    }
}

/// A validated star rating.
///
/// The inner value is private to guarantee it is always within
/// 1..=`MAX_STARS`, whether built via [`Stars::new`] or deserialized from a
/// stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    /// Validate a raw value into a star rating.
    pub fn new(value: u8) -> ScoreResult<Self> {
        if (1..=MAX_STARS).contains(&value) {
            Ok(Stars(value))
        } else {
            Err(ScoreError::InvalidValue { value })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = ScoreError;

    fn try_from(value: u8) -> ScoreResult<Self> {
        Stars::new(value)
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> u8 {
        stars.0
    }
}

impl std::fmt::Display for Stars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered set of criteria a competition scores against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaRegistry {
    criteria: Vec<Criterion>,
}

impl CriteriaRegistry {
    /// The six cook-off criteria, in judging order.
    pub fn standard() -> Self {
        Self {
            criteria: vec![
                Criterion::new("originalidade", "Originalidade", 2),
                Criterion::new("receita", "Receita", 2),
                Criterion::new("apresentacao", "Apresentação", 1),
                Criterion::new("harmonia", "Harmonia", 2),
                Criterion::new("sabor", "Sabor", 3),
                Criterion::new("adequacao", "Adequação", 3),
            ],
        }
    }

    /// Build a custom registry.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::InvalidRegistry` when the set is empty, a key is
    /// blank or duplicated, or a weight is zero.
    pub fn new(criteria: Vec<Criterion>) -> ScoreResult<Self> {
        if criteria.is_empty() {
            return Err(ScoreError::InvalidRegistry(
                "criteria set is empty".to_string(),
            ));
        }
        for criterion in &criteria {
            if criterion.key.trim().is_empty() {
                return Err(ScoreError::InvalidRegistry("blank key".to_string()));
            }
            if criterion.weight == 0 {
                return Err(ScoreError::InvalidRegistry(format!(
                    "criterion '{}' has zero weight",
                    criterion.key
                )));
            }
        }
        for (i, criterion) in criteria.iter().enumerate() {
            if criteria[..i].iter().any(|c| c.key == criterion.key) {
                return Err(ScoreError::InvalidRegistry(format!(
                    "duplicate key '{}'",
                    criterion.key
                )));
            }
        }
        Ok(Self { criteria })
    }

    /// The criteria in registry order.
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.criteria.iter().any(|c| c.key == key)
    }

    pub fn weight_of(&self, key: &str) -> Option<u32> {
        self.criteria.iter().find(|c| c.key == key).map(|c| c.weight)
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u32 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    /// Best achievable composite score: all criteria at `MAX_STARS`.
    pub fn max_possible_score(&self) -> u32 {
        self.total_weight() * u32::from(MAX_STARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_accepts_one_through_five() {
        for v in 1..=5u8 {
            assert_eq!(Stars::new(v).unwrap().value(), v);
        }
    }

    #[test]
    fn stars_rejects_zero_and_six() {
        assert!(matches!(
            Stars::new(0),
            Err(ScoreError::InvalidValue { value: 0 })
        ));
        assert!(matches!(
            Stars::new(6),
            Err(ScoreError::InvalidValue { value: 6 })
        ));
    }

    #[test]
    fn stars_deserialization_revalidates() {
        let ok: Stars = serde_json::from_str("4").unwrap();
        assert_eq!(ok.value(), 4);
        assert!(serde_json::from_str::<Stars>("9").is_err());
    }

    #[test]
    fn standard_registry_totals() {
        let registry = CriteriaRegistry::standard();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.total_weight(), 13);
        assert_eq!(registry.max_possible_score(), 65);
        assert_eq!(registry.weight_of("sabor"), Some(3));
        assert_eq!(registry.weight_of("apresentacao"), Some(1));
        assert!(!registry.contains("aroma"));
    }

    #[test]
    fn custom_registry_rejects_duplicates_and_zero_weight() {
        let dup = CriteriaRegistry::new(vec![
            Criterion::new("a", "A", 1),
            Criterion::new("a", "A again", 2),
        ]);
        assert!(matches!(dup, Err(ScoreError::InvalidRegistry(_))));

        let zero = CriteriaRegistry::new(vec![Criterion::new("a", "A", 0)]);
        assert!(matches!(zero, Err(ScoreError::InvalidRegistry(_))));

        let empty = CriteriaRegistry::new(Vec::new());
        assert!(matches!(empty, Err(ScoreError::InvalidRegistry(_))));
    }
}
