//! Weighted multi-field relevance scoring
//!
//! Each searchable field contributes independently: the full "exact" weight
//! when the whole normalized field equals the query term, otherwise the
//! "contains" weight when the term is one of the field's comma segments.
//! Contributions are summed across fields.

use crate::index::normalize;
use crate::store::{Row, SearchField};
use serde::{Deserialize, Serialize};

/// Points awarded by one field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldWeight {
    /// Whole field equals the term
    pub exact: f64,
    /// Term is one segment of the comma-separated field
    pub contains: f64,
}

impl FieldWeight {
    pub const fn new(exact: f64, contains: f64) -> Self {
        Self { exact, contains }
    }

    fn clamped(self) -> Self {
        Self {
            exact: self.exact.max(0.0),
            contains: self.contains.max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub category: FieldWeight,
    pub wordnet_lemmas: FieldWeight,
    pub tags: FieldWeight,
    pub name: FieldWeight,
}

impl ScoringWeights {
    pub fn get(&self, field: SearchField) -> FieldWeight {
        match field {
            SearchField::Category => self.category,
            SearchField::WordnetLemmas => self.wordnet_lemmas,
            SearchField::Tags => self.tags,
            SearchField::Name => self.name,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category: FieldWeight::new(25.0, 10.0),
            wordnet_lemmas: FieldWeight::new(5.0, 5.0),
            tags: FieldWeight::new(10.0, 10.0),
            name: FieldWeight::new(100.0, 20.0),
        }
    }
}

/// How the incoming query term is normalized before comparison
///
/// Field values are always lower-cased and trimmed. `LowercaseOnly` leaves
/// surrounding whitespace on the query, so `" desk"` scores zero against a
/// `desk` field even though the index lookup finds the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryNormalization {
    #[default]
    LowercaseOnly,
    LowercaseTrim,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scorer {
    weights: ScoringWeights,
    normalization: QueryNormalization,
}

impl Scorer {
    /// Negative weights are clamped to zero so scores stay non-negative
    pub fn new(weights: ScoringWeights, normalization: QueryNormalization) -> Self {
        let weights = ScoringWeights {
            category: weights.category.clamped(),
            wordnet_lemmas: weights.wordnet_lemmas.clamped(),
            tags: weights.tags.clamped(),
            name: weights.name.clamped(),
        };
        Self { weights, normalization }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn normalization(&self) -> QueryNormalization {
        self.normalization
    }

    fn normalize_query(&self, term: &str) -> String {
        match self.normalization {
            QueryNormalization::LowercaseOnly => term.to_lowercase(),
            QueryNormalization::LowercaseTrim => normalize(term),
        }
    }

    /// Relevance of `row` for `term`
    pub fn score(&self, row: &Row, term: &str) -> f64 {
        let term = self.normalize_query(term);
        SearchField::ALL
            .iter()
            .map(|&field| field_score(row.field(field), &term, self.weights.get(field)))
            .sum()
    }

    /// Per-field contributions, in `SearchField::ALL` order
    pub fn field_scores(&self, row: &Row, term: &str) -> [(SearchField, f64); 4] {
        let term = self.normalize_query(term);
        SearchField::ALL.map(|field| {
            (field, field_score(row.field(field), &term, self.weights.get(field)))
        })
    }
}

fn field_score(value: Option<&str>, term: &str, weight: FieldWeight) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    let value = normalize(value);
    if value == term {
        weight.exact
    } else if value.split(',').any(|part| part.trim() == term) {
        weight.contains
    } else {
        0.0
    }
}

/// Score with the default weights and query normalization
pub fn score(row: &Row, term: &str) -> f64 {
    Scorer::default().score(row, term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desk_row() -> Row {
        Row::new(6, "wss.7170910538470c80738e43095496b061")
            .with_field(SearchField::Category, "Desk,Furniture")
            .with_field(SearchField::Name, "desk")
    }

    #[test]
    fn test_name_exact_plus_category_contains() {
        let row = desk_row();
        assert_eq!(score(&row, "desk"), 110.0);
        assert_eq!(score(&row, "DESK"), 110.0);
    }

    #[test]
    fn test_category_list_only() {
        assert_eq!(score(&desk_row(), "furniture"), 10.0);
    }

    #[test]
    fn test_category_exact() {
        let row = Row::new(0, "wss.a").with_field(SearchField::Category, " Desk ");
        assert_eq!(score(&row, "desk"), 25.0);
    }

    #[test]
    fn test_segment_must_match_whole() {
        let row = Row::new(0, "wss.a").with_field(SearchField::Category, "Desks,Furniture");
        assert_eq!(score(&row, "desk"), 0.0);
    }

    #[test]
    fn test_segments_are_trimmed() {
        let row = Row::new(0, "wss.a").with_field(SearchField::Tags, "wood, desk ,office");
        assert_eq!(score(&row, "desk"), 10.0);
    }

    #[test]
    fn test_all_fields_accumulate() {
        let row = Row::new(0, "wss.a")
            .with_field(SearchField::Category, "Lamp")
            .with_field(SearchField::WordnetLemmas, "lamp")
            .with_field(SearchField::Tags, "lamp,light")
            .with_field(SearchField::Name, "Lamp,Floor lamp");
        assert_eq!(score(&row, "lamp"), 25.0 + 5.0 + 10.0 + 20.0);
    }

    #[test]
    fn test_query_whitespace_parity() {
        let row = desk_row();
        assert_eq!(score(&row, " desk"), 0.0);

        let symmetric = Scorer::new(ScoringWeights::default(), QueryNormalization::LowercaseTrim);
        assert_eq!(symmetric.score(&row, " desk "), 110.0);
    }

    #[test]
    fn test_absent_fields_score_zero() {
        let row = Row::new(0, "wss.a");
        assert_eq!(score(&row, "anything"), 0.0);
    }

    #[test]
    fn test_field_sum_is_order_independent() {
        let row = desk_row();
        let scorer = Scorer::default();
        let forward: f64 = scorer.field_scores(&row, "desk").iter().map(|(_, s)| s).sum();
        let backward: f64 = scorer.field_scores(&row, "desk").iter().rev().map(|(_, s)| s).sum();
        assert_eq!(forward, backward);
        assert_eq!(forward, scorer.score(&row, "desk"));
    }

    #[test]
    fn test_negative_weights_clamped() {
        let mut weights = ScoringWeights::default();
        weights.name = FieldWeight::new(-100.0, -20.0);
        let scorer = Scorer::new(weights, QueryNormalization::default());
        assert!(scorer.score(&desk_row(), "desk") >= 0.0);
        assert_eq!(scorer.score(&desk_row(), "desk"), 10.0);
    }
}
