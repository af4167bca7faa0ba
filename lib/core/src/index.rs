// Inverted term index over the searchable fields of the metadata table
use crate::store::{SearchField, TabularStore};
use ahash::{AHashMap, AHashSet};

/// Value observed in the source data meaning "no value"; never indexed
pub const SENTINEL_TERM: &str = "*";

/// Normalize a phrase into an index key
#[inline]
pub fn normalize(term: &str) -> String {
    term.to_lowercase().trim().to_string()
}

/// Split a comma-separated field value into normalized terms
pub fn terms_of(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(',').map(normalize)
}

#[derive(Debug, Clone, Default)]
pub struct TermIndex {
    // term -> row indices containing it
    postings: AHashMap<String, AHashSet<usize>>,
    empty: AHashSet<usize>,
}

impl TermIndex {
    /// Build the index in one pass over every row of the store
    pub fn build(store: &TabularStore) -> Self {
        let mut postings: AHashMap<String, AHashSet<usize>> = AHashMap::new();

        for (row_index, row) in store.rows() {
            let mut terms: AHashSet<String> = AHashSet::new();
            for field in SearchField::ALL {
                if let Some(value) = row.field(field) {
                    terms.extend(terms_of(value));
                }
            }

            for term in terms {
                if term == SENTINEL_TERM {
                    continue;
                }
                postings.entry(term).or_default().insert(row_index);
            }
        }

        tracing::debug!(
            "Indexed {} distinct terms over {} rows",
            postings.len(),
            store.row_count()
        );

        Self {
            postings,
            empty: AHashSet::new(),
        }
    }

    /// Row indices whose searchable fields contain `term`
    ///
    /// The term is normalized the same way index keys are. An unknown term
    /// yields the empty set.
    pub fn lookup(&self, term: &str) -> &AHashSet<usize> {
        self.postings.get(&normalize(term)).unwrap_or(&self.empty)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.postings.contains_key(&normalize(term))
    }

    /// Every distinct term, in no particular order
    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.postings.keys().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
