use crate::images::{ImageResolver, ImageSource, ResolverConfig};
use crate::index::TermIndex;
use crate::scoring::Scorer;
use crate::store::{Row, TabularStore};
use crate::Result;
use ordered_float::OrderedFloat;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use std::cmp::Reverse;
use std::path::PathBuf;

/// A row matched for a term, with its relevance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub row_index: usize,
    pub full_id: String,
    pub score: f64,
}

/// Order results by score descending, ties by `full_id` descending
///
/// Two stable sorts: the secondary key first, then the primary key, so equal
/// scores keep the `full_id` order established by the first pass.
pub fn rank(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| b.full_id.cmp(&a.full_id));
    results.sort_by_key(|r| Reverse(OrderedFloat(r.score)));
}

/// Read-only retrieval over a loaded catalog
///
/// The store and index are built once in the constructor and never mutated,
/// so an engine can be shared across threads for concurrent queries.
pub struct Engine<S = ImageResolver> {
    store: TabularStore,
    index: TermIndex,
    scorer: Scorer,
    images: S,
}

impl Engine<ImageResolver> {
    /// Load `metadata.csv` from the resolver root and index it
    pub fn load(config: ResolverConfig) -> Result<Self> {
        let store = TabularStore::open(&config.root)?;
        Ok(Self::new(store, ImageResolver::new(config)))
    }
}

impl<S: ImageSource> Engine<S> {
    pub fn new(store: TabularStore, images: S) -> Self {
        let index = TermIndex::build(&store);
        tracing::info!(
            "Catalog loaded: {} rows, {} distinct terms",
            store.row_count(),
            index.len()
        );

        Self {
            store,
            index,
            scorer: Scorer::default(),
            images,
        }
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn store(&self) -> &TabularStore {
        &self.store
    }

    pub fn index(&self) -> &TermIndex {
        &self.index
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn images(&self) -> &S {
        &self.images
    }

    /// Rows whose searchable fields contain `term`, in no particular order
    pub fn rows_for_term<'a>(&'a self, term: &str) -> impl Iterator<Item = (usize, &'a Row)> + 'a {
        self.index
            .lookup(term)
            .iter()
            .filter_map(move |&idx| self.store.row_at(idx).ok().map(|row| (idx, row)))
    }

    /// Scored matches for `term`, best first with deterministic tie order
    pub fn ranked_results(&self, term: &str) -> Vec<ScoredResult> {
        let mut results: Vec<ScoredResult> = self
            .rows_for_term(term)
            .map(|(row_index, row)| ScoredResult {
                row_index,
                full_id: row.full_id.clone(),
                score: self.scorer.score(row, term),
            })
            .collect();

        rank(&mut results);
        results
    }

    /// Pick an image for `term` from the rows tied for the best score
    ///
    /// Draws one row uniformly from the top-scoring band, then one of its
    /// images. Returns `Ok(None)` when nothing matches or the chosen asset has
    /// no images; resolver errors for the chosen asset are returned as-is.
    pub fn select_representative_image<R>(&self, term: &str, rng: &mut R) -> Result<Option<PathBuf>>
    where
        R: Rng + ?Sized,
    {
        let results = self.ranked_results(term);
        let Some(top_score) = results.first().map(|r| r.score) else {
            return Ok(None);
        };

        let band_len = results.iter().take_while(|r| r.score == top_score).count();
        let Some(chosen) = results[..band_len].choose(rng) else {
            return Ok(None);
        };
        tracing::debug!(
            "Representative for '{}' drawn from {} tied rows: {}",
            term,
            band_len,
            chosen.full_id
        );

        let images = self.images.images_for(&chosen.full_id)?;
        Ok(images.choose(rng).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::MemoryImages;
    use crate::scoring::{QueryNormalization, ScoringWeights};
    use crate::Error;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TABLE: &str = "\
fullId,category,wnlemmas,name,tags
wss.01,Mirror,mirror,Mirror,
wss.02,\"Mirror,WallDecor\",,Round mirror,mirror
wss.03,Mirror,mirror,Mirror,
wss.04,Chair,chair,Chair,
wss.05,,mirror,Mirror frame,
";

    fn engine() -> Engine<MemoryImages> {
        let store = TabularStore::from_reader(TABLE.as_bytes()).unwrap();
        let mut images = MemoryImages::new();
        images.insert("wss.01", ["01/a.png", "01/b.png"]).unwrap();
        images.insert("wss.03", ["03/a.png", "03/b.png", "03/c.png"]).unwrap();
        Engine::new(store, images)
    }

    fn result(row_index: usize, full_id: &str, score: f64) -> ScoredResult {
        ScoredResult { row_index, full_id: full_id.to_string(), score }
    }

    #[test]
    fn test_rows_for_term() {
        let engine = engine();
        let mut rows: Vec<usize> = engine.rows_for_term("MIRROR").map(|(i, _)| i).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 1, 2, 4]);
        assert_eq!(engine.rows_for_term("sofa").count(), 0);
    }

    #[test]
    fn test_ranked_results_order() {
        let results = engine().ranked_results("mirror");
        assert_eq!(
            results,
            vec![
                // 25 + 5 + 100, tie broken by full_id descending
                result(2, "wss.03", 130.0),
                result(0, "wss.01", 130.0),
                result(1, "wss.02", 20.0),
                result(4, "wss.05", 5.0),
            ]
        );
    }

    #[test]
    fn test_rank_is_input_order_independent() {
        let base = vec![
            result(0, "wss.b", 10.0),
            result(1, "wss.a", 10.0),
            result(2, "wss.c", 10.0),
            result(3, "wss.d", 50.0),
        ];
        let mut forward = base.clone();
        let mut reversed: Vec<_> = base.into_iter().rev().collect();
        rank(&mut forward);
        rank(&mut reversed);
        assert_eq!(forward, reversed);
        let ids: Vec<&str> = forward.iter().map(|r| r.full_id.as_str()).collect();
        assert_eq!(ids, vec!["wss.d", "wss.c", "wss.b", "wss.a"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let engine = engine();
        assert!(engine.ranked_results("sofa").is_empty());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(engine.select_representative_image("sofa", &mut rng).unwrap(), None);
    }

    #[test]
    fn test_representative_from_top_band_only() {
        let engine = engine();
        let allowed: Vec<PathBuf> = ["01/a.png", "01/b.png", "03/a.png", "03/b.png", "03/c.png"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let mut assets = std::collections::BTreeSet::new();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let image = engine.select_representative_image("mirror", &mut rng).unwrap().unwrap();
            assert!(allowed.contains(&image), "unexpected image {:?}", image);
            assets.insert(image.parent().unwrap().to_path_buf());
        }
        // every tied asset gets drawn, not only the head of the ranking
        assert_eq!(
            assets.into_iter().collect::<Vec<_>>(),
            vec![PathBuf::from("01"), PathBuf::from("03")]
        );
    }

    #[test]
    fn test_representative_is_seed_deterministic() {
        let engine = engine();
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            engine.select_representative_image("mirror", &mut rng).unwrap()
        };
        assert_eq!(pick(7), pick(7));
    }

    #[test]
    fn test_representative_surfaces_missing_images() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            engine.select_representative_image("chair", &mut rng),
            Err(Error::ImageDirNotFound(_))
        ));
    }

    #[test]
    fn test_with_scorer() {
        let engine = engine().with_scorer(Scorer::new(
            ScoringWeights::default(),
            QueryNormalization::LowercaseTrim,
        ));
        assert_eq!(engine.ranked_results("  chair ")[0].score, 25.0 + 5.0 + 100.0);
    }
}
