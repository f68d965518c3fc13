//! Read-mode session and retrieval.

use std::ops::ControlFlow;
use std::path::Path;

use super::search::overlap_join;
use super::types::Match;
use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::measure::{validate_threshold, Measure};
use crate::ngram::NGramExtractor;
use crate::storage::{BucketDir, CorpusReader, DatabaseMeta, CORPUS_FILE, META_FILE, POSTINGS_DIR};

/// A committed snapshot opened for queries.
pub(crate) struct ReadSession {
    meta: DatabaseMeta,
    extractor: NGramExtractor,
    corpus: CorpusReader,
    index: InvertedIndex<BucketDir>,
}

impl ReadSession {
    pub(crate) fn open(root: &Path) -> Result<Self> {
        let meta_path = root.join(META_FILE);
        if !meta_path.is_file() {
            return Err(Error::NotFound(root.to_path_buf()));
        }
        let meta = DatabaseMeta::load(&meta_path)?;
        let extractor = meta.options.extractor()?;
        let corpus = CorpusReader::open(
            &root.join(CORPUS_FILE),
            meta.corpus_bytes,
            meta.string_count,
        )?;
        let index = InvertedIndex::with_committed(
            BucketDir::open(root.join(POSTINGS_DIR)),
            meta.buckets.iter().map(|(&size, &watermark)| (size, watermark)),
        )
        .with_visible_limit(meta.string_count);

        tracing::info!(
            path = %root.display(),
            mode = "read",
            strings = meta.string_count,
            buckets = meta.buckets.len(),
            "Opened database"
        );

        Ok(Self {
            meta,
            extractor,
            corpus,
            index,
        })
    }

    pub(crate) fn meta(&self) -> &DatabaseMeta {
        &self.meta
    }

    pub(crate) fn index(&self) -> &InvertedIndex<BucketDir> {
        &self.index
    }

    pub(crate) fn retrieve_scored(
        &self,
        query: &str,
        measure: Measure,
        threshold: f64,
    ) -> Result<Vec<Match>> {
        self.scan(query, measure, threshold, false)?
            .into_iter()
            .map(|(id, score)| {
                Ok(Match {
                    id,
                    text: self.corpus.get(id)?.to_string(),
                    score,
                })
            })
            .collect()
    }

    pub(crate) fn check(&self, query: &str, measure: Measure, threshold: f64) -> Result<bool> {
        let hits = self.scan(query, measure, threshold, true)?;
        match hits.first() {
            Some(&(id, _)) => {
                self.corpus.get(id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// IDs and scores of every string reaching `threshold`, bucket by bucket
    /// in ascending size, IDs ascending within a bucket.
    fn scan(
        &self,
        query: &str,
        measure: Measure,
        threshold: f64,
        first_only: bool,
    ) -> Result<Vec<(u32, f64)>> {
        validate_threshold(threshold)?;

        let ngrams = self.extractor.extract(query);
        let q = ngrams.len();
        if q == 0 {
            return Ok(Vec::new());
        }

        let (min_size, max_size) = measure.candidate_range(q, threshold);
        let mut hits = Vec::new();
        let mut buckets_scanned = 0usize;
        let mut candidates = 0usize;

        for size in self.index.bucket_sizes_in(min_size, max_size) {
            let c = size as usize;
            let min_overlap = measure.min_overlap(q, c, threshold);
            if min_overlap > q.min(c) {
                continue;
            }
            let Some(bucket) = self.index.bucket(size)? else {
                continue;
            };
            buckets_scanned += 1;

            let flow = overlap_join(&bucket, &ngrams, min_overlap, |id, shared| {
                candidates += 1;
                if measure.accepts(q, c, shared, threshold) {
                    hits.push((id, measure.score(q, c, shared)));
                    if first_only {
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            });
            if flow.is_break() {
                break;
            }
        }

        tracing::debug!(
            query_ngrams = q,
            %measure,
            threshold,
            buckets_scanned,
            candidates,
            matches = hits.len(),
            "Retrieval finished"
        );
        Ok(hits)
    }
}
