//! Write-mode session.

use std::fs;
use std::path::{Path, PathBuf};

use super::types::IndexOptions;
use crate::error::Result;
use crate::index::InvertedIndex;
use crate::ngram::NGramExtractor;
use crate::storage::{
    BucketDir, CorpusWriter, DatabaseMeta, WriterLock, CORPUS_FILE, LOCK_FILE, META_FILE,
    POSTINGS_DIR,
};

/// Everything a writer holds between open and close.
///
/// Field order matters: the lock is declared last so it is released after
/// every file handle on drop.
pub(crate) struct WriteSession {
    root: PathBuf,
    meta: DatabaseMeta,
    extractor: NGramExtractor,
    corpus: CorpusWriter,
    index: InvertedIndex<BucketDir>,
    _lock: WriterLock,
}

impl WriteSession {
    pub(crate) fn open(root: &Path, options: &IndexOptions) -> Result<Self> {
        options.validate()?;
        fs::create_dir_all(root)?;
        let lock = WriterLock::acquire(&root.join(LOCK_FILE))?;

        let meta_path = root.join(META_FILE);
        let meta = if meta_path.exists() {
            let meta = DatabaseMeta::load(&meta_path)?;
            meta.options.ensure_matches(options)?;
            meta
        } else {
            let meta = DatabaseMeta::new(*options);
            meta.store(&meta_path)?;
            meta
        };

        let extractor = meta.options.extractor()?;
        let corpus = CorpusWriter::open(
            &root.join(CORPUS_FILE),
            meta.corpus_bytes,
            meta.string_count,
        )?;
        let buckets = BucketDir::create(root.join(POSTINGS_DIR))?;
        let index = InvertedIndex::with_committed(
            buckets,
            meta.buckets.iter().map(|(&size, &watermark)| (size, watermark)),
        )
        .with_visible_limit(meta.string_count);

        tracing::info!(
            path = %root.display(),
            mode = "write",
            strings = meta.string_count,
            buckets = meta.buckets.len(),
            "Opened database"
        );

        Ok(Self {
            root: root.to_path_buf(),
            meta,
            extractor,
            corpus,
            index,
            _lock: lock,
        })
    }

    /// Indexes `text` under the next ID, then appends it to the corpus.
    ///
    /// Nothing is indexed unless the corpus accepts the string, and a failed
    /// append poisons the corpus, so an ID indexed here is never committed
    /// without its string.
    pub(crate) fn insert(&mut self, text: &str) -> Result<u32> {
        self.corpus.check_append(text)?;
        let ngrams = self.extractor.extract(text);
        let id = self.corpus.count();
        self.index.insert(id, &ngrams)?;
        self.corpus.append(text)
    }

    pub(crate) fn string_count(&self) -> u32 {
        self.corpus.count()
    }

    pub(crate) fn meta(&self) -> &DatabaseMeta {
        &self.meta
    }

    pub(crate) fn index(&self) -> &InvertedIndex<BucketDir> {
        &self.index
    }

    /// Syncs the corpus, rewrites dirty buckets, then replaces the metadata.
    pub(crate) fn close(mut self) -> Result<()> {
        let (corpus_bytes, string_count) = self.corpus.commit()?;
        let written = self.index.flush(string_count)?;

        self.meta.string_count = string_count;
        self.meta.corpus_bytes = corpus_bytes;
        self.meta.buckets = self.index.committed_watermarks();
        self.meta.store(&self.root.join(META_FILE))?;

        tracing::info!(
            path = %self.root.display(),
            strings = string_count,
            buckets_written = written,
            "Closed database"
        );
        Ok(())
    }
}
