//! Post-build metadata injection.
//!
//! Reads the content entries and the built base document, then writes one
//! derived document per entry to `{dist}/{route}/{slug}.html`. A bad entry
//! is logged with its slug and skipped; the rest of the batch still runs.

pub mod entry;
pub mod inject;
pub mod jsonld;
pub mod metadata;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use nai_core::{Error, PrerenderConfig};
use serde::Serialize;
use serde_json::Value;

pub use entry::{ContentEntry, load_entries};
pub use metadata::PageMeta;

use crate::html::BaseDocument;

/// An entry that produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    pub slug: String,
    pub error: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrerenderReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<EntryFailure>,
    /// Files written, in entry order.
    pub written: Vec<PathBuf>,
}

impl PrerenderReport {
    pub fn summary(&self) -> String {
        format!("{} succeeded / {} total", self.succeeded, self.total)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Batch runner over a fixed configuration.
#[derive(Debug, Clone)]
pub struct Prerenderer {
    config: PrerenderConfig,
}

impl Prerenderer {
    pub fn new(config: PrerenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrerenderConfig {
        &self.config
    }

    /// Run the whole batch.
    ///
    /// Returns `Ok(None)` when the base document does not exist yet, which
    /// only means the bundler has not produced output. Errors are limited to
    /// the batch as a whole: unreadable inputs or an output directory that
    /// cannot be created.
    pub fn run(&self) -> Result<Option<PrerenderReport>, Error> {
        let index_path = self.config.index_path();
        if !index_path.exists() {
            tracing::warn!("base document {} not found, skipping prerender", index_path.display());
            return Ok(None);
        }

        let source = std::fs::read_to_string(&index_path).map_err(|e| Error::io(&index_path, e))?;
        let entries = load_entries(&self.config.content_path)?;
        let base = BaseDocument::parse(&source);

        let out_dir = self.config.output_dir();
        std::fs::create_dir_all(&out_dir).map_err(|e| Error::io(&out_dir, e))?;

        tracing::debug!("prerendering {} entries into {}", entries.len(), out_dir.display());

        let mut report = PrerenderReport { total: entries.len(), ..Default::default() };
        let mut seen = HashSet::new();

        for value in entries {
            let hint = entry::slug_hint(&value);
            match self.render_entry(value, &base, &out_dir, &mut seen) {
                Ok(path) => {
                    report.succeeded += 1;
                    report.written.push(path);
                }
                Err(e) => {
                    let slug = match &e {
                        Error::InvalidEntry { slug, .. } => slug.clone(),
                        _ => hint,
                    };
                    tracing::error!(slug = %slug, "failed to prerender entry: {e}");
                    report.failures.push(EntryFailure { slug, error: e.to_string() });
                }
            }
        }

        tracing::info!("{}", report.summary());
        Ok(Some(report))
    }

    fn render_entry(
        &self, value: Value, base: &BaseDocument, out_dir: &Path, seen: &mut HashSet<String>,
    ) -> Result<PathBuf, Error> {
        let entry = ContentEntry::from_value(value)?;
        if !seen.insert(entry.slug.clone()) {
            return Err(Error::InvalidEntry {
                slug: entry.slug,
                reason: "duplicate slug, an earlier entry already owns this page".into(),
            });
        }

        let meta = PageMeta::derive(&entry, &self.config);
        let html = inject::render(base, &meta, &self.config)?;

        let path = out_dir.join(format!("{}.html", entry.slug));
        std::fs::write(&path, html).map_err(|e| Error::io(&path, e))?;
        tracing::debug!("wrote {}", path.display());
        Ok(path)
    }
}
