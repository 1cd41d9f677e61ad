//! Paper ingestion loop.
//!
//! Pages through the search API most-recent-first, merges each entry into
//! the database when it is new or carries a higher version, and classifies
//! added papers into the digest as it goes, so a partial run still yields
//! a partial report. Transport errors abort the run; an empty page and a
//! no-progress page (when configured) are terminal stop conditions.

use std::time::Duration;

use rand::Rng;

use crate::error::{AppError, Result};
use crate::models::{FilterConfig, Paper};
use crate::pipeline::classify::render_paper;
use crate::pipeline::digest::DigestBuilder;
use crate::services::{PageRequest, SearchSource, SortOrder};
use crate::storage::PaperDb;

/// Ingestion parameters, mirroring the CLI surface.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Query passed to the search API, in its own syntax
    pub search_query: String,

    /// First result offset (0 = most recent)
    pub start_index: usize,

    /// Offset ceiling; the loop never fetches past this index
    pub max_index: usize,

    /// Page size passed to the API
    pub results_per_iteration: usize,

    /// Base delay between pages in seconds (jitter is added on top)
    pub wait_time_secs: f64,

    /// Stop as soon as a page adds nothing new
    pub break_on_no_added: bool,

    /// Query and sort by update time instead of submission time
    pub sort_by_updated: bool,
}

/// Counters for a whole run.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchOutcome {
    /// Records created or superseded across the run
    pub added: usize,
    /// Records offered with an equal or lower version
    pub skipped: usize,
    /// Pages fetched
    pub pages: usize,
}

/// Run the ingestion loop against `source`, mutating `db` and `digest`.
///
/// The caller persists the database afterwards, and only when
/// `outcome.added > 0`: an unmodified collection is never rewritten.
pub async fn run_fetch(
    source: &dyn SearchSource,
    options: &FetchOptions,
    filters: &FilterConfig,
    db: &mut PaperDb,
    digest: &mut DigestBuilder,
) -> Result<FetchOutcome> {
    if options.results_per_iteration == 0 {
        return Err(AppError::config("results_per_iteration must be > 0"));
    }

    let sort = if options.sort_by_updated {
        SortOrder::Updated
    } else {
        SortOrder::Submitted
    };

    let mut outcome = FetchOutcome::default();
    let mut start = options.start_index;

    while start < options.max_index {
        log::info!(
            "Results {} - {}",
            start,
            start + options.results_per_iteration
        );

        let request = PageRequest {
            query: options.search_query.clone(),
            sort,
            start,
            max_results: options.results_per_iteration,
        };
        let entries = source.fetch_page(&request).await?;
        outcome.pages += 1;

        if entries.is_empty() {
            log::warn!("Received no results. Rate limiting? Stopping; restart later.");
            break;
        }

        let mut page_added = 0;
        let mut page_skipped = 0;

        for entry in &entries {
            let paper = Paper::from_entry(entry)?;

            let supersedes = match db.get(&paper.id) {
                None => true,
                Some(existing) => paper.version > existing.version,
            };
            if !supersedes {
                page_skipped += 1;
                continue;
            }

            if options.sort_by_updated {
                log::info!("Updated {} added {}", paper.updated, paper.title);
            } else {
                log::info!("Submitted {} added {}", paper.published, paper.title);
            }

            let category = paper.category();
            let rendered = render_paper(&paper, filters);
            digest.push(category, &rendered);
            db.insert(paper.id.clone(), paper);
            page_added += 1;
        }

        outcome.added += page_added;
        outcome.skipped += page_skipped;
        log::info!("Added {page_added} papers, already had {page_skipped}.");

        if page_added == 0 && options.break_on_no_added {
            log::info!("No new papers were added. Assuming none exist. Stopping.");
            break;
        }

        start += options.results_per_iteration;

        // Politeness delay toward the remote source; a zero base wait
        // (tests) skips it entirely.
        if start < options.max_index && options.wait_time_secs > 0.0 {
            let jitter = rand::thread_rng().gen_range(0.0..3.0);
            log::info!("Sleeping for {:.0} seconds", options.wait_time_secs);
            tokio::time::sleep(Duration::from_secs_f64(options.wait_time_secs + jitter)).await;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use crate::models::Category;

    /// Source that replays a scripted sequence of pages, then empty pages.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Vec<Value>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Vec<Value>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
            }
        }
    }

    #[async_trait]
    impl SearchSource for ScriptedSource {
        async fn fetch_page(&self, _request: &PageRequest) -> Result<Vec<Value>> {
            Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn entry(id: &str, version: u32, cat: &str, title: &str, summary: &str) -> Value {
        json!({
            "id": format!("http://arxiv.org/abs/{id}v{version}"),
            "title": title,
            "summary": summary,
            "published": "2026-01-05T12:00:00Z",
            "updated": "2026-01-06T09:30:00Z",
            "authors": [{"name": "A. Author"}],
            "arxiv_primary_category": {"term": cat}
        })
    }

    fn options(max_index: usize, per_page: usize, break_on_no_added: bool) -> FetchOptions {
        FetchOptions {
            search_query: "cat:hep-ex+OR+hep-ph".to_string(),
            start_index: 0,
            max_index,
            results_per_iteration: per_page,
            wait_time_secs: 0.0,
            break_on_no_added,
            sort_by_updated: false,
        }
    }

    fn higgs_filters() -> FilterConfig {
        FilterConfig {
            terms: vec!["Higgs".to_string()],
            collapse_authors: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_two_new_papers_are_added_and_classified() {
        let source = ScriptedSource::new(vec![vec![
            entry("1001.0001", 1, "hep-ph", "Higgs pair production", "An abstract."),
            entry("1002.0002", 1, "astro-ph", "A survey", "Stars."),
        ]]);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let outcome = run_fetch(
            &source,
            &options(1000, 100, false),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await
        .unwrap();

        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(db.len(), 2);
        assert_eq!(digest.total(), 2);
        assert_eq!(digest.matched(), 1);
        assert_eq!(digest.matched_in(Category::HepPh), 1);
        // Unknown category lands in the overflow bucket
        assert_eq!(db["1002.0002"].category(), Category::Other);
    }

    #[tokio::test]
    async fn test_higher_version_supersedes_existing_entry() {
        let first = vec![entry("1001.0001", 1, "hep-ph", "A title", "Old abstract.")];
        let second = vec![entry("1001.0001", 2, "hep-ph", "A title", "New abstract.")];
        let source = ScriptedSource::new(vec![first, second]);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let outcome = run_fetch(
            &source,
            &options(1000, 100, false),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await
        .unwrap();

        assert_eq!(outcome.added, 2);
        assert_eq!(db.len(), 1);
        assert_eq!(db["1001.0001"].version, 2);
        assert_eq!(db["1001.0001"].summary, "New abstract.");
    }

    #[tokio::test]
    async fn test_reingesting_same_page_changes_nothing() {
        let page = vec![
            entry("1001.0001", 1, "hep-ph", "A title", "An abstract."),
            entry("1002.0002", 1, "hep-th", "Another", "Text."),
        ];
        let source = ScriptedSource::new(vec![page.clone(), page]);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let outcome = run_fetch(
            &source,
            &options(1000, 100, false),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await
        .unwrap();

        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(db.len(), 2);
        assert_eq!(db["1001.0001"].version, 1);
    }

    #[tokio::test]
    async fn test_lower_version_never_replaces_stored_entry() {
        let source = ScriptedSource::new(vec![
            vec![entry("1001.0001", 3, "hep-ph", "A title", "Version three.")],
            vec![entry("1001.0001", 2, "hep-ph", "A title", "Version two.")],
        ]);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let outcome = run_fetch(
            &source,
            &options(1000, 100, false),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await
        .unwrap();

        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(db["1001.0001"].version, 3);
        assert_eq!(db["1001.0001"].summary, "Version three.");
    }

    #[tokio::test]
    async fn test_empty_page_stops_the_loop() {
        let source = ScriptedSource::new(vec![]);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let outcome = run_fetch(
            &source,
            &options(1000, 100, false),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await
        .unwrap();

        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.added, 0);
        assert!(db.is_empty());
    }

    #[tokio::test]
    async fn test_break_on_no_added_stops_after_stale_page() {
        let page = vec![entry("1001.0001", 1, "hep-ph", "A title", "Text.")];
        let stale = page.clone();
        // A third page exists but must never be fetched
        let fresh = vec![entry("1003.0003", 1, "hep-ph", "Later", "Text.")];
        let source = ScriptedSource::new(vec![page, stale, fresh]);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let outcome = run_fetch(
            &source,
            &options(1000, 100, true),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await
        .unwrap();

        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.added, 1);
        assert!(!db.contains_key("1003.0003"));
    }

    #[tokio::test]
    async fn test_loop_is_bounded_by_max_index() {
        // An endless supply of fresh papers; only ceil(10 / 5) = 2 pages fit
        let pages: Vec<Vec<Value>> = (0..20)
            .map(|i| {
                vec![entry(
                    &format!("1001.{i:04}"),
                    1,
                    "hep-ph",
                    "A title",
                    "Text.",
                )]
            })
            .collect();
        let source = ScriptedSource::new(pages);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let outcome = run_fetch(
            &source,
            &options(10, 5, false),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await
        .unwrap();

        assert_eq!(outcome.pages, 2);
    }

    #[tokio::test]
    async fn test_malformed_id_aborts_the_run() {
        let bad = json!({
            "id": "http://arxiv.org/abs/1001.0001",
            "title": "No version suffix",
            "summary": "Text.",
            "published": "2026-01-05T12:00:00Z",
            "updated": "2026-01-06T09:30:00Z",
            "authors": [{"name": "A. Author"}],
            "arxiv_primary_category": {"term": "hep-ph"}
        });
        let source = ScriptedSource::new(vec![vec![bad]]);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let result = run_fetch(
            &source,
            &options(1000, 100, false),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await;

        assert!(result.is_err());
        assert!(db.is_empty());
    }

    #[tokio::test]
    async fn test_zero_page_size_is_rejected() {
        let source = ScriptedSource::new(vec![]);
        let mut db = PaperDb::new();
        let mut digest = DigestBuilder::new();

        let result = run_fetch(
            &source,
            &options(1000, 0, false),
            &higgs_filters(),
            &mut db,
            &mut digest,
        )
        .await;

        assert!(result.is_err());
    }
}
