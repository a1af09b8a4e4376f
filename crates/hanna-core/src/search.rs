//! [`ObjectSearch`], the search service tying the pieces together.
//!
//! request → filter fragments → candidate assembly (bounded) → clustering →
//! response envelope. Every call is independent; the service holds only
//! read-only configuration and a shared store handle.

use std::sync::Arc;

use crate::{
  Error, Result,
  candidate::{self, CandidateQuery},
  cluster::{self, ClusterMode},
  config::SearchConfig,
  filter::Filter,
  object::ObjectRow,
  query::SearchRequest,
  result::{self, CountResult, SearchResult},
  store::{ObjectScope, ObjectStore},
  tokenize::{Tokenizer, WordTokenizer},
};

/// Project-object search over any [`ObjectStore`].
pub struct ObjectSearch<S> {
  store:     Arc<S>,
  config:    SearchConfig,
  tokenizer: Arc<dyn Tokenizer>,
}

impl<S> Clone for ObjectSearch<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      config:    self.config.clone(),
      tokenizer: Arc::clone(&self.tokenizer),
    }
  }
}

impl<S: ObjectStore> ObjectSearch<S> {
  /// A service using the default [`WordTokenizer`].
  pub fn new(store: Arc<S>, config: SearchConfig) -> Self {
    let tokenizer = Arc::new(WordTokenizer { min_term_length: config.min_term_length });
    Self { store, config, tokenizer }
  }

  /// Swap in a different (e.g. stemming) tokenizer.
  pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
    self.tokenizer = tokenizer;
    self
  }

  pub fn config(&self) -> &SearchConfig { &self.config }

  /// The map search: clusters below the zoom threshold, raw records above.
  /// Deleted objects are never shown on the map.
  pub async fn search_map(&self, request: &SearchRequest) -> Result<SearchResult> {
    let query = CandidateQuery {
      project_ids:     request.project_restriction().map(<[_]>::to_vec),
      include_deleted: false,
      ranked:          true,
      offset:          0,
      limit:           Some(self.limit(request)),
    };
    let (filter, rows) = self.fetch(request, &query).await?;
    let candidates = candidate::assemble(rows, &filter, &query);

    let mode = ClusterMode::select(request.zoom, true, self.config.clustering_zoom_threshold);
    let passed_in = candidates.records.len();
    let outcome = cluster::aggregate(candidates.records, mode);

    tracing::debug!(
      ?mode,
      total = candidates.total,
      passed_in,
      clusters = outcome.clusters.len(),
      excluded = outcome.excluded,
      "map search"
    );
    if candidates.total > passed_in {
      tracing::debug!(
        total = candidates.total,
        limit = passed_in,
        "candidate set truncated before clustering"
      );
    }

    Ok(result::assemble(outcome))
  }

  /// The unclustered list, honouring `offset`, `limit` and `includeDeleted`.
  pub async fn list(&self, request: &SearchRequest) -> Result<SearchResult> {
    let query = CandidateQuery {
      project_ids:     request.project_restriction().map(<[_]>::to_vec),
      include_deleted: request.include_deleted,
      ranked:          true,
      offset:          request.offset,
      limit:           Some(self.limit(request)),
    };
    let (filter, rows) = self.fetch(request, &query).await?;
    let candidates = candidate::assemble(rows, &filter, &query);
    tracing::debug!(total = candidates.total, returned = candidates.records.len(), "list");

    Ok(result::assemble(cluster::aggregate(candidates.records, ClusterMode::Raw)))
  }

  /// Number of matching objects, unbounded by `limit`.
  pub async fn count(&self, request: &SearchRequest) -> Result<CountResult> {
    let query = CandidateQuery {
      project_ids:     request.project_restriction().map(<[_]>::to_vec),
      include_deleted: request.include_deleted,
      ranked:          false,
      offset:          0,
      limit:           None,
    };
    let (filter, rows) = self.fetch(request, &query).await?;
    let count = candidate::count(rows, &filter, &query);
    tracing::debug!(count, "count");
    Ok(CountResult { count })
  }

  fn limit(&self, request: &SearchRequest) -> usize {
    request.limit.unwrap_or(self.config.result_limit)
  }

  /// Validate, compose the filter and read the scoped rows. Validation runs
  /// before the store is touched.
  async fn fetch(
    &self,
    request: &SearchRequest,
    query: &CandidateQuery,
  ) -> Result<(Filter, Vec<ObjectRow>)> {
    request.validate()?;
    let filter = Filter::compose(request, Arc::clone(&self.tokenizer))?;
    tracing::trace!(active_filters = filter.active_count(), "filter composed");

    let scope = ObjectScope {
      project_ids:     query.project_ids.clone(),
      include_deleted: query.include_deleted,
    };
    let rows = self
      .store
      .scan_objects(&scope)
      .await
      .map_err(|e| Error::QueryFailed(Box::new(e)))?;
    Ok((filter, rows))
  }
}
