//! The response envelope.

use serde::{Deserialize, Serialize};

use crate::{
  candidate::CandidateRecord,
  cluster::{ClusterOutcome, ClusterSummary},
};

/// Result of a map search or list.
///
/// Below the clustering threshold `clusters` is populated and `objects` is
/// empty; otherwise `clusters` is empty and `objects` carries full records in
/// rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
  pub objects:  Vec<CandidateRecord>,
  pub clusters: Vec<ClusterSummary>,
}

/// Result of the row-count variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResult {
  pub count: usize,
}

/// Build the envelope. Records already carry their project summaries and are
/// unique per object, so no reordering or de-duplication happens here.
pub fn assemble(outcome: ClusterOutcome) -> SearchResult {
  SearchResult { objects: outcome.objects, clusters: outcome.clusters }
}
