//! Zoom-dependent clustering of the candidate set.
//!
//! The mode is chosen once per request. In raw mode candidates pass through
//! untouched. In cluster mode candidates are grouped by a geohash prefix whose
//! length follows the zoom level, and each group is reduced to a
//! [`ClusterSummary`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  candidate::CandidateRecord,
  geohash::{self, bucket_length},
  geometry::{Point, centroid_of_collection},
};

/// How a request's candidates are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode {
  Raw,
  Cluster { prefix_len: usize },
}

impl ClusterMode {
  /// Raw above `threshold` or when clustering is disabled; otherwise cluster
  /// at the zoom's bucket length. A missing zoom clusters at the coarsest
  /// bucket.
  pub fn select(zoom: Option<f64>, clustering_enabled: bool, threshold: f64) -> Self {
    if !clustering_enabled {
      return Self::Raw;
    }
    match zoom {
      Some(zoom) if zoom > threshold => Self::Raw,
      Some(zoom) => Self::Cluster { prefix_len: bucket_length(zoom) },
      None => Self::Cluster { prefix_len: bucket_length(f64::NEG_INFINITY) },
    }
  }
}

/// An aggregate over one geohash bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
  pub geohash_prefix: String,
  /// Member ids in candidate order. Always `count` long.
  pub member_ids:     Vec<Uuid>,
  pub count:          usize,
  /// Centroid of the union of the member geometries.
  pub centroid:       Point,
}

/// Output of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterOutcome {
  /// Raw mode only; empty in cluster mode.
  pub objects:  Vec<CandidateRecord>,
  /// Cluster mode only, ordered by geohash prefix; empty in raw mode.
  pub clusters: Vec<ClusterSummary>,
  /// Candidates dropped in cluster mode for lack of a geohash or geometry.
  pub excluded: usize,
}

pub fn aggregate(candidates: Vec<CandidateRecord>, mode: ClusterMode) -> ClusterOutcome {
  let prefix_len = match mode {
    ClusterMode::Raw => {
      return ClusterOutcome { objects: candidates, ..Default::default() };
    }
    ClusterMode::Cluster { prefix_len } => prefix_len,
  };

  let mut excluded = 0;
  let mut buckets: BTreeMap<String, Vec<CandidateRecord>> = BTreeMap::new();
  for candidate in candidates {
    let has_geometry = candidate.geometry.as_ref().is_some_and(|g| !g.is_empty());
    match candidate.geohash.as_deref() {
      Some(hash) if has_geometry => {
        let key = geohash::prefix(hash, prefix_len).to_owned();
        buckets.entry(key).or_default().push(candidate);
      }
      _ => excluded += 1,
    }
  }

  let clusters = buckets
    .into_iter()
    .filter_map(|(geohash_prefix, members)| {
      let centroid = centroid_of_collection(members.iter().filter_map(|m| m.geometry.as_ref()))?;
      let member_ids: Vec<Uuid> = members.iter().map(|m| m.object_id).collect();
      Some(ClusterSummary { geohash_prefix, count: member_ids.len(), member_ids, centroid })
    })
    .collect();

  ClusterOutcome { objects: Vec::new(), clusters, excluded }
}
