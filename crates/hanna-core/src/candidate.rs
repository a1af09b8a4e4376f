//! Candidate assembly: filter, order, rank and bound the store rows.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  filter::Filter,
  geometry::Geometry,
  object::ObjectRow,
  project::ProjectSummary,
};

/// Scope and bounds for [`assemble`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateQuery {
  /// Only rows of these projects. `None` or empty means all projects.
  pub project_ids:     Option<Vec<Uuid>>,
  pub include_deleted: bool,
  /// Attach dense ranks by project name.
  pub ranked:          bool,
  pub offset:          usize,
  /// `None` leaves the set unbounded (used for counting).
  pub limit:           Option<usize>,
}

impl CandidateQuery {
  fn in_scope(&self, row: &ObjectRow) -> bool {
    (self.include_deleted || !row.object.deleted)
      && self
        .project_ids
        .as_deref()
        .is_none_or(|ids| ids.is_empty() || ids.contains(&row.object.project_id))
  }
}

/// A project object eligible for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
  pub object_id:         Uuid,
  pub project_id:        Uuid,
  pub name:              String,
  pub object_types:      Vec<String>,
  pub object_categories: Vec<String>,
  pub object_usages:     Vec<String>,
  pub lifecycle_state:   String,
  pub object_stage:      String,
  pub start_date:        NaiveDate,
  pub end_date:          Option<NaiveDate>,
  pub geometry:          Option<Geometry>,
  pub geohash:           Option<String>,
  pub project_summary:   ProjectSummary,
  /// Dense 1-based rank of the parent project name; equal names share a rank.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rank:              Option<u32>,
}

impl CandidateRecord {
  fn from_row(row: ObjectRow, rank: Option<u32>) -> Self {
    let ObjectRow { object, project, geohash } = row;
    Self {
      object_id: object.object_id,
      project_id: object.project_id,
      name: object.name,
      object_types: object.object_types,
      object_categories: object.object_categories,
      object_usages: object.object_usages,
      lifecycle_state: object.lifecycle_state,
      object_stage: object.object_stage,
      start_date: object.start_date,
      end_date: object.end_date,
      geometry: object.geometry,
      geohash,
      project_summary: project,
      rank,
    }
  }
}

/// The bounded candidate set plus the size of the population it was cut from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
  pub records: Vec<CandidateRecord>,
  /// Matching rows before `offset`/`limit` were applied.
  pub total:   usize,
}

/// Filter `rows`, order them by project name, rank, page and truncate.
///
/// Truncation happens here, before any clustering, so cluster counts only
/// ever describe the first `limit` matches.
pub fn assemble(rows: Vec<ObjectRow>, filter: &Filter, query: &CandidateQuery) -> Candidates {
  let mut matched = matching_rows(rows, filter, query);

  matched.sort_by(|a, b| {
    a.project
      .name
      .cmp(&b.project.name)
      .then_with(|| a.object.name.cmp(&b.object.name))
      .then_with(|| a.object.object_id.cmp(&b.object.object_id))
  });

  let ranks = if query.ranked { dense_ranks(&matched) } else { vec![None; matched.len()] };
  let total = matched.len();

  let records = matched
    .into_iter()
    .zip(ranks)
    .skip(query.offset)
    .take(query.limit.unwrap_or(usize::MAX))
    .map(|(row, rank)| CandidateRecord::from_row(row, rank))
    .collect();

  Candidates { records, total }
}

/// Number of rows [`assemble`] would match, ignoring paging.
pub fn count(rows: Vec<ObjectRow>, filter: &Filter, query: &CandidateQuery) -> usize {
  matching_rows(rows, filter, query).len()
}

fn matching_rows(rows: Vec<ObjectRow>, filter: &Filter, query: &CandidateQuery) -> Vec<ObjectRow> {
  let mut seen = HashSet::new();
  rows
    .into_iter()
    .filter(|row| {
      // The store join yields one row per object; a repeat is a store bug.
      let first = seen.insert(row.object.object_id);
      if !first {
        tracing::warn!(object_id = %row.object.object_id, "store returned duplicate object row");
      }
      first
    })
    .filter(|row| query.in_scope(row) && filter.matches(row))
    .collect()
}

/// Dense ranks over rows already sorted by project name.
fn dense_ranks(sorted: &[ObjectRow]) -> Vec<Option<u32>> {
  let mut rank = 0u32;
  let mut previous: Option<&str> = None;
  sorted
    .iter()
    .map(|row| {
      if previous != Some(row.project.name.as_str()) {
        rank += 1;
        previous = Some(row.project.name.as_str());
      }
      Some(rank)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::{
    query::SearchRequest,
    test_support::{point_row, project, row},
    tokenize::WordTokenizer,
  };

  fn match_all() -> Filter {
    Filter::compose(&SearchRequest::default(), Arc::new(WordTokenizer::default())).unwrap()
  }

  fn ranked(limit: Option<usize>) -> CandidateQuery {
    CandidateQuery { ranked: true, limit, ..Default::default() }
  }

  #[test]
  fn orders_by_project_name_with_dense_ranks() {
    let (a, b, c) = (project("Aurinkolahti"), project("Bulevardi"), project("Bulevardi"));
    let rows = vec![
      point_row(&c, "c1", 24.9, 60.2),
      point_row(&a, "a1", 24.9, 60.2),
      point_row(&b, "b1", 24.9, 60.2),
      point_row(&a, "a2", 24.9, 60.2),
    ];

    let out = assemble(rows, &match_all(), &ranked(None));
    let names: Vec<_> = out.records.iter().map(|r| r.project_summary.name.as_str()).collect();
    let ranks: Vec<_> = out.records.iter().map(|r| r.rank.unwrap()).collect();

    assert_eq!(names, ["Aurinkolahti", "Aurinkolahti", "Bulevardi", "Bulevardi"]);
    assert_eq!(ranks, [1, 1, 2, 2]);
  }

  #[test]
  fn unranked_query_has_no_ranks() {
    let out = assemble(vec![row("a")], &match_all(), &CandidateQuery::default());
    assert_eq!(out.records[0].rank, None);
  }

  #[test]
  fn truncates_to_limit_and_reports_total() {
    let p = project("Iso hanke");
    let rows: Vec<_> = (0..600).map(|i| point_row(&p, &format!("{i:03}"), 24.9, 60.2)).collect();

    let out = assemble(rows, &match_all(), &ranked(Some(500)));
    assert_eq!(out.records.len(), 500);
    assert_eq!(out.total, 600);
    assert_eq!(out.records.last().unwrap().name, "499");
  }

  #[test]
  fn offset_pages_after_ranking() {
    let (a, b) = (project("A"), project("B"));
    let rows = vec![point_row(&a, "1", 0.0, 0.0), point_row(&b, "2", 0.0, 0.0)];
    let out = assemble(rows, &match_all(), &CandidateQuery { offset: 1, ..ranked(Some(10)) });
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].rank, Some(2));
  }

  #[test]
  fn deleted_rows_are_excluded_unless_requested() {
    let mut deleted = row("poistettu");
    deleted.object.deleted = true;
    let rows = vec![deleted, row("elossa")];

    assert_eq!(count(rows.clone(), &match_all(), &CandidateQuery::default()), 1);
    let with_deleted = CandidateQuery { include_deleted: true, ..Default::default() };
    assert_eq!(count(rows, &match_all(), &with_deleted), 2);
  }

  #[test]
  fn project_restriction() {
    let (a, b) = (project("A"), project("B"));
    let rows = vec![point_row(&a, "1", 0.0, 0.0), point_row(&b, "2", 0.0, 0.0)];

    let only_b = CandidateQuery { project_ids: Some(vec![b.project_id]), ..Default::default() };
    let out = assemble(rows.clone(), &match_all(), &only_b);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].project_id, b.project_id);

    let empty = CandidateQuery { project_ids: Some(vec![]), ..Default::default() };
    assert_eq!(count(rows, &match_all(), &empty), 2);
  }

  #[test]
  fn duplicate_rows_are_kept_once() {
    let r = row("kaksoiskappale");
    let out = assemble(vec![r.clone(), r], &match_all(), &ranked(None));
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.total, 1);
  }
}
