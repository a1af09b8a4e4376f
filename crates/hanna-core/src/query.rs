//! The search request and its validation.
//!
//! Every filter is optional. An absent filter, or a present but empty one,
//! never narrows the result set.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{Error, Result, geometry::Extent};

/// An explicit JSON `null` reads the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Categorical code filters. An empty set means "match all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacetFilters {
  #[serde(deserialize_with = "null_as_default")]
  pub object_types:           BTreeSet<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub object_categories:      BTreeSet<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub object_usages:          BTreeSet<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub lifecycle_states:       BTreeSet<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub object_stages:          BTreeSet<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub rakennuttaja_users:     BTreeSet<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub suunnitteluttaja_users: BTreeSet<String>,
}

/// A closed date interval; a missing end is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
  pub start: Option<NaiveDate>,
  pub end:   Option<NaiveDate>,
}

impl DateRange {
  pub fn is_unbounded(&self) -> bool { self.start.is_none() && self.end.is_none() }
}

/// Parameters shared by the map search, list and count variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
  /// Free-text term matched against object names.
  pub text_query:                     Option<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub facet_filters:                  FacetFilters,
  pub date_range:                     Option<DateRange>,
  /// `[minX, minY, maxX, maxY]`.
  pub map_extent:                     Option<Vec<f64>>,
  /// With an extent, also keep objects that have no geometry at all.
  #[serde(deserialize_with = "null_as_default")]
  pub include_items_without_geometry: bool,
  /// Only objects where this user holds an operational role.
  pub participant_user_id:            Option<String>,
  /// Only objects of these projects. Empty means no restriction.
  pub project_ids:                    Option<Vec<Uuid>>,
  pub zoom:                           Option<f64>,
  /// Candidate cap; the configured default applies when absent.
  pub limit:                          Option<usize>,
  /// Rows to skip before `limit`, for list paging.
  #[serde(deserialize_with = "null_as_default")]
  pub offset:                         usize,
  /// Honoured by the list and count variants only.
  #[serde(deserialize_with = "null_as_default")]
  pub include_deleted:                bool,
}

impl SearchRequest {
  /// The parsed map extent, if one was given.
  pub fn extent(&self) -> Result<Option<Extent>> {
    self.map_extent.as_deref().map(Extent::from_slice).transpose()
  }

  /// The trimmed text query, or `None` if it is absent or blank.
  pub fn text(&self) -> Option<&str> {
    self.text_query.as_deref().map(str::trim).filter(|t| !t.is_empty())
  }

  /// The project restriction, or `None` if absent or empty.
  pub fn project_restriction(&self) -> Option<&[Uuid]> {
    self.project_ids.as_deref().filter(|ids| !ids.is_empty())
  }

  /// Reject malformed filter combinations before any query runs.
  pub fn validate(&self) -> Result<()> {
    self.extent()?;

    if let Some(DateRange { start: Some(start), end: Some(end) }) = self.date_range
      && start > end
    {
      return Err(Error::invalid(format!(
        "date range start {start} is after end {end}"
      )));
    }

    if self.limit == Some(0) {
      return Err(Error::invalid("limit must be at least 1"));
    }

    if let Some(zoom) = self.zoom
      && !zoom.is_finite()
    {
      return Err(Error::invalid("zoom must be a finite number"));
    }

    Ok(())
  }
}
