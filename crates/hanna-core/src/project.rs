//! Parent projects and their type discriminant.
//!
//! A project's type is not a column: it is whichever extension record
//! (investment, maintenance, detail plan) exists for it. The store resolves
//! that once per row into a [`ProjectType`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::geometry::Geometry;

/// The kind of project, derived from which extension record it has.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ProjectType {
  Investment,
  Maintenance,
  DetailPlan,
  /// No extension record, or more than one. Always a data inconsistency, but
  /// never a reason to fail a search.
  Unknown,
}

impl ProjectType {
  /// Resolve the type from the presence of each extension record.
  pub fn from_extensions(investment: bool, maintenance: bool, detail_plan: bool) -> Self {
    match (investment, maintenance, detail_plan) {
      (true, false, false) => Self::Investment,
      (false, true, false) => Self::Maintenance,
      (false, false, true) => Self::DetailPlan,
      _ => Self::Unknown,
    }
  }
}

/// The parent-project metadata attached to every search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
  pub project_id:   Uuid,
  pub name:         String,
  pub project_type: ProjectType,
  pub start_date:   NaiveDate,
  pub end_date:     Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub geometry:     Option<Geometry>,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn resolves_single_extension() {
    assert_eq!(ProjectType::from_extensions(true, false, false), ProjectType::Investment);
    assert_eq!(ProjectType::from_extensions(false, true, false), ProjectType::Maintenance);
    assert_eq!(ProjectType::from_extensions(false, false, true), ProjectType::DetailPlan);
  }

  #[test]
  fn missing_or_conflicting_extensions_degrade_to_unknown() {
    assert_eq!(ProjectType::from_extensions(false, false, false), ProjectType::Unknown);
    assert_eq!(ProjectType::from_extensions(true, true, false), ProjectType::Unknown);
  }

  #[test]
  fn text_discriminant_matches_wire_name() {
    assert_eq!(ProjectType::DetailPlan.as_ref(), "detailPlan");
    assert_eq!(ProjectType::from_str("maintenance").unwrap(), ProjectType::Maintenance);
    assert_eq!(
      serde_json::to_value(ProjectType::DetailPlan).unwrap(),
      serde_json::json!("detailPlan")
    );
  }
}
