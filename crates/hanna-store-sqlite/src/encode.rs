//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`. Code sets are compact JSON arrays.
//! Geometries are GeoJSON geometry objects. UUIDs are hyphenated lowercase.

use chrono::NaiveDate;
use hanna_core::{
  geometry::Geometry,
  object::{ObjectRow, ObjectUserRole, ProjectObject},
  project::{ProjectSummary, ProjectType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Code sets ───────────────────────────────────────────────────────────────

pub fn encode_codes(codes: &[String]) -> Result<String> { Ok(serde_json::to_string(codes)?) }

pub fn decode_codes(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Geometry ────────────────────────────────────────────────────────────────

pub fn encode_geometry(g: &Geometry) -> Result<String> { Ok(serde_json::to_string(g)?) }

/// Unparseable geometries are treated as missing rather than failing the
/// whole read.
pub fn decode_geometry(s: Option<&str>, owner: &str) -> Option<Geometry> {
  let s = s?;
  match serde_json::from_str(s) {
    Ok(g) => Some(g),
    Err(e) => {
      tracing::warn!(owner, error = %e, "ignoring unparseable geometry");
      None
    }
  }
}

// ─── ProjectType ─────────────────────────────────────────────────────────────

/// The extension table holding rows for `t`, if any.
pub fn extension_table(t: ProjectType) -> Option<&'static str> {
  match t {
    ProjectType::Investment => Some("investment_projects"),
    ProjectType::Maintenance => Some("maintenance_projects"),
    ProjectType::DetailPlan => Some("detailplan_projects"),
    ProjectType::Unknown => None,
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `project_objects` row joined with its project and
/// the three extension tables.
pub struct RawObjectRow {
  // project_objects columns
  pub object_id:             String,
  pub project_id:            String,
  pub name:                  String,
  pub description:           Option<String>,
  pub object_types:          String,
  pub object_categories:     String,
  pub object_usages:         String,
  pub lifecycle_state:       String,
  pub object_stage:          String,
  pub rakennuttaja_user:     Option<String>,
  pub suunnitteluttaja_user: Option<String>,
  pub start_date:            String,
  pub end_date:              Option<String>,
  pub geometry:              Option<String>,
  pub deleted:               bool,
  // projects join
  pub project_name:          String,
  pub project_start_date:    String,
  pub project_end_date:      Option<String>,
  pub project_geometry:      Option<String>,
  // extension joins
  pub is_investment:         bool,
  pub is_maintenance:        bool,
  pub is_detail_plan:        bool,
}

impl RawObjectRow {
  pub fn into_row(self, user_roles: Vec<ObjectUserRole>) -> Result<ObjectRow> {
    let project_id = decode_uuid(&self.project_id)?;

    let project_type =
      ProjectType::from_extensions(self.is_investment, self.is_maintenance, self.is_detail_plan);
    if project_type == ProjectType::Unknown {
      tracing::warn!(
        project_id = %project_id,
        investment = self.is_investment,
        maintenance = self.is_maintenance,
        detail_plan = self.is_detail_plan,
        "project has no single type extension; treating as unknown"
      );
    }

    let project = ProjectSummary {
      project_id,
      name: self.project_name,
      project_type,
      start_date: decode_date(&self.project_start_date)?,
      end_date: self.project_end_date.as_deref().map(decode_date).transpose()?,
      geometry: decode_geometry(self.project_geometry.as_deref(), &self.project_id),
    };

    let object = ProjectObject {
      object_id: decode_uuid(&self.object_id)?,
      project_id,
      name: self.name,
      description: self.description,
      object_types: decode_codes(&self.object_types)?,
      object_categories: decode_codes(&self.object_categories)?,
      object_usages: decode_codes(&self.object_usages)?,
      lifecycle_state: self.lifecycle_state,
      object_stage: self.object_stage,
      rakennuttaja_user: self.rakennuttaja_user,
      suunnitteluttaja_user: self.suunnitteluttaja_user,
      start_date: decode_date(&self.start_date)?,
      end_date: self.end_date.as_deref().map(decode_date).transpose()?,
      geometry: decode_geometry(self.geometry.as_deref(), &self.object_id),
      deleted: self.deleted,
      user_roles,
    };

    Ok(ObjectRow::new(object, project))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn date_roundtrip_and_error() {
    let d = decode_date("2024-02-29").unwrap();
    assert_eq!(encode_date(d), "2024-02-29");
    assert!(matches!(decode_date("29.2.2024"), Err(Error::DateParse(_))));
  }

  #[test]
  fn bad_geometry_reads_as_missing() {
    assert!(decode_geometry(Some("{\"type\":\"Blob\"}"), "x").is_none());
    assert!(decode_geometry(None, "x").is_none());
    assert!(decode_geometry(Some(r#"{"type":"Point","coordinates":[1,2]}"#), "x").is_some());
  }
}
