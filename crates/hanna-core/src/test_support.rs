//! Synthetic rows for unit tests.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  geometry::{Geometry, Point},
  object::{ObjectRow, ProjectObject},
  project::{ProjectSummary, ProjectType},
};

pub fn date(s: &str) -> NaiveDate { s.parse().expect("valid test date") }

pub fn project(name: &str) -> ProjectSummary {
  ProjectSummary {
    project_id:   Uuid::new_v4(),
    name:         name.into(),
    project_type: ProjectType::Investment,
    start_date:   date("2020-01-01"),
    end_date:     Some(date("2025-12-31")),
    geometry:     None,
  }
}

pub fn object(project: &ProjectSummary, name: &str, geometry: Option<Geometry>) -> ProjectObject {
  ProjectObject {
    object_id: Uuid::new_v4(),
    project_id: project.project_id,
    name: name.into(),
    description: None,
    object_types: vec!["katu".into()],
    object_categories: vec!["uudisrakentaminen".into()],
    object_usages: vec!["liikenne".into()],
    lifecycle_state: "01".into(),
    object_stage: "suunnittelu".into(),
    rakennuttaja_user: Some("rak1".into()),
    suunnitteluttaja_user: Some("suu1".into()),
    start_date: date("2021-01-01"),
    end_date: Some(date("2022-12-31")),
    geometry,
    deleted: false,
    user_roles: vec![],
  }
}

pub fn row_in(project: &ProjectSummary, name: &str, geometry: Option<Geometry>) -> ObjectRow {
  ObjectRow::new(object(project, name, geometry), project.clone())
}

pub fn point_row(project: &ProjectSummary, name: &str, x: f64, y: f64) -> ObjectRow {
  row_in(project, name, Some(Geometry::Point(Point::new(x, y))))
}

/// A row in Helsinki city centre under a project named "Projekti".
pub fn row(name: &str) -> ObjectRow { point_row(&project("Projekti"), name, 24.94, 60.17) }
