//! Project objects: the sub-objects of a project shown on the map.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  geohash::{self, STORED_PRECISION},
  geometry::Geometry,
  project::ProjectSummary,
};

/// One row of the user-role join set: `user_id` holds `role_id` on the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectUserRole {
  pub user_id: String,
  pub role_id: String,
}

/// A project object as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectObject {
  pub object_id:             Uuid,
  pub project_id:            Uuid,
  pub name:                  String,
  pub description:           Option<String>,
  /// Multi-valued code sets.
  pub object_types:          Vec<String>,
  pub object_categories:     Vec<String>,
  pub object_usages:         Vec<String>,
  /// Single-valued codes.
  pub lifecycle_state:       String,
  pub object_stage:          String,
  /// The two fixed operational roles.
  pub rakennuttaja_user:     Option<String>,
  pub suunnitteluttaja_user: Option<String>,
  pub start_date:            NaiveDate,
  /// `None` means the object is ongoing.
  pub end_date:              Option<NaiveDate>,
  pub geometry:              Option<Geometry>,
  pub deleted:               bool,
  pub user_roles:            Vec<ObjectUserRole>,
}

impl ProjectObject {
  /// Whether `user_id` holds any operational role on this object.
  pub fn has_participant(&self, user_id: &str) -> bool {
    self.rakennuttaja_user.as_deref() == Some(user_id)
      || self.suunnitteluttaja_user.as_deref() == Some(user_id)
      || self.user_roles.iter().any(|r| r.user_id == user_id)
  }
}

/// A store row: an object joined with its parent project.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRow {
  pub object:  ProjectObject,
  pub project: ProjectSummary,
  /// Geohash of the geometry centroid, when there is a usable geometry.
  pub geohash: Option<String>,
}

impl ObjectRow {
  /// Join `object` with its project and derive the geohash from the
  /// geometry's centroid. Empty geometries get no geohash.
  pub fn new(object: ProjectObject, project: ProjectSummary) -> Self {
    let geohash = object
      .geometry
      .as_ref()
      .and_then(Geometry::centroid)
      .map(|c| geohash::encode(c, STORED_PRECISION));
    Self { object, project, geohash }
  }
}
