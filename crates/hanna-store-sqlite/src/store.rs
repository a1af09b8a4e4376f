//! [`SqliteStore`]: the SQLite implementation of [`ObjectStore`].

use std::{collections::HashMap, path::Path};

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hanna_core::{
  geometry::Geometry,
  object::{ObjectRow, ObjectUserRole},
  project::{ProjectSummary, ProjectType},
  store::{ObjectScope, ObjectStore},
};

use crate::{
  encode::{
    RawObjectRow, decode_uuid, encode_codes, encode_date, encode_geometry, encode_uuid,
    extension_table,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`SqliteStore::add_project`].
#[derive(Debug, Clone)]
pub struct NewProject {
  pub name:         String,
  /// Decides which extension record is written; `Unknown` writes none.
  pub project_type: ProjectType,
  pub start_date:   NaiveDate,
  pub end_date:     Option<NaiveDate>,
  pub geometry:     Option<Geometry>,
}

/// Input to [`SqliteStore::add_object`]. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProjectObject {
  pub project_id:            Uuid,
  pub name:                  String,
  pub description:           Option<String>,
  pub object_types:          Vec<String>,
  pub object_categories:     Vec<String>,
  pub object_usages:         Vec<String>,
  pub lifecycle_state:       String,
  pub object_stage:          String,
  pub rakennuttaja_user:     Option<String>,
  pub suunnitteluttaja_user: Option<String>,
  pub start_date:            NaiveDate,
  pub end_date:              Option<NaiveDate>,
  pub geometry:              Option<Geometry>,
}

impl NewProjectObject {
  /// Convenience constructor with all optional fields empty.
  pub fn new(
    project_id: Uuid,
    name: impl Into<String>,
    lifecycle_state: impl Into<String>,
    object_stage: impl Into<String>,
    start_date: NaiveDate,
  ) -> Self {
    Self {
      project_id,
      name: name.into(),
      description: None,
      object_types: Vec::new(),
      object_categories: Vec::new(),
      object_usages: Vec::new(),
      lifecycle_state: lifecycle_state.into(),
      object_stage: object_stage.into(),
      rakennuttaja_user: None,
      suunnitteluttaja_user: None,
      start_date,
      end_date: None,
      geometry: None,
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A project-object store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

const OBJECT_COLUMNS: &str = "
  o.object_id, o.project_id, o.name, o.description,
  o.object_types, o.object_categories, o.object_usages,
  o.lifecycle_state, o.object_stage, o.rakennuttaja_user, o.suunnitteluttaja_user,
  o.start_date, o.end_date, o.geometry, o.deleted,
  p.name, p.start_date, p.end_date, p.geometry,
  ip.project_id IS NOT NULL,
  mp.project_id IS NOT NULL,
  dp.project_id IS NOT NULL";

const OBJECT_JOINS: &str = "
  FROM project_objects o
  JOIN projects p                  ON p.project_id  = o.project_id
  LEFT JOIN investment_projects ip ON ip.project_id = p.project_id
  LEFT JOIN maintenance_projects mp ON mp.project_id = p.project_id
  LEFT JOIN detailplan_projects dp ON dp.project_id = p.project_id";

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Persist a project and the extension record for its type in one
  /// transaction.
  pub async fn add_project(&self, input: NewProject) -> Result<ProjectSummary> {
    let project = ProjectSummary {
      project_id:   Uuid::new_v4(),
      name:         input.name,
      project_type: input.project_type,
      start_date:   input.start_date,
      end_date:     input.end_date,
      geometry:     input.geometry,
    };

    let id_str       = encode_uuid(project.project_id);
    let name         = project.name.clone();
    let start_str    = encode_date(project.start_date);
    let end_str      = project.end_date.map(encode_date);
    let geometry_str = project.geometry.as_ref().map(encode_geometry).transpose()?;
    let extension    = extension_table(project.project_type);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO projects (project_id, name, start_date, end_date, geometry)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, start_str, end_str, geometry_str],
        )?;
        if let Some(table) = extension {
          tx.execute(
            &format!("INSERT INTO {table} (project_id) VALUES (?1)"),
            rusqlite::params![id_str],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(project)
  }

  /// Attach an extension record to an existing project. Adding a second,
  /// different extension makes the project's type read back as `Unknown`.
  pub async fn add_extension(&self, project_id: Uuid, project_type: ProjectType) -> Result<()> {
    let Some(table) = extension_table(project_type) else { return Ok(()) };
    self.require_project(project_id).await?;

    let id_str = encode_uuid(project_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT OR IGNORE INTO {table} (project_id) VALUES (?1)"),
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Persist a project object and return its id.
  pub async fn add_object(&self, input: NewProjectObject) -> Result<Uuid> {
    self.require_project(input.project_id).await?;

    let object_id        = Uuid::new_v4();
    let object_id_str    = encode_uuid(object_id);
    let project_id_str   = encode_uuid(input.project_id);
    let types_str        = encode_codes(&input.object_types)?;
    let categories_str   = encode_codes(&input.object_categories)?;
    let usages_str       = encode_codes(&input.object_usages)?;
    let start_str        = encode_date(input.start_date);
    let end_str          = input.end_date.map(encode_date);
    let geometry_str     = input.geometry.as_ref().map(encode_geometry).transpose()?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO project_objects (
             object_id, project_id, name, description,
             object_types, object_categories, object_usages,
             lifecycle_state, object_stage, rakennuttaja_user, suunnitteluttaja_user,
             start_date, end_date, geometry
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            object_id_str,
            project_id_str,
            input.name,
            input.description,
            types_str,
            categories_str,
            usages_str,
            input.lifecycle_state,
            input.object_stage,
            input.rakennuttaja_user,
            input.suunnitteluttaja_user,
            start_str,
            end_str,
            geometry_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(object_id)
  }

  /// Add `user_id` to the object's role join set. Idempotent.
  pub async fn assign_role(
    &self,
    object_id: Uuid,
    user_id: impl Into<String>,
    role_id: impl Into<String>,
  ) -> Result<()> {
    self.require_object(object_id).await?;

    let object_id_str = encode_uuid(object_id);
    let user_id       = user_id.into();
    let role_id       = role_id.into();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO project_object_user_roles (object_id, user_id, role_id)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![object_id_str, user_id, role_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Mark an object deleted. Deleted objects stay readable with
  /// `include_deleted`.
  pub async fn soft_delete_object(&self, object_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(object_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE project_objects SET deleted = 1 WHERE object_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ObjectNotFound(object_id));
    }
    Ok(())
  }

  async fn require_project(&self, project_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(project_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM projects WHERE project_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    if !exists {
      return Err(Error::ProjectNotFound(project_id));
    }
    Ok(())
  }

  async fn require_object(&self, object_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(object_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM project_objects WHERE object_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    if !exists {
      return Err(Error::ObjectNotFound(object_id));
    }
    Ok(())
  }
}

/// `WHERE` clause and parameters for `scope`. `?1` is the include-deleted
/// flag; project ids follow from `?2`.
fn scope_clause(scope: &ObjectScope) -> (String, Vec<rusqlite::types::Value>) {
  let mut params = vec![rusqlite::types::Value::Integer(i64::from(scope.include_deleted))];
  let mut clause = String::from("WHERE (?1 OR o.deleted = 0)");

  if let Some(ids) = scope.project_ids.as_deref().filter(|ids| !ids.is_empty()) {
    let placeholders: Vec<String> = (0..ids.len()).map(|i| format!("?{}", i + 2)).collect();
    clause.push_str(&format!(" AND o.project_id IN ({})", placeholders.join(", ")));
    params.extend(ids.iter().map(|id| rusqlite::types::Value::Text(encode_uuid(*id))));
  }

  (clause, params)
}

// ─── ObjectStore impl ────────────────────────────────────────────────────────

impl ObjectStore for SqliteStore {
  type Error = Error;

  async fn scan_objects(&self, scope: &ObjectScope) -> Result<Vec<ObjectRow>> {
    let (where_clause, params) = scope_clause(scope);

    let (raws, raw_roles): (Vec<RawObjectRow>, Vec<(String, String, String)>) = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {OBJECT_COLUMNS} {OBJECT_JOINS} {where_clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawObjectRow {
              object_id:             row.get(0)?,
              project_id:            row.get(1)?,
              name:                  row.get(2)?,
              description:           row.get(3)?,
              object_types:          row.get(4)?,
              object_categories:     row.get(5)?,
              object_usages:         row.get(6)?,
              lifecycle_state:       row.get(7)?,
              object_stage:          row.get(8)?,
              rakennuttaja_user:     row.get(9)?,
              suunnitteluttaja_user: row.get(10)?,
              start_date:            row.get(11)?,
              end_date:              row.get(12)?,
              geometry:              row.get(13)?,
              deleted:               row.get(14)?,
              project_name:          row.get(15)?,
              project_start_date:    row.get(16)?,
              project_end_date:      row.get(17)?,
              project_geometry:      row.get(18)?,
              is_investment:         row.get(19)?,
              is_maintenance:        row.get(20)?,
              is_detail_plan:        row.get(21)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        // Roles are read separately so the object query stays one row per
        // object.
        let roles_sql = format!(
          "SELECT r.object_id, r.user_id, r.role_id
           FROM project_object_user_roles r
           JOIN project_objects o ON o.object_id = r.object_id
           {where_clause}
           ORDER BY r.object_id, r.user_id, r.role_id"
        );
        let mut stmt = conn.prepare(&roles_sql)?;
        let roles = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, roles))
      })
      .await?;

    let mut roles_by_object: HashMap<Uuid, Vec<ObjectUserRole>> = HashMap::new();
    for (object_id, user_id, role_id) in raw_roles {
      roles_by_object
        .entry(decode_uuid(&object_id)?)
        .or_default()
        .push(ObjectUserRole { user_id, role_id });
    }

    raws
      .into_iter()
      .map(|raw| {
        let roles = decode_uuid(&raw.object_id)
          .map(|id| roles_by_object.remove(&id).unwrap_or_default())?;
        raw.into_row(roles)
      })
      .collect()
  }
}
