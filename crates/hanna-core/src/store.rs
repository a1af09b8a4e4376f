//! The `ObjectStore` trait: the query-executing collaborator behind the
//! search.
//!
//! The trait is implemented by storage backends (e.g. `hanna-store-sqlite`).
//! The search service depends on this abstraction only. Backends push down the
//! coarse [`ObjectScope`]; every finer predicate is evaluated by the
//! [`crate::filter`] fragments.

use std::future::Future;

use uuid::Uuid;

use crate::object::ObjectRow;

/// The coarse, index-friendly part of a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectScope {
  /// Only objects of these projects. `None` means all projects.
  pub project_ids:     Option<Vec<Uuid>>,
  pub include_deleted: bool,
}

/// Read access to project objects joined with their projects.
///
/// Implementations must return at most one row per object and must not fail
/// on a project with an inconsistent type; that degrades to
/// [`crate::project::ProjectType::Unknown`].
pub trait ObjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every object row within `scope`, in no particular order.
  fn scan_objects<'a>(
    &'a self,
    scope: &'a ObjectScope,
  ) -> impl Future<Output = Result<Vec<ObjectRow>, Self::Error>> + Send + 'a;
}
