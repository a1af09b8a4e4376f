//! JSON REST API for the Hanna project-object search.
//!
//! Exposes an axum [`Router`] backed by an [`ObjectSearch`] over any
//! [`hanna_core::store::ObjectStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hanna_api::api_router(search.clone()))
//! ```

pub mod error;
pub mod search;

use std::sync::Arc;

use axum::{Router, routing::post};
use hanna_core::{search::ObjectSearch, store::ObjectStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build a fully-materialised API router for `search`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(search: Arc<ObjectSearch<S>>) -> Router<()>
where
  S: ObjectStore + 'static,
{
  Router::new()
    .route("/project-objects/search", post(search::search_map::<S>))
    .route("/project-objects/list", post(search::list::<S>))
    .route("/project-objects/count", post(search::count::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(search)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::NaiveDate;
  use hanna_core::{
    config::SearchConfig,
    geometry::{Geometry, Point},
    project::ProjectType,
  };
  use hanna_store_sqlite::{NewProject, NewProjectObject, SqliteStore};
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  /// Three objects in Kalasatama and five in Lauttasaari, one deleted.
  async fn make_router() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let project = store
      .add_project(NewProject {
        name:         "Kaupunkiuudistus".into(),
        project_type: ProjectType::Investment,
        start_date:   date(2024, 1, 1),
        end_date:     None,
        geometry:     None,
      })
      .await
      .unwrap();

    let points = (0..3)
      .map(|i| (format!("k{i}"), 24.978 + f64::from(i) * 0.001, 60.187))
      .chain((0..5).map(|i| (format!("l{i}"), 24.875 + f64::from(i) * 0.001, 60.158)));
    for (name, x, y) in points {
      store
        .add_object(NewProjectObject {
          object_types: vec!["katu".into()],
          geometry: Some(Geometry::Point(Point::new(x, y))),
          ..NewProjectObject::new(project.project_id, name, "aktiivinen", "toteutus", date(2024, 3, 1))
        })
        .await
        .unwrap();
    }
    let deleted = store
      .add_object(NewProjectObject::new(
        project.project_id,
        "poistettu",
        "aktiivinen",
        "toteutus",
        date(2024, 3, 1),
      ))
      .await
      .unwrap();
    store.soft_delete_object(deleted).await.unwrap();

    api_router(Arc::new(ObjectSearch::new(Arc::new(store), SearchConfig::default())))
  }

  async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  // ── search ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn search_zoomed_out_returns_clusters() {
    let (status, body) =
      post_json(make_router().await, "/project-objects/search", json!({ "zoom": 8 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["objects"].as_array().unwrap().len(), 0);

    let clusters = body["clusters"].as_array().unwrap();
    assert_eq!(clusters.len(), 2);
    let total: u64 = clusters.iter().map(|c| c["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 8);
    assert!(clusters.iter().all(|c| c["geohashPrefix"].as_str().unwrap().len() == 5));
    assert!(clusters.iter().all(|c| c["centroid"].as_array().unwrap().len() == 2));
  }

  #[tokio::test]
  async fn search_zoomed_in_returns_objects() {
    let (status, body) = post_json(
      make_router().await,
      "/project-objects/search",
      json!({ "zoom": 14, "textQuery": "l", "facetFilters": { "objectTypes": ["katu"] } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clusters"].as_array().unwrap().len(), 0);

    let objects = body["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 5);
    assert!(objects.iter().all(|o| o["projectSummary"]["projectType"] == "investment"));
    assert!(objects.iter().all(|o| o["geohash"].as_str().unwrap().starts_with("ud9wn")));
  }

  #[tokio::test]
  async fn invalid_extent_is_bad_request() {
    let (status, body) = post_json(
      make_router().await,
      "/project-objects/search",
      json!({ "mapExtent": [25.0, 60.0, 24.0] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("extent"));
  }

  #[tokio::test]
  async fn inverted_date_range_is_bad_request() {
    let (status, _) = post_json(
      make_router().await,
      "/project-objects/list",
      json!({ "dateRange": { "start": "2025-01-01", "end": "2024-01-01" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn null_filters_do_not_narrow() {
    let (status, body) = post_json(
      make_router().await,
      "/project-objects/search",
      json!({ "zoom": 12, "facetFilters": { "objectTypes": null }, "dateRange": null }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["objects"].as_array().unwrap().len(), 8);

    let (status, body) = post_json(
      make_router().await,
      "/project-objects/count",
      json!({ "facetFilters": null, "includeDeleted": null }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 8 }));
  }

  #[tokio::test]
  async fn unparseable_body_is_bad_request_with_error_body() {
    let (status, body) = post_json(
      make_router().await,
      "/project-objects/search",
      json!({ "facetFilters": { "objectTypes": "katu" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("objectTypes"));

    let (status, body) =
      post_json(make_router().await, "/project-objects/count", json!({ "zoom": "near" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  // ── list & count ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_pages_and_never_clusters() {
    let (status, body) = post_json(
      make_router().await,
      "/project-objects/list",
      json!({ "zoom": 3, "offset": 2, "limit": 4 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clusters"].as_array().unwrap().len(), 0);

    let names: Vec<&str> =
      body["objects"].as_array().unwrap().iter().map(|o| o["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["k2", "l0", "l1", "l2"]);
  }

  #[tokio::test]
  async fn count_honours_include_deleted() {
    let router = make_router().await;
    let (status, body) = post_json(router.clone(), "/project-objects/count", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 8 }));

    let (_, body) =
      post_json(router, "/project-objects/count", json!({ "includeDeleted": true })).await;
    assert_eq!(body, json!({ "count": 9 }));
  }
}
