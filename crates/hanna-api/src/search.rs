//! Handlers for `POST /project-objects/{search,list,count}`.
//!
//! All three take a [`SearchRequest`] JSON body. A body that does not parse
//! is a bad request.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use hanna_core::{
  query::SearchRequest,
  result::{CountResult, SearchResult},
  search::ObjectSearch,
  store::ObjectStore,
};

use crate::error::ApiError;

/// `POST /project-objects/search`: the map view. Clusters when zoomed out.
pub async fn search_map<S>(
  State(search): State<Arc<ObjectSearch<S>>>,
  payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError>
where
  S: ObjectStore + 'static,
{
  let Json(request) = payload?;
  Ok(Json(search.search_map(&request).await?))
}

/// `POST /project-objects/list`: raw records, paginated by `offset`/`limit`.
pub async fn list<S>(
  State(search): State<Arc<ObjectSearch<S>>>,
  payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError>
where
  S: ObjectStore + 'static,
{
  let Json(request) = payload?;
  Ok(Json(search.list(&request).await?))
}

/// `POST /project-objects/count`
pub async fn count<S>(
  State(search): State<Arc<ObjectSearch<S>>>,
  payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<CountResult>, ApiError>
where
  S: ObjectStore + 'static,
{
  let Json(request) = payload?;
  Ok(Json(search.count(&request).await?))
}
