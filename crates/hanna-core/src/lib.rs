//! Core types and search logic for the Hanna project-object map.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the records, the search request, the filter fragments, candidate
//! assembly, geohash clustering, and the [`store::ObjectStore`] trait that
//! storage backends implement.

pub mod candidate;
pub mod cluster;
pub mod config;
pub mod error;
pub mod filter;
pub mod geohash;
pub mod geometry;
pub mod object;
pub mod project;
pub mod query;
pub mod result;
pub mod search;
pub mod store;
pub mod tokenize;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
