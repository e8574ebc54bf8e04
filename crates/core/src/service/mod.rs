//! Boundary to the transit-graph service.

/// HTTP implementation of [`GraphService`].
pub mod client;

use std::{collections::HashMap, future::Future};

use thiserror::Error;

use crate::models::{LineInfo, PathSolution, RandomPair, ValidationOutcome};

pub use client::HttpGraphService;

/// Failure talking to the graph service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport or decoding failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Service answered with a non-success status.
    #[error("service returned {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// `detail` field of the error body, or the raw body.
        detail: String,
    },
    /// Base URL cannot address the service endpoints.
    #[error("invalid service url: {0}")]
    InvalidUrl(String),
}

/// Operations the game consumes from the graph service.
///
/// The game never computes routes itself; every graph question is answered here.
pub trait GraphService: Send + Sync + 'static {
    /// Ordered line identifiers for `city`.
    fn lines(&self, city: &str)
        -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;

    /// Stations served by a single line.
    fn line_stations(
        &self,
        city: &str,
        line: &str,
    ) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;

    /// Color and station membership for every line of `city`.
    fn line_metadata(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<HashMap<String, LineInfo>, ServiceError>> + Send;

    /// Stations present on any of `lines`.
    fn stations_for(
        &self,
        city: &str,
        lines: &[String],
    ) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;

    /// Stations connected to `start` using only `lines`.
    fn reachable_from(
        &self,
        city: &str,
        lines: &[String],
        start: &str,
    ) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;

    /// Random connected start/end pair within `lines`.
    fn random_pair(
        &self,
        city: &str,
        lines: &[String],
    ) -> impl Future<Output = Result<RandomPair, ServiceError>> + Send;

    /// Minimum cost and every optimal path between two stations.
    fn shortest_path(
        &self,
        city: &str,
        lines: &[String],
        start: &str,
        end: &str,
    ) -> impl Future<Output = Result<PathSolution, ServiceError>> + Send;

    /// Score a user path against the optimum.
    fn validate_path(
        &self,
        city: &str,
        lines: &[String],
        start: &str,
        end: &str,
        user_path: &[String],
    ) -> impl Future<Output = Result<ValidationOutcome, ServiceError>> + Send;
}

/// Line list plus metadata, fetched in that order. Either both arrive or neither is used.
pub async fn fetch_catalog<S: GraphService>(
    service: &S,
    city: &str,
) -> Result<(Vec<String>, HashMap<String, LineInfo>), ServiceError> {
    let lines = service.lines(city).await?;
    let metadata = service.line_metadata(city).await?;
    Ok((lines, metadata))
}
