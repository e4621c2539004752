//! Error types for the repository.

use thiserror::Error;

/// Failure of the one-shot record fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
	/// The collaborator could not reach its backend.
	#[error("network error: {0}")]
	Network(String),

	/// The response could not be decoded into records.
	#[error("malformed records: {0}")]
	Parse(String),

	/// Any other failure reported by the record source.
	#[error("{0}")]
	Other(String),
}

impl From<serde_json::Error> for FetchError {
	fn from(err: serde_json::Error) -> Self {
		Self::Parse(err.to_string())
	}
}

/// Errors returned by repository queries.
///
/// Cloneable so one settled outcome can be handed to every waiter of a generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
	/// The record fetch this query depended on failed. Re-issuing the query
	/// triggers a fresh attempt.
	#[error("failed to fetch records: {0}")]
	Fetch(#[from] FetchError),

	/// The generation this query was bound to was superseded before it
	/// completed. Only surfaced under [`SupersededPolicy::Report`](crate::SupersededPolicy::Report).
	#[error("generation {generation} was superseded before it completed")]
	Cancelled { generation: u64 },

	/// Sorting the records failed unexpectedly.
	#[error("record computation failed: {0}")]
	Computation(String),

	/// The repository was shut down, before or while this query waited.
	#[error("repository has shut down")]
	Closed,
}

/// Result type for repository queries.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors that can occur when loading repository configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or an unknown/mistyped key.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
}
