use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a query does when the generation it waits on is superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersededPolicy {
	/// Re-resolve against the newest generation. Callers never see
	/// [`RepositoryError::Cancelled`](crate::RepositoryError::Cancelled).
	#[default]
	Retarget,
	/// Return [`RepositoryError::Cancelled`](crate::RepositoryError::Cancelled)
	/// and let the caller re-issue the query.
	Report,
}

/// Repository tuning.
///
/// ```toml
/// superseded = "report"
/// blocking_threshold = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
	/// Policy for queries whose generation is superseded while they wait.
	pub superseded: SupersededPolicy,
	/// Record sets at least this large are sorted on the blocking pool; smaller
	/// ones are sorted inline on the generation's own task.
	pub blocking_threshold: usize,
}

impl Default for RepositoryConfig {
	fn default() -> Self {
		Self {
			superseded: SupersededPolicy::default(),
			blocking_threshold: 256,
		}
	}
}

impl RepositoryConfig {
	/// Parses a config from TOML. Missing keys take their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	pub fn with_superseded(mut self, policy: SupersededPolicy) -> Self {
		self.superseded = policy;
		self
	}

	pub fn with_blocking_threshold(mut self, threshold: usize) -> Self {
		self.blocking_threshold = threshold;
		self
	}
}
