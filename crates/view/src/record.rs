use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{GeoPoint, Located};

/// A fetched record: `{ "region": .., "geo": { "lat": .., "long": .. }, ... }`.
///
/// Fields other than `region` and `geo` are kept verbatim in [`Record::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	pub region: String,
	pub geo: GeoPoint,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Record {
	pub fn new(region: impl Into<String>, geo: impl Into<GeoPoint>) -> Self {
		Self {
			region: region.into(),
			geo: geo.into(),
			extra: Map::new(),
		}
	}

	/// Attaches one opaque field.
	pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.extra.insert(key.into(), value.into());
		self
	}

	/// Returns one opaque field.
	pub fn field(&self, key: &str) -> Option<&Value> {
		self.extra.get(key)
	}
}

impl Located for Record {
	fn region(&self) -> &str {
		&self.region
	}

	fn geo(&self) -> GeoPoint {
		self.geo
	}
}

/// Decodes a JSON array of records.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>, serde_json::Error> {
	serde_json::from_slice(bytes)
}
