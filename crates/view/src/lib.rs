//! Distance-sorted, region-grouped views over located records.

/// The stock JSON record type.
pub mod record;
/// Sorting and grouping of records around a reference point.
pub mod sorted;

pub use nearby_geo::GeoPoint;
pub use record::{Record, parse_records};
pub use sorted::SortedView;

/// A record with a group key and a position.
pub trait Located {
	/// Group key used to partition records.
	fn region(&self) -> &str;
	/// Position of the record.
	fn geo(&self) -> GeoPoint;
}
