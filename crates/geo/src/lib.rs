//! Geographic points and great-circle distance.
//!
//! Positions are latitude/longitude pairs in degrees. Distances are computed
//! on a sphere of mean Earth radius, which is accurate to well under one
//! percent for ranking by proximity.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A latitude/longitude pair in degrees.
///
/// Serializes as `{ "lat": .., "long": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub long: f64,
}

impl GeoPoint {
	pub const fn new(lat: f64, long: f64) -> Self {
		Self { lat, long }
	}

	/// Great-circle distance to `other` in meters, using the haversine formula.
	///
	/// Returns NaN when either point has a NaN coordinate.
	///
	/// ```
	/// use nearby_geo::GeoPoint;
	///
	/// // One degree of longitude along the equator is roughly 111.2 km.
	/// let d = GeoPoint::new(0.0, 0.0).distance_m(&GeoPoint::new(0.0, 1.0));
	/// assert!((d - 111_195.0).abs() < 1.0);
	/// ```
	pub fn distance_m(&self, other: &GeoPoint) -> f64 {
		let lat1 = self.lat.to_radians();
		let lat2 = other.lat.to_radians();
		let delta_lat = (other.lat - self.lat).to_radians();
		let delta_long = (other.long - self.long).to_radians();

		let a = (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_long / 2.0).sin().powi(2);
		// Rounding can push `a` a hair above 1 for antipodal points. NaN passes through.
		let a = if a > 1.0 { 1.0 } else { a };
		let c = 2.0 * a.sqrt().asin();

		EARTH_RADIUS_M * c
	}
}

impl From<(f64, f64)> for GeoPoint {
	fn from((lat, long): (f64, f64)) -> Self {
		Self { lat, long }
	}
}
