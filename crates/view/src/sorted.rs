use indexmap::IndexMap;

use crate::{GeoPoint, Located};

/// Immutable view of a record set ordered around an optional reference point.
///
/// Invariants:
/// * without a point, `chapters` keeps the input order;
/// * with a point, `chapters` is ascending by great-circle distance, stable on ties;
/// * the region map iterates in first-seen order within `chapters`, and its
///   groups partition `chapters` without reordering.
///
/// Entries whose distance is NaN sort after every finite distance; their order
/// relative to each other is unspecified.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedView<R> {
	point: Option<GeoPoint>,
	chapters: Vec<R>,
	by_region: IndexMap<String, Vec<R>>,
}

impl<R> SortedView<R>
where
	R: Located + Clone,
{
	/// Sorts and groups `records` around `point`.
	pub fn compute(records: &[R], point: Option<GeoPoint>) -> Self {
		let chapters = match point {
			None => records.to_vec(),
			Some(origin) => {
				let mut keyed: Vec<(f64, &R)> = records.iter().map(|r| (sort_key(origin.distance_m(&r.geo())), r)).collect();
				// `sort_by` is stable, so ties keep input order.
				keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
				keyed.into_iter().map(|(_, r)| r.clone()).collect()
			}
		};

		let mut by_region: IndexMap<String, Vec<R>> = IndexMap::new();
		for chapter in &chapters {
			match by_region.get_mut(chapter.region()) {
				Some(group) => group.push(chapter.clone()),
				None => {
					by_region.insert(chapter.region().to_owned(), vec![chapter.clone()]);
				}
			}
		}

		Self {
			point,
			chapters,
			by_region,
		}
	}
}

impl<R> SortedView<R> {
	/// Reference point this view was computed for.
	pub fn point(&self) -> Option<GeoPoint> {
		self.point
	}

	/// All records in view order.
	pub fn chapters(&self) -> &[R] {
		&self.chapters
	}

	/// Distinct regions in first-seen order.
	pub fn filters(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
		self.by_region.keys().map(String::as_str)
	}

	/// Records of one region in view order; empty for an unknown region.
	pub fn region(&self, key: &str) -> &[R] {
		self.by_region.get(key).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.chapters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chapters.is_empty()
	}
}

/// NaN carries no sign guarantee, so it is pinned to the far end explicitly.
fn sort_key(distance: f64) -> f64 {
	if distance.is_nan() { f64::INFINITY } else { distance }
}
