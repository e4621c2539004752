//! Location-aware record cache.
//!
//! [`Repository`] fetches a record set once, then serves it sorted by distance
//! from the latest reference point and grouped by region. All shared state lives
//! on one coordinator task; sorting runs off that task. Every reference-point
//! change starts a new generation and cancels the previous one, and concurrent
//! queries within a generation share a single computation.

mod config;
mod coordinator;
mod error;
mod repository;
mod source;

pub use config::{RepositoryConfig, SupersededPolicy};
pub use error::{ConfigError, FetchError, RepositoryError, Result};
pub use nearby_geo::GeoPoint;
pub use nearby_view::{Located, Record, SortedView};
pub use repository::{Repository, RepositoryStatus};
pub use source::{RecordSource, StaticSource};
