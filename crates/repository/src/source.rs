use std::sync::Arc;

use async_trait::async_trait;
use nearby_view::Located;

use crate::error::FetchError;

/// One-shot supplier of the full record set.
///
/// The repository calls [`RecordSource::fetch_all`] lazily, and again only
/// after a failed attempt. A successful result is cached for the repository's
/// lifetime.
#[async_trait]
pub trait RecordSource: Send + Sync + 'static {
	type Record: Located + Clone + Send + Sync + 'static;

	async fn fetch_all(&self) -> Result<Vec<Self::Record>, FetchError>;
}

#[async_trait]
impl<S> RecordSource for Arc<S>
where
	S: RecordSource + ?Sized,
{
	type Record = S::Record;

	async fn fetch_all(&self) -> Result<Vec<Self::Record>, FetchError> {
		(**self).fetch_all().await
	}
}

/// Source serving a fixed record set.
#[derive(Debug, Clone)]
pub struct StaticSource<R> {
	records: Arc<[R]>,
}

impl<R> StaticSource<R> {
	pub fn new(records: impl Into<Arc<[R]>>) -> Self {
		Self { records: records.into() }
	}
}

#[async_trait]
impl<R> RecordSource for StaticSource<R>
where
	R: Located + Clone + Send + Sync + 'static,
{
	type Record = R;

	async fn fetch_all(&self) -> Result<Vec<R>, FetchError> {
		Ok(self.records.to_vec())
	}
}
