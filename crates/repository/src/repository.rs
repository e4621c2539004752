use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nearby_geo::GeoPoint;
use nearby_view::SortedView;
use nearby_worker::{Executor, FlightOutcome, TaskClass};
use tokio::sync::{mpsc, oneshot};

use crate::config::{RepositoryConfig, SupersededPolicy};
use crate::coordinator::{Command, Coordinator};
use crate::error::{RepositoryError, Result};
use crate::source::RecordSource;

/// Point-in-time snapshot of the coordinator's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepositoryStatus {
	/// Current generation, if any computation was ever started.
	pub generation: Option<u64>,
	/// Whether the current generation is still computing.
	pub pending: bool,
	/// Whether a fetched record set is cached.
	pub snapshot_cached: bool,
	/// Fetch attempts started so far.
	pub fetch_attempts: u64,
	/// Generations started so far.
	pub computations: u64,
	/// Query resolutions handed out so far.
	pub queries: u64,
	pub initialized: bool,
}

/// Cloneable handle to a location-aware record cache.
///
/// Every clone talks to the same coordinator task. The coordinator stops once
/// [`Repository::shutdown`] is called or the last clone is dropped.
pub struct Repository<S: RecordSource> {
	commands: mpsc::UnboundedSender<Command<S::Record>>,
	initialized: Arc<AtomicBool>,
	policy: SupersededPolicy,
}

impl<S: RecordSource> Clone for Repository<S> {
	fn clone(&self) -> Self {
		Self {
			commands: self.commands.clone(),
			initialized: Arc::clone(&self.initialized),
			policy: self.policy,
		}
	}
}

impl<S: RecordSource> std::fmt::Debug for Repository<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Repository")
			.field("initialized", &self.is_initialized())
			.field("policy", &self.policy)
			.finish_non_exhaustive()
	}
}

impl<S: RecordSource> Repository<S> {
	/// Creates a repository with default configuration.
	///
	/// Spawns the coordinator on the ambient Tokio runtime, or on the worker
	/// fallback runtime when called outside one. Nothing is fetched until the
	/// first query or reference-point change.
	pub fn new(source: S) -> Self {
		Self::with_config(source, RepositoryConfig::default())
	}

	pub fn with_config(source: S, config: RepositoryConfig) -> Self {
		let (commands, rx) = mpsc::unbounded_channel();
		let initialized = Arc::new(AtomicBool::new(false));
		let policy = config.superseded;
		let executor = Executor::ambient();
		let coordinator = Coordinator::new(Arc::new(source), config, executor.clone(), Arc::clone(&initialized));
		executor.spawn(TaskClass::Coordinator, coordinator.run(rx));

		Self {
			commands,
			initialized,
			policy,
		}
	}

	/// Returns every record in view order, or only those of `filter`'s region.
	///
	/// An unknown region yields an empty list.
	pub async fn get_filtered(&self, filter: Option<&str>) -> Result<Vec<S::Record>> {
		let view = self.resolve().await?;
		Ok(match filter {
			None => view.chapters().to_vec(),
			Some(region) => view.region(region).to_vec(),
		})
	}

	/// Returns the distinct regions in view order.
	pub async fn get_filters(&self) -> Result<Vec<String>> {
		let view = self.resolve().await?;
		Ok(view.filters().map(str::to_owned).collect())
	}

	/// Returns the current view.
	pub async fn view(&self) -> Result<Arc<SortedView<S::Record>>> {
		self.resolve().await
	}

	/// Starts a new generation for `point`, cancelling the previous one.
	///
	/// Returns immediately; the computation proceeds in the background.
	pub fn on_reference_point_changed(&self, point: Option<GeoPoint>) {
		self.initialized.store(true, Ordering::Release);
		if self.commands.send(Command::PointChanged { point }).is_err() {
			tracing::warn!("repository.point_changed.closed");
		}
	}

	/// Whether a reference point has ever been supplied.
	pub fn is_initialized(&self) -> bool {
		self.initialized.load(Ordering::Acquire)
	}

	pub async fn status(&self) -> Result<RepositoryStatus> {
		let (reply, rx) = oneshot::channel();
		self.commands.send(Command::Status { reply }).map_err(|_| RepositoryError::Closed)?;
		rx.await.map_err(|_| RepositoryError::Closed)
	}

	/// Stops the coordinator and cancels the in-flight generation. Queries
	/// still waiting on it, and every later query, fail with
	/// [`RepositoryError::Closed`] whatever the [`SupersededPolicy`].
	pub fn shutdown(&self) {
		let _ = self.commands.send(Command::Shutdown);
	}

	async fn resolve(&self) -> Result<Arc<SortedView<S::Record>>> {
		loop {
			let (reply, rx) = oneshot::channel();
			self.commands.send(Command::Resolve { reply }).map_err(|_| RepositoryError::Closed)?;
			let waiter = rx.await.map_err(|_| RepositoryError::Closed)?;
			let generation = waiter.generation();

			match waiter.wait().await {
				FlightOutcome::Done(outcome) => return outcome,
				FlightOutcome::Cancelled => match self.policy {
					SupersededPolicy::Retarget => {
						tracing::trace!(generation, "repository.query.retarget");
					}
					SupersededPolicy::Report => return Err(RepositoryError::Cancelled { generation }),
				},
			}
		}
	}
}
