//! The coordinator actor.
//!
//! Owns the snapshot flight, the current generation and every decision about
//! whether work already exists. Commands arrive over one channel and are
//! handled strictly one at a time. The coordinator never awaits a fetch or a
//! sort: it hands out [`FlightWaiter`]s and callers wait on their own tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use nearby_geo::GeoPoint;
use nearby_view::{Located, SortedView};
use nearby_worker::{Executor, Flight, FlightOutcome, FlightWaiter, TaskClass};
use tokio::sync::{mpsc, oneshot};

use crate::config::RepositoryConfig;
use crate::error::{FetchError, RepositoryError};
use crate::repository::RepositoryStatus;
use crate::source::RecordSource;

/// Settled result of one fetch attempt.
type SnapshotOutcome<R> = Result<Arc<[R]>, FetchError>;

/// Settled result of one generation.
pub(crate) type ViewOutcome<R> = Result<Arc<SortedView<R>>, RepositoryError>;

pub(crate) enum Command<R> {
	/// Hand back a waiter for the current generation, starting one if needed.
	Resolve { reply: oneshot::Sender<FlightWaiter<ViewOutcome<R>>> },
	/// Supersede the current generation with one for `point`.
	PointChanged { point: Option<GeoPoint> },
	Status { reply: oneshot::Sender<RepositoryStatus> },
	Shutdown,
}

struct Generation<R> {
	point: Option<GeoPoint>,
	flight: Flight<ViewOutcome<R>>,
}

pub(crate) struct Coordinator<S: RecordSource> {
	source: Arc<S>,
	config: RepositoryConfig,
	executor: Executor,
	snapshot: Option<Flight<SnapshotOutcome<S::Record>>>,
	current: Option<Generation<S::Record>>,
	fetch_attempts: u64,
	computations: u64,
	queries: u64,
	initialized: Arc<AtomicBool>,
}

impl<S: RecordSource> Coordinator<S> {
	pub(crate) fn new(source: Arc<S>, config: RepositoryConfig, executor: Executor, initialized: Arc<AtomicBool>) -> Self {
		Self {
			source,
			config,
			executor,
			snapshot: None,
			current: None,
			fetch_attempts: 0,
			computations: 0,
			queries: 0,
			initialized,
		}
	}

	/// Runs until [`Command::Shutdown`] or until every sender is dropped.
	pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command<S::Record>>) {
		while let Some(cmd) = commands.recv().await {
			match cmd {
				Command::Resolve { reply } => {
					let _ = reply.send(self.resolve());
				}
				Command::PointChanged { point } => self.point_changed(point),
				Command::Status { reply } => {
					let _ = reply.send(self.status());
				}
				Command::Shutdown => break,
			}
		}

		// Waiters still bound to the current generation learn about the shutdown,
		// not about a supersession.
		if let Some(current) = self.current.take()
			&& current.flight.close(Err(RepositoryError::Closed))
		{
			tracing::debug!(generation = current.flight.generation(), "repository.generation.closed");
		}
		if let Some(snapshot) = self.snapshot.take() {
			snapshot.cancel();
		}
		tracing::debug!("repository.coordinator.stopped");
	}

	fn resolve(&mut self) -> FlightWaiter<ViewOutcome<S::Record>> {
		self.queries += 1;
		if let Some(generation) = &self.current
			&& reusable(&generation.flight)
		{
			return generation.flight.waiter();
		}
		// A failed generation is retried with the same point; a fresh fetch follows.
		let point = self.current.as_ref().and_then(|generation| generation.point);
		self.start(point)
	}

	fn point_changed(&mut self, point: Option<GeoPoint>) {
		if let Some(previous) = self.current.take()
			&& previous.flight.cancel()
		{
			tracing::debug!(generation = previous.flight.generation(), "repository.generation.cancelled");
		}
		self.start(point);
	}

	/// Starts the next generation. Generations are numbered from 1 in start
	/// order, so the current one is always the highest issued.
	fn start(&mut self, point: Option<GeoPoint>) -> FlightWaiter<ViewOutcome<S::Record>> {
		self.computations += 1;
		let generation = self.computations;
		let flight = Flight::new(generation);
		let snapshot = self.snapshot_waiter();
		tracing::debug!(generation, sorted = point.is_some(), "repository.generation.start");

		let work = compute_generation(self.executor.clone(), flight.clone(), snapshot, point, self.config.blocking_threshold);
		self.executor.drive(TaskClass::Background, flight.clone(), work);
		let waiter = flight.waiter();
		self.current = Some(Generation { point, flight });
		waiter
	}

	/// Returns a waiter on the snapshot, starting a fetch unless one is in
	/// flight or has already succeeded.
	fn snapshot_waiter(&mut self) -> FlightWaiter<SnapshotOutcome<S::Record>> {
		let flight = match self.snapshot.take() {
			Some(flight) if reusable(&flight) => flight,
			_ => self.start_fetch(),
		};
		let waiter = flight.waiter();
		self.snapshot = Some(flight);
		waiter
	}

	fn start_fetch(&mut self) -> Flight<SnapshotOutcome<S::Record>> {
		self.fetch_attempts += 1;
		let flight = Flight::new(self.fetch_attempts);
		self.executor
			.drive(TaskClass::Io, flight.clone(), fetch_snapshot(Arc::clone(&self.source), self.fetch_attempts));
		flight
	}

	fn status(&self) -> RepositoryStatus {
		RepositoryStatus {
			generation: self.current.as_ref().map(|generation| generation.flight.generation()),
			pending: self.current.as_ref().is_some_and(|generation| generation.flight.is_pending()),
			snapshot_cached: self.snapshot.as_ref().is_some_and(|flight| !flight.is_pending() && reusable(flight)),
			fetch_attempts: self.fetch_attempts,
			computations: self.computations,
			queries: self.queries,
			initialized: self.initialized.load(Ordering::Acquire),
		}
	}
}

/// A flight can be shared while pending or after success. Failed and
/// cancelled flights are replaced.
fn reusable<T: Clone, E: Clone>(flight: &Flight<Result<T, E>>) -> bool {
	matches!(flight.peek(), None | Some(FlightOutcome::Done(Ok(_))))
}

/// One fetch attempt. Not tied to any generation: superseding a generation
/// leaves the fetch running for its successor.
async fn fetch_snapshot<S: RecordSource>(source: Arc<S>, attempt: u64) -> SnapshotOutcome<S::Record> {
	tracing::debug!(attempt, "repository.fetch.start");
	match source.fetch_all().await {
		Ok(records) => {
			tracing::debug!(attempt, records = records.len(), "repository.fetch.done");
			Ok(Arc::from(records))
		}
		Err(err) => {
			tracing::warn!(attempt, error = %err, "repository.fetch.failed");
			Err(err)
		}
	}
}

/// One generation: waits for the snapshot and sorts it around `point`.
///
/// The executor stops this as soon as `flight` is cancelled, and drops the
/// result of a sort that was already running on the blocking pool.
async fn compute_generation<R>(
	executor: Executor,
	flight: Flight<ViewOutcome<R>>,
	snapshot: FlightWaiter<SnapshotOutcome<R>>,
	point: Option<GeoPoint>,
	blocking_threshold: usize,
) -> ViewOutcome<R>
where
	R: Located + Clone + Send + Sync + 'static,
{
	let generation = flight.generation();
	let records = match snapshot.wait().await {
		FlightOutcome::Done(Ok(records)) => records,
		FlightOutcome::Done(Err(err)) => return Err(RepositoryError::Fetch(err)),
		FlightOutcome::Cancelled => {
			return Err(RepositoryError::Fetch(FetchError::Other("fetch attempt was abandoned".to_owned())));
		}
	};

	let started = Instant::now();
	let view = if records.len() >= blocking_threshold {
		match executor.spawn_blocking(&flight, move || SortedView::compute(&records, point)).await {
			Ok(Some(view)) => view,
			// Cancelled before the sort began; the flight is already settled.
			Ok(None) => return Err(RepositoryError::Cancelled { generation }),
			Err(err) => {
				tracing::error!(generation, error = %err, "repository.generation.join_failed");
				return Err(RepositoryError::Computation(err.to_string()));
			}
		}
	} else {
		SortedView::compute(&records, point)
	};

	tracing::debug!(
		generation,
		chapters = view.len(),
		elapsed_us = started.elapsed().as_micros() as u64,
		"repository.generation.sorted"
	);
	Ok(Arc::new(view))
}
