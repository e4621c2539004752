//! Where flights run.
//!
//! An [`Executor`] pins a repository's tasks to one runtime, chosen when the
//! repository is built: the ambient one, or a shared fallback runtime when the
//! caller has none. Its helpers tie spawned work to a [`Flight`], so the task
//! stops once the flight is cancelled and a late result never lands.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::{Flight, TaskClass};

const FALLBACK_THREAD_NAME: &str = "nearby-fallback";

/// Spawns coordinator, fetch and sort tasks on one runtime.
#[derive(Debug, Clone)]
pub struct Executor {
	handle: Handle,
}

impl Executor {
	/// Uses the runtime the caller is running on, or the process-wide fallback
	/// runtime when there is none.
	pub fn ambient() -> Self {
		let handle = Handle::try_current().unwrap_or_else(|_| fallback().handle().clone());
		Self { handle }
	}

	/// Spawns a free-standing task.
	pub fn spawn<F>(&self, class: TaskClass, fut: F) -> JoinHandle<F::Output>
	where
		F: Future + Send + 'static,
		F::Output: Send + 'static,
	{
		tracing::trace!(worker_class = class.as_str(), "worker.spawn");
		self.handle.spawn(fut)
	}

	/// Runs `work` and settles `flight` with its output.
	///
	/// The task gives up as soon as the flight is cancelled. If it is dropped
	/// or panics before settling, the flight settles as cancelled. The handle
	/// resolves to whether this task's value was the one stored.
	pub fn drive<T, F>(&self, class: TaskClass, flight: Flight<T>, work: F) -> JoinHandle<bool>
	where
		T: Send + Sync + 'static,
		F: Future<Output = T> + Send + 'static,
	{
		let flight = flight.guard();
		self.spawn(class, async move {
			let value = tokio::select! {
				biased;
				_ = flight.cancelled() => return false,
				value = work => value,
			};
			let stored = flight.complete(value);
			if !stored {
				tracing::trace!(worker_class = class.as_str(), generation = flight.generation(), "worker.flight.discarded");
			}
			stored
		})
	}

	/// Runs `f` on the blocking pool on behalf of `flight`.
	///
	/// Resolves to `None` without running `f` when the flight was cancelled
	/// before a blocking thread picked the job up.
	pub fn spawn_blocking<T, F, R>(&self, flight: &Flight<T>, f: F) -> JoinHandle<Option<R>>
	where
		F: FnOnce() -> R + Send + 'static,
		R: Send + 'static,
	{
		let token = flight.child_token();
		let generation = flight.generation();
		tracing::trace!(worker_class = TaskClass::CpuBlocking.as_str(), generation, "worker.spawn_blocking");
		self.handle.spawn_blocking(move || {
			if token.is_cancelled() {
				tracing::trace!(generation, "worker.blocking.skipped");
				return None;
			}
			Some(f())
		})
	}
}

fn fallback() -> &'static Runtime {
	static FALLBACK: OnceLock<Runtime> = OnceLock::new();
	FALLBACK.get_or_init(|| {
		Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name(FALLBACK_THREAD_NAME)
			.build()
			.expect("failed to build the nearby fallback runtime")
	})
}
