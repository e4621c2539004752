//! Settled-once result slots.
//!
//! A [`Flight`] starts pending and is settled exactly once, either with a value
//! ([`Flight::complete`]) or as cancelled ([`Flight::cancel`]). Settling goes
//! through the channel's own lock, so a value and a cancellation can never both
//! win: whichever lands first is what every waiter observes.
//!
//! Each flight carries the generation it was issued for and a cancellation
//! token. The token is only ever cancelled after the slot is settled, so work
//! that observes cancellation can stop without settling anything itself.

use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

#[derive(Debug)]
enum FlightState<T> {
	Pending,
	Done(T),
	Cancelled,
}

/// Settled outcome of a flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightOutcome<T> {
	Done(T),
	Cancelled,
}

/// Shared, settled-once result slot bound to one generation.
#[derive(Debug)]
pub struct Flight<T> {
	tx: Arc<watch::Sender<FlightState<T>>>,
	generation: u64,
	cancel: CancellationToken,
}

impl<T> Clone for Flight<T> {
	fn clone(&self) -> Self {
		Self {
			tx: Arc::clone(&self.tx),
			generation: self.generation,
			cancel: self.cancel.clone(),
		}
	}
}

impl<T> Flight<T> {
	/// Creates a pending flight for `generation`.
	pub fn new(generation: u64) -> Self {
		let (tx, _) = watch::channel(FlightState::Pending);
		Self {
			tx: Arc::new(tx),
			generation,
			cancel: CancellationToken::new(),
		}
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Resolves once the work behind this flight is told to stop.
	pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
		self.cancel.cancelled()
	}

	/// Token for work spawned on behalf of this flight. Cancelled with the
	/// flight; cancelling it does not touch the flight.
	pub fn child_token(&self) -> CancellationToken {
		self.cancel.child_token()
	}

	pub fn is_pending(&self) -> bool {
		matches!(*self.tx.borrow(), FlightState::Pending)
	}

	/// Settles the flight with `value`. Returns `false` if it was already
	/// settled, in which case `value` is dropped.
	pub fn complete(&self, value: T) -> bool {
		self.tx.send_if_modified(|state| {
			if !matches!(state, FlightState::Pending) {
				return false;
			}
			*state = FlightState::Done(value);
			true
		})
	}

	/// Settles the flight as cancelled and stops its work. Returns `false`
	/// if it was already settled; the work is stopped either way.
	pub fn cancel(&self) -> bool {
		let settled = self.tx.send_if_modified(|state| {
			if !matches!(state, FlightState::Pending) {
				return false;
			}
			*state = FlightState::Cancelled;
			true
		});
		self.cancel.cancel();
		settled
	}

	/// Settles a still-pending flight with `value`, then stops its work.
	/// Waiters see `value` rather than a cancellation.
	pub fn close(&self, value: T) -> bool {
		let settled = self.complete(value);
		self.cancel.cancel();
		settled
	}

	/// Returns a waiter for this flight's outcome.
	pub fn waiter(&self) -> FlightWaiter<T> {
		FlightWaiter {
			generation: self.generation(),
			rx: self.tx.subscribe(),
		}
	}

	/// Wraps this handle so that dropping it settles a still-pending flight as
	/// cancelled. Used by the task that owns the computation.
	pub fn guard(self) -> FlightGuard<T> {
		FlightGuard { flight: self }
	}
}

impl<T: Clone> Flight<T> {
	/// Returns the settled outcome, or `None` while pending.
	pub fn peek(&self) -> Option<FlightOutcome<T>> {
		match &*self.tx.borrow() {
			FlightState::Pending => None,
			FlightState::Done(value) => Some(FlightOutcome::Done(value.clone())),
			FlightState::Cancelled => Some(FlightOutcome::Cancelled),
		}
	}
}

/// Waits for one flight to settle.
#[derive(Debug)]
pub struct FlightWaiter<T> {
	generation: u64,
	rx: watch::Receiver<FlightState<T>>,
}

impl<T: Clone> FlightWaiter<T> {
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Resolves once the flight settles. A flight whose every handle was
	/// dropped while pending resolves as cancelled.
	pub async fn wait(mut self) -> FlightOutcome<T> {
		match self.rx.wait_for(|state| !matches!(state, FlightState::Pending)).await {
			Ok(state) => match &*state {
				FlightState::Done(value) => FlightOutcome::Done(value.clone()),
				_ => FlightOutcome::Cancelled,
			},
			Err(_) => FlightOutcome::Cancelled,
		}
	}
}

/// Owner handle that cancels a still-pending flight on drop.
#[derive(Debug)]
pub struct FlightGuard<T> {
	flight: Flight<T>,
}

impl<T> Deref for FlightGuard<T> {
	type Target = Flight<T>;

	fn deref(&self) -> &Flight<T> {
		&self.flight
	}
}

impl<T> Drop for FlightGuard<T> {
	fn drop(&mut self) {
		if self.flight.cancel() {
			tracing::debug!(generation = self.flight.generation(), "worker.flight.abandoned");
		}
	}
}
