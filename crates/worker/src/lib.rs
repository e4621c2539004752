//! Worker primitives shared by the coordination core.
//!
//! * [`Flight`] is a settled-once result slot that many waiters can share. It
//!   carries its generation and the cancellation token for the work behind it.
//! * [`Executor`] runs that work on the repository's runtime, tagged with a
//!   [`TaskClass`], and settles the flight with the result.

mod class;
mod executor;
mod flight;

pub use class::TaskClass;
pub use executor::Executor;
pub use flight::{Flight, FlightGuard, FlightOutcome, FlightWaiter};
