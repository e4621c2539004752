/// Execution classes used for task scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// The serialized coordination loop that owns shared state.
	Coordinator,
	/// Async I/O such as fetching records from a collaborator.
	Io,
	/// Async work driving one generation of derived data.
	Background,
	/// CPU-intensive blocking work executed on the blocking pool.
	CpuBlocking,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Coordinator => "coordinator",
			Self::Io => "io",
			Self::Background => "background",
			Self::CpuBlocking => "cpu_blocking",
		}
	}
}
