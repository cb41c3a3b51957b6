/// Shared execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// One-shot setup work run before any invocation is accepted.
	Setup,
	/// A single handler invocation requested by the host.
	Invocation,
	/// Blocking I/O work executed on the blocking pool.
	IoBlocking,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Setup => "setup",
			Self::Invocation => "invocation",
			Self::IoBlocking => "io_blocking",
		}
	}
}
