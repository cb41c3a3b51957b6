//! Identifier allocation shared by bridge components.

/// Simple counter-based ID generator.
///
/// IDs start at 0, increase by one per call and are never handed out twice
/// by the same generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct CounterIdGen(pub u64);

impl CounterIdGen {
	/// Creates a new counter starting at 0.
	#[must_use]
	pub const fn new() -> Self {
		Self(0)
	}

	/// Generates the next unique ID and increments the counter.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&mut self) -> u64 {
		let id = self.0;
		self.0 += 1;
		id
	}

	/// Returns the ID the next call to [`Self::next`] will produce.
	#[must_use]
	pub const fn peek(&self) -> u64 {
		self.0
	}
}
