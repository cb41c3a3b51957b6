//! Modules the setup routine pulled in, for the host's file watcher.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

/// Ordered, de-duplicated record of required module paths.
#[derive(Debug, Default, Clone)]
pub struct RequireLog {
	framework_root: Option<PathBuf>,
	paths: IndexSet<PathBuf>,
}

impl RequireLog {
	/// Creates a log that ignores everything below `framework_root`.
	pub fn new(framework_root: Option<PathBuf>) -> Self {
		Self {
			framework_root,
			paths: IndexSet::new(),
		}
	}

	/// Records one path. Returns `false` when it was skipped or already known.
	pub fn record(&mut self, path: impl AsRef<Path>) -> bool {
		let path = path.as_ref();
		if self.framework_root.as_deref().is_some_and(|root| path.starts_with(root)) {
			tracing::trace!(path = %path.display(), "requires.skip_framework");
			return false;
		}
		self.paths.insert(path.to_path_buf())
	}

	/// Recorded paths in first-seen order, as display strings.
	pub fn to_strings(&self) -> Vec<String> {
		self.paths.iter().map(|p| p.display().to_string()).collect()
	}

	/// Number of recorded paths.
	pub fn len(&self) -> usize {
		self.paths.len()
	}

	/// True when nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}
}
