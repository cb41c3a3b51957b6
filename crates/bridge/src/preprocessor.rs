//! Default `file:preprocessor` handler, installed when setup registers none.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tether_worker::TaskClass;

use crate::handler::{HandlerFn, handler};

/// Location of the type checker inside a project, relative to its root.
pub const TYPESCRIPT_ENTRY: &str = "node_modules/typescript/lib/typescript.js";

/// Builds the preprocessor used when the user did not register one.
#[async_trait]
pub trait PreprocessorFactory: Send + Sync {
	/// Creates the handler for `project_root`.
	async fn create(&self, project_root: &Path) -> anyhow::Result<HandlerFn>;
}

/// Looks for a project-local type checker without blocking the runtime.
pub async fn resolve_typescript(project_root: &Path) -> anyhow::Result<Option<PathBuf>> {
	let candidate = project_root.join(TYPESCRIPT_ENTRY);
	let found = tether_worker::spawn_blocking(TaskClass::IoBlocking, move || candidate.is_file().then_some(candidate))
		.await
		.context("type checker lookup was cancelled")?;
	tracing::debug!(typescript = ?found, "preprocessor.resolve_typescript");
	Ok(found)
}

/// Pass-through preprocessor.
///
/// Bundling is the host's job; this handler answers with the output path
/// the host asked for, or the source path when none was given.
#[derive(Debug, Clone, Default)]
pub struct BundlerPreprocessor {
	typescript: Option<PathBuf>,
}

impl BundlerPreprocessor {
	/// Creates the preprocessor with an optional type checker path.
	pub fn new(typescript: Option<PathBuf>) -> Self {
		Self { typescript }
	}

	/// Type checker the preprocessor was built with.
	pub fn typescript(&self) -> Option<&Path> {
		self.typescript.as_deref()
	}

	/// Turns the preprocessor into a registrable handler.
	pub fn into_handler(self) -> HandlerFn {
		handler(move |args: Vec<Value>| {
			let typescript = self.typescript.clone();
			async move {
				let file = args.first().context("file:preprocessor expects a file argument")?;
				let file_path = file
					.get("filePath")
					.and_then(Value::as_str)
					.context("file:preprocessor file is missing `filePath`")?;
				let output = file.get("outputPath").and_then(Value::as_str).unwrap_or(file_path);
				tracing::trace!(file_path, output, typescript = ?typescript, "preprocessor.bundle");
				Ok(Some(Value::String(output.to_string())))
			}
		})
	}
}

/// Resolves the type checker from the project root, then builds a
/// [`BundlerPreprocessor`] with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPreprocessorFactory;

#[async_trait]
impl PreprocessorFactory for DefaultPreprocessorFactory {
	async fn create(&self, project_root: &Path) -> anyhow::Result<HandlerFn> {
		let typescript = resolve_typescript(project_root).await?;
		Ok(BundlerPreprocessor::new(typescript).into_handler())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn typescript_is_found_only_when_installed() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(resolve_typescript(dir.path()).await.unwrap(), None);

		let entry = dir.path().join(TYPESCRIPT_ENTRY);
		std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
		std::fs::write(&entry, "").unwrap();
		assert_eq!(resolve_typescript(dir.path()).await.unwrap(), Some(entry));
	}

	#[tokio::test]
	async fn answers_with_output_path_then_file_path() {
		let preprocess = BundlerPreprocessor::default().into_handler();
		let out = preprocess(vec![json!({ "filePath": "/app/spec.ts", "outputPath": "/tmp/spec.js" })])
			.await
			.unwrap();
		assert_eq!(out, Some(json!("/tmp/spec.js")));

		let out = preprocess(vec![json!({ "filePath": "/app/spec.ts" })]).await.unwrap();
		assert_eq!(out, Some(json!("/app/spec.ts")));
	}

	#[tokio::test]
	async fn missing_file_path_is_an_error() {
		let preprocess = BundlerPreprocessor::default().into_handler();
		let err = preprocess(vec![json!({})]).await.unwrap_err();
		assert!(err.to_string().contains("filePath"));
	}
}
