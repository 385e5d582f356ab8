//! Error types for the argus runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the argus stack.
///
/// Driver failures are carried through unchanged; the proxy layer adds no
/// error kinds of its own.
#[derive(Debug, Error)]
pub enum Error {
	/// Failure raised by the underlying automation driver (stale element,
	/// element not interactable, navigation failure, script error).
	#[error("{name}: {message}")]
	Driver {
		/// Driver-defined error name (e.g. "StaleElementReference").
		name: String,
		/// Human-readable message from the driver.
		message: String,
	},

	/// No element matched the locator at resolution time.
	#[error("Element not found: {0}")]
	ElementNotFound(String),

	/// Operation invoked outside its allowed session phase.
	#[error("Illegal session state: {0}")]
	IllegalState(String),

	/// Invalid configuration value, rejected synchronously at the setter.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	/// The visual state did not match the baseline and failure reporting is
	/// immediate.
	#[error("Visual mismatch in '{scenario}' of '{app}'{}", tag.as_deref().map(|t| format!(" at step '{t}'")).unwrap_or_default())]
	VisualMismatch {
		/// Tag of the check that observed the mismatch, if any.
		tag: Option<String>,
		/// Scenario identifier from the session start info.
		scenario: String,
		/// Application identifier from the session start info.
		app: String,
	},

	/// The session closed with accumulated mismatches.
	#[error("Test '{scenario}' of '{app}' failed with {mismatches} mismatch(es)")]
	TestFailed {
		scenario: String,
		app: String,
		mismatches: u32,
	},

	/// Raster decode, scale, rotate, or composite failure.
	#[error("Image processing error: {0}")]
	ImageProcessing(String),

	/// The control-flow worker is gone; no further tasks can run.
	#[error("Control flow terminated")]
	FlowTerminated,

	/// Timeout waiting for an operation.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Shorthand for a driver-side failure.
	pub fn driver(name: impl Into<String>, message: impl Into<String>) -> Self {
		Error::Driver { name: name.into(), message: message.into() }
	}

	/// Returns true for mismatch outcomes (immediate or at close).
	pub fn is_mismatch(&self) -> bool {
		matches!(self, Error::VisualMismatch { .. } | Error::TestFailed { .. })
	}

	/// Returns true for session state-machine violations.
	pub fn is_illegal_state(&self) -> bool {
		matches!(self, Error::IllegalState(_))
	}
}
