//! Session configuration surface.
//!
//! These types carry the knobs a test author can set before `open`:
//! the remote endpoint, capture behavior (full-page stitching, scrollbar
//! hiding, forced rotation), and how mismatches are reported.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default endpoint of the built-in remote matching service.
pub const DEFAULT_SERVER_URL: &str = "https://argus-api.example.com";

/// Default bound on how long the remote comparison may retry before
/// reporting a mismatch.
pub const DEFAULT_MATCH_TIMEOUT_MS: u64 = 2000;

/// How full-page captures move the page between increments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StitchMode {
	/// Actually scroll the DOM between captures.
	#[default]
	Scroll,
	/// Apply a CSS translate offset instead of scrolling.
	Css,
}

/// When a visual mismatch is surfaced to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureReport {
	/// Raise an error from the check call that observed the mismatch.
	Immediate,
	/// Accumulate and report from `close`.
	#[default]
	OnClose,
}

/// A forced-rotation value the raster pipeline cannot apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("forced rotation must be a multiple of 90 degrees, got {0}")]
pub struct InvalidRotation(pub i32);

/// Configuration for one visual-testing session.
///
/// Deserializable so the whole surface can come from a config file; the
/// typed setters are for programmatic use before `open`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
	/// Remote matching service endpoint.
	pub server_url: String,

	/// Bypass all interception and check logic, passing calls straight to
	/// the driver.
	pub is_disabled: bool,

	/// Stitch scrolled captures into one full-page image on every check.
	pub force_full_page_screenshot: bool,

	/// Hide scrollbars (`overflow: hidden`) while capturing.
	pub hide_scrollbars: bool,

	/// Strategy used to move the page between stitch increments.
	pub stitch_mode: StitchMode,

	/// Explicit image rotation in degrees; overrides automatic inference.
	pub forced_rotation: Option<i32>,

	/// When mismatches are surfaced.
	pub failure_report: FailureReport,

	/// Bound on the remote comparison's retry loop, in milliseconds.
	pub match_timeout_ms: u64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			server_url: DEFAULT_SERVER_URL.to_string(),
			is_disabled: false,
			force_full_page_screenshot: false,
			hide_scrollbars: false,
			stitch_mode: StitchMode::default(),
			forced_rotation: None,
			failure_report: FailureReport::default(),
			match_timeout_ms: DEFAULT_MATCH_TIMEOUT_MS,
		}
	}
}

impl SessionConfig {
	/// Creates the default configuration pointing at the built-in service.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the remote service endpoint.
	pub fn server_url(mut self, url: impl Into<String>) -> Self {
		self.server_url = url.into();
		self
	}

	/// Disables the session entirely.
	pub fn disabled(mut self, disabled: bool) -> Self {
		self.is_disabled = disabled;
		self
	}

	/// Sets a forced image rotation, normalized into `0..360`.
	///
	/// Rejects values that are not multiples of 90: the raster pipeline
	/// rotates in quarter turns.
	pub fn set_forced_rotation(&mut self, degrees: i32) -> Result<(), InvalidRotation> {
		if degrees % 90 != 0 {
			return Err(InvalidRotation(degrees));
		}
		self.forced_rotation = Some(degrees.rem_euclid(360));
		Ok(())
	}

	/// The match timeout as a [`Duration`].
	pub fn match_timeout(&self) -> Duration {
		Duration::from_millis(self.match_timeout_ms)
	}
}
