//! Result types exchanged with the base session-lifecycle collaborator.

use serde::{Deserialize, Serialize};

/// Outcome of a single check against the remote matcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
	/// Whether the captured state matched the baseline.
	pub as_expected: bool,

	/// Identifier of the matched step window, when the service assigns one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub window_id: Option<String>,
}

impl MatchResult {
	/// The trivial success returned by disabled sessions without contacting
	/// the driver or the remote service.
	pub fn disabled() -> Self {
		Self { as_expected: true, window_id: None }
	}
}

/// Aggregate outcome of a closed session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
	pub is_passed: bool,
	pub steps: u32,
	pub matches: u32,
	pub mismatches: u32,
	pub missing: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

impl TestResults {
	/// The trivial passed result returned by disabled sessions.
	pub fn disabled() -> Self {
		Self { is_passed: true, ..Self::default() }
	}
}

/// Identifiers established when the session was started, used to label
/// mismatch errors for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartInfo {
	pub app_id_or_name: String,
	pub scenario_id_or_name: String,
}
