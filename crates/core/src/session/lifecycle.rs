//! Seam for the external base session-lifecycle collaborator.
//!
//! Match/session bookkeeping and all wire communication with the remote
//! comparison service live behind [`SessionLifecycle`]; this crate only
//! drives the open/check/close contract and interprets the results.

use std::time::Duration;

use async_trait::async_trait;

use argus_protocol::{MatchResult, RectangleSize, Region, SessionStartInfo, TestResults};
use argus_runtime::Result;

use crate::capture::Screenshot;

/// The base test-session lifecycle: open/check/close bookkeeping against
/// the remote matching service.
///
/// `check_window` receives the captured screenshot explicitly together with
/// the optional region scoping the comparison; `ignore_mismatch` is always
/// `false` for the checks issued by this layer. The remote service's own
/// match-retry loop is opaque here and bounded by `timeout`.
#[async_trait]
pub trait SessionLifecycle: Send + Sync {
	async fn open(
		&self,
		app_name: &str,
		test_name: &str,
		viewport: Option<RectangleSize>,
	) -> Result<()>;

	async fn check_window(
		&self,
		tag: &str,
		ignore_mismatch: bool,
		timeout: Duration,
		region: Option<Region>,
		screenshot: Screenshot,
	) -> Result<MatchResult>;

	async fn close(&self, throw_on_mismatch: bool) -> Result<TestResults>;

	/// Identifiers established at open, used to label mismatch errors.
	fn start_info(&self) -> SessionStartInfo;
}
