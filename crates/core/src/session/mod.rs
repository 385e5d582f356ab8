//! The session façade test authors drive.
//!
//! A [`Session`] owns one [`ControlFlow`]; every visual check and the
//! close are enqueued there, so their ordering relative to ordinary driver
//! commands is the queue order. Element proxies are handed out by the
//! explicit [`element`](Session::element) / [`elements`](Session::elements)
//! factories rather than by replacing any global locator entry point.

mod lifecycle;
mod state;

pub use lifecycle::SessionLifecycle;
pub use state::SessionState;

use std::sync::Arc;
use std::time::Duration;

use argus_protocol::{
	FailureReport, MatchResult, RectangleSize, Region, SessionConfig, StitchMode, TestResults,
};
use argus_runtime::{Capabilities, ControlFlow, Driver, Error, Locator, Result};

use crate::capture::ScreenshotTaker;
use crate::element::{ElementCollection, ElementFinder, InteractionEvent, InteractionSink};

/// Strictly sequential per-instance lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Uninitialized,
	Opened,
	Closed,
}

/// Where the region for a check comes from.
enum RegionSource {
	Whole,
	Fixed(Region),
	Element(ElementFinder),
	Locator(Locator),
}

/// Sink used by disabled sessions: interception is bypassed entirely.
struct NoopSink;

impl InteractionSink for NoopSink {
	fn on_interaction(&self, _event: InteractionEvent) {}
}

/// A visual-testing session over one automation driver.
///
/// Lifecycle: `open` must be the first call and may run once; checks are
/// valid only while opened; `close` finalizes. A disabled session accepts
/// every call and succeeds trivially without touching the driver or the
/// remote service.
pub struct Session {
	config: SessionConfig,
	lifecycle: Arc<dyn SessionLifecycle>,
	state: Arc<SessionState>,
	phase: Phase,
	flow: Option<ControlFlow>,
	driver: Option<Arc<dyn Driver>>,
	viewport: Option<RectangleSize>,
	capabilities: Capabilities,
}

impl Session {
	/// Creates an unopened session delegating match/session bookkeeping to
	/// `lifecycle`.
	pub fn new(config: SessionConfig, lifecycle: Arc<dyn SessionLifecycle>) -> Self {
		Self {
			config,
			lifecycle,
			state: Arc::new(SessionState::new()),
			phase: Phase::Uninitialized,
			flow: None,
			driver: None,
			viewport: None,
			capabilities: Capabilities::default(),
		}
	}

	/// The session configuration as currently set.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// The most recent interaction a proxy reported, if any.
	pub fn last_interaction(&self) -> Option<InteractionEvent> {
		self.state.last_interaction()
	}

	/// Shared handle to the per-session state the proxies report into.
	pub fn state(&self) -> Arc<SessionState> {
		self.state.clone()
	}

	/// Sets when mismatches are surfaced.
	pub fn set_failure_report(&mut self, mode: FailureReport) {
		self.config.failure_report = mode;
	}

	/// Enables or disables full-page stitching for every check.
	pub fn set_force_full_page_screenshot(&mut self, force: bool) {
		self.config.force_full_page_screenshot = force;
	}

	/// Selects the stitch strategy.
	pub fn set_stitch_mode(&mut self, mode: StitchMode) {
		self.config.stitch_mode = mode;
	}

	/// Hides scrollbars while capturing.
	pub fn set_hide_scrollbars(&mut self, hide: bool) {
		self.config.hide_scrollbars = hide;
	}

	/// Sets an explicit rotation, disabling automatic inference.
	///
	/// Rejected synchronously for values the raster pipeline cannot apply;
	/// no queued operation is affected by an invalid call.
	pub fn set_forced_rotation(&mut self, degrees: i32) -> Result<()> {
		self.config
			.set_forced_rotation(degrees)
			.map_err(|e| Error::InvalidConfig(e.to_string()))
	}

	/// Sets the bound on the remote comparison's retry loop.
	pub fn set_match_timeout(&mut self, timeout: Duration) {
		self.config.match_timeout_ms = timeout.as_millis() as u64;
	}

	/// Opens the session: captures the driver, reads its capabilities,
	/// applies the requested viewport size, and delegates to the base
	/// lifecycle, all through the control-flow queue.
	pub async fn open(
		&mut self,
		driver: Arc<dyn Driver>,
		app_name: &str,
		test_name: &str,
		viewport: Option<RectangleSize>,
	) -> Result<()> {
		if self.phase != Phase::Uninitialized {
			return Err(Error::IllegalState(format!(
				"open may only be the first call on a session (phase: {:?})",
				self.phase
			)));
		}

		let flow = ControlFlow::new();
		self.driver = Some(driver.clone());
		self.flow = Some(flow.clone());

		if self.config.is_disabled {
			tracing::debug!("session disabled, open is a no-op");
			flow.execute(async { Ok(()) }).await?;
			self.phase = Phase::Opened;
			return Ok(());
		}

		let lifecycle = self.lifecycle.clone();
		let app_name = app_name.to_string();
		let test_name = test_name.to_string();

		let (capabilities, effective_viewport) = flow
			.execute(async move {
				let capabilities = driver.capabilities().await?;

				let effective_viewport = match viewport {
					Some(size) => {
						driver.set_viewport_size(size).await?;
						size
					}
					None => driver.viewport_size().await?,
				};

				lifecycle.open(&app_name, &test_name, Some(effective_viewport)).await?;
				Ok((capabilities, effective_viewport))
			})
			.await?;

		tracing::info!(viewport = %effective_viewport, "session opened");
		self.capabilities = capabilities;
		self.viewport = Some(effective_viewport);
		self.phase = Phase::Opened;
		Ok(())
	}

	/// Lazy finder for the first element matching `locator`.
	///
	/// Every value reachable through the returned proxy is itself wrapped.
	pub fn element(&self, locator: Locator) -> Result<ElementFinder> {
		Ok(ElementFinder::root(self.opened_driver()?, self.sink(), locator))
	}

	/// Lazy collection of all elements matching `locator`.
	pub fn elements(&self, locator: Locator) -> Result<ElementCollection> {
		Ok(ElementCollection::root(self.opened_driver()?, self.sink(), locator))
	}

	/// Checks the full window against the baseline.
	pub async fn check_window(
		&mut self,
		tag: &str,
		match_timeout: Option<Duration>,
	) -> Result<MatchResult> {
		self.perform_check(tag, match_timeout, RegionSource::Whole).await
	}

	/// Checks the given region. The region is forwarded as supplied;
	/// callers provide absolute page regions here.
	pub async fn check_region(
		&mut self,
		region: Region,
		tag: &str,
		match_timeout: Option<Duration>,
	) -> Result<MatchResult> {
		self.perform_check(tag, match_timeout, RegionSource::Fixed(region)).await
	}

	/// Checks the region occupied by the finder's element, resolved at
	/// check time inside the queue.
	pub async fn check_region_by_element(
		&mut self,
		element: &ElementFinder,
		tag: &str,
		match_timeout: Option<Duration>,
	) -> Result<MatchResult> {
		self.perform_check(tag, match_timeout, RegionSource::Element(element.clone())).await
	}

	/// Checks the region occupied by the first element matching `locator`.
	pub async fn check_region_by(
		&mut self,
		locator: Locator,
		tag: &str,
		match_timeout: Option<Duration>,
	) -> Result<MatchResult> {
		self.perform_check(tag, match_timeout, RegionSource::Locator(locator)).await
	}

	async fn perform_check(
		&mut self,
		tag: &str,
		match_timeout: Option<Duration>,
		source: RegionSource,
	) -> Result<MatchResult> {
		if self.config.is_disabled {
			tracing::debug!(tag, "session disabled, check is a no-op");
			return Ok(MatchResult::disabled());
		}
		if self.phase != Phase::Opened {
			return Err(Error::IllegalState(format!(
				"check '{tag}' requires an opened session (phase: {:?})",
				self.phase
			)));
		}

		let flow = self.flow.clone().ok_or(Error::FlowTerminated)?;
		let driver = self.opened_driver()?;
		let lifecycle = self.lifecycle.clone();
		let timeout = match_timeout.unwrap_or_else(|| self.config.match_timeout());
		let viewport = self.viewport;
		let capabilities = self.capabilities.clone();
		let config = self.config.clone();
		let tag_owned = tag.to_string();

		let result = flow
			.execute(async move {
				let region = match source {
					RegionSource::Whole => None,
					RegionSource::Fixed(region) => Some(region),
					RegionSource::Element(finder) => Some(finder.resolve().await?.region().await?),
					RegionSource::Locator(locator) => {
						let handle = driver.find_element(&locator).await?;
						let location = handle.location().await?;
						let size = handle.size().await?;
						Some(Region::from_element(location, size))
					}
				};

				let viewport = match viewport {
					Some(size) => size,
					None => driver.viewport_size().await?,
				};

				let taker = ScreenshotTaker::new(
					driver.clone(),
					viewport,
					config.force_full_page_screenshot,
					config.stitch_mode,
					config.hide_scrollbars,
					config.forced_rotation,
					&capabilities,
				);
				let screenshot = taker.take().await?;

				lifecycle.check_window(&tag_owned, false, timeout, region, screenshot).await
			})
			.await?;

		if !result.as_expected && self.config.failure_report == FailureReport::Immediate {
			let info = self.lifecycle.start_info();
			return Err(Error::VisualMismatch {
				tag: Some(tag.to_string()),
				scenario: info.scenario_id_or_name,
				app: info.app_id_or_name,
			});
		}

		Ok(result)
	}

	/// Closes the session and aggregates results.
	///
	/// Raises [`Error::TestFailed`] only when `throw_on_mismatch` is set
	/// and the session did not pass; the session transitions to closed
	/// either way.
	pub async fn close(&mut self, throw_on_mismatch: bool) -> Result<TestResults> {
		if self.config.is_disabled {
			self.phase = Phase::Closed;
			return Ok(TestResults::disabled());
		}
		if self.phase != Phase::Opened {
			return Err(Error::IllegalState(format!(
				"close requires an opened session (phase: {:?})",
				self.phase
			)));
		}

		let flow = self.flow.clone().ok_or(Error::FlowTerminated)?;
		let lifecycle = self.lifecycle.clone();

		let outcome = flow.execute(async move { lifecycle.close(false).await }).await;

		self.phase = Phase::Closed;
		self.state.reset();
		let results = outcome?;

		if results.is_passed || !throw_on_mismatch {
			return Ok(results);
		}

		let info = self.lifecycle.start_info();
		Err(Error::TestFailed {
			scenario: info.scenario_id_or_name,
			app: info.app_id_or_name,
			mismatches: results.mismatches,
		})
	}

	/// Queue-scheduled delay: orders with every other enqueued operation.
	pub async fn wait(&self, ms: u64) -> Result<()> {
		let flow = self.flow.clone().ok_or_else(|| {
			Error::IllegalState("wait requires an opened session".to_string())
		})?;
		flow.timeout(ms).await
	}

	/// The page title, straight from the driver.
	pub async fn title(&self) -> Result<String> {
		self.opened_driver()?.title().await
	}

	/// The environment string reported to the matcher:
	/// `"useragent:" + navigator.userAgent`, or the bare prefix when the
	/// script fails.
	pub async fn inferred_environment(&self) -> Result<String> {
		let driver = self.opened_driver()?;
		let agent = driver.execute_script("return navigator.userAgent;").await;
		Ok(match agent {
			Ok(value) => format!("useragent:{}", value.as_str().unwrap_or_default()),
			Err(_) => "useragent:".to_string(),
		})
	}

	/// The driver's logical viewport size.
	pub async fn viewport_size(&self) -> Result<RectangleSize> {
		self.opened_driver()?.viewport_size().await
	}

	/// Resizes the driver's viewport.
	pub async fn set_viewport_size(&mut self, size: RectangleSize) -> Result<()> {
		self.opened_driver()?.set_viewport_size(size).await?;
		self.viewport = Some(size);
		Ok(())
	}

	fn opened_driver(&self) -> Result<Arc<dyn Driver>> {
		match (&self.phase, &self.driver) {
			(Phase::Opened, Some(driver)) => Ok(driver.clone()),
			_ => Err(Error::IllegalState(format!(
				"operation requires an opened session (phase: {:?})",
				self.phase
			))),
		}
	}

	fn sink(&self) -> Arc<dyn InteractionSink> {
		if self.config.is_disabled {
			Arc::new(NoopSink)
		} else {
			self.state.clone()
		}
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("phase", &self.phase)
			.field("disabled", &self.config.is_disabled)
			.field("viewport", &self.viewport)
			.finish_non_exhaustive()
	}
}
