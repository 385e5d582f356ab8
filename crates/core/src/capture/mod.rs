//! Screenshot acquisition.
//!
//! Produces one normalized raster per check: raw capture or full-page
//! stitch, device-pixel-ratio correction, forced/automatic rotation, and
//! viewport-vs-full-page classification with the scroll offset recorded
//! for later region translation.

mod image;
pub(crate) mod stitch;

pub use self::image::{Screenshot, ScreenshotKind};

use std::sync::Arc;

use argus_protocol::{Location, RectangleSize, StitchMode};
use argus_runtime::{Capabilities, Driver, Result};

/// How far from 1.0 the normalization factor may stray before a rescale is
/// applied. A factor of exactly 0.5 (the common retina case) bypasses this
/// tolerance entirely.
pub(crate) const SCALE_TOLERANCE: f64 = 0.01;

/// Scale correction between a captured raster and the logical viewport.
///
/// Returns 1.0 when no rescale is needed. Exactly 0.5 is returned as-is
/// regardless of the tolerance, so retina captures always normalize.
pub fn normalization_factor(image: RectangleSize, viewport: RectangleSize) -> f64 {
	if image.width == 0 || viewport.width == 0 {
		return 1.0;
	}
	let factor = viewport.width as f64 / image.width as f64;
	if factor == 0.5 {
		return 0.5;
	}
	if (factor - 1.0).abs() <= SCALE_TOLERANCE {
		return 1.0;
	}
	factor
}

/// Image rotation applied by the capture pipeline, in degrees.
///
/// A forced value overrides automatic inference and disables it.
pub(crate) fn effective_rotation(forced: Option<i32>, capabilities: &Capabilities) -> i32 {
	if let Some(forced) = forced {
		return forced;
	}
	if capabilities.is_mobile() && capabilities.is_landscape() {
		let ios = capabilities
			.platform_name
			.as_deref()
			.map(|p| p.to_ascii_lowercase().contains("ios"))
			.unwrap_or(false);
		return if ios { 90 } else { 270 };
	}
	0
}

/// Orchestrates one capture according to the session configuration.
pub(crate) struct ScreenshotTaker {
	driver: Arc<dyn Driver>,
	viewport: RectangleSize,
	force_full_page: bool,
	stitch_mode: StitchMode,
	hide_scrollbars: bool,
	rotation: i32,
}

impl ScreenshotTaker {
	pub(crate) fn new(
		driver: Arc<dyn Driver>,
		viewport: RectangleSize,
		force_full_page: bool,
		stitch_mode: StitchMode,
		hide_scrollbars: bool,
		forced_rotation: Option<i32>,
		capabilities: &Capabilities,
	) -> Self {
		Self {
			driver,
			viewport,
			force_full_page,
			stitch_mode,
			hide_scrollbars,
			rotation: effective_rotation(forced_rotation, capabilities),
		}
	}

	/// Captures, normalizes, rotates, and classifies the current visual
	/// state. Driver failures surface unchanged; no placeholder image is
	/// ever substituted.
	pub(crate) async fn take(&self) -> Result<Screenshot> {
		let previous_overflow = if self.hide_scrollbars {
			Some(stitch::hide_scrollbars(&self.driver).await?)
		} else {
			None
		};

		let result = self.capture().await;

		if let Some(previous) = previous_overflow {
			stitch::restore_scrollbars(&self.driver, &previous).await?;
		}

		result
	}

	async fn capture(&self) -> Result<Screenshot> {
		let shot = if self.force_full_page {
			let positioner = stitch::positioner_for(self.stitch_mode, self.driver.clone());
			stitch::stitch_full_page(&self.driver, positioner.as_ref(), self.viewport).await?
		} else {
			let raw = self.driver.take_screenshot().await?;
			let shot = Screenshot::from_base64_png(&raw)?;
			let factor = normalization_factor(shot.size(), self.viewport);
			if factor != 1.0 { shot.scale(factor) } else { shot }
		};

		let shot = shot.rotate(self.rotation)?;

		// Images no larger than the viewport are viewport captures and keep
		// their scroll offset for later region translation; full-page
		// composites already span the page and carry a zero offset.
		if shot.size().fits_within(&self.viewport) {
			let offset = stitch::scroll_position(&self.driver).await?;
			Ok(shot.classify(ScreenshotKind::Viewport, offset))
		} else {
			Ok(shot.classify(ScreenshotKind::FullPage, Location::ZERO))
		}
	}
}
