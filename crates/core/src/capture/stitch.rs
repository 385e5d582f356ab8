//! Full-page stitching.
//!
//! A page taller than the viewport is captured in viewport-sized
//! increments and composited onto one canvas. Two strategies move the page
//! between increments: actually scrolling the DOM, or applying a CSS
//! translate offset. Both must produce pixel-equivalent composites.

use std::sync::Arc;

use async_trait::async_trait;
use image::{RgbaImage, imageops};
use parking_lot::Mutex;

use argus_protocol::{Location, RectangleSize, StitchMode};
use argus_runtime::{Driver, Error, Result};

use super::image::Screenshot;
use super::normalization_factor;

const ENTIRE_SIZE_SCRIPT: &str = "return [Math.max(document.documentElement.scrollWidth, document.body ? document.body.scrollWidth : 0), Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0)];";

const SCROLL_POSITION_SCRIPT: &str = "return [window.pageXOffset || document.documentElement.scrollLeft || 0, window.pageYOffset || document.documentElement.scrollTop || 0];";

const HIDE_SCROLLBARS_SCRIPT: &str = "var previous = document.documentElement.style.overflow; document.documentElement.style.overflow = 'hidden'; return previous;";

fn location_from_pair(value: &serde_json::Value, what: &str) -> Result<(i64, i64)> {
	let pair = value
		.as_array()
		.filter(|a| a.len() == 2)
		.ok_or_else(|| Error::driver("JavascriptError", format!("malformed {what}: {value}")))?;
	let x = pair[0].as_f64().unwrap_or(0.0) as i64;
	let y = pair[1].as_f64().unwrap_or(0.0) as i64;
	Ok((x, y))
}

/// Reads the full scrollable page size, in CSS pixels.
pub(crate) async fn entire_page_size(driver: &Arc<dyn Driver>) -> Result<RectangleSize> {
	let value = driver.execute_script(ENTIRE_SIZE_SCRIPT).await?;
	let (width, height) = location_from_pair(&value, "entire page size")?;
	Ok(RectangleSize::new(width.max(0) as u32, height.max(0) as u32))
}

/// Reads the current page scroll offset.
pub(crate) async fn scroll_position(driver: &Arc<dyn Driver>) -> Result<Location> {
	let value = driver.execute_script(SCROLL_POSITION_SCRIPT).await?;
	let (x, y) = location_from_pair(&value, "scroll position")?;
	Ok(Location::new(x as i32, y as i32))
}

/// Hides scrollbars for the duration of a capture; returns the previous
/// overflow value for [`restore_scrollbars`].
pub(crate) async fn hide_scrollbars(driver: &Arc<dyn Driver>) -> Result<String> {
	let value = driver.execute_script(HIDE_SCROLLBARS_SCRIPT).await?;
	Ok(value.as_str().unwrap_or_default().to_string())
}

pub(crate) async fn restore_scrollbars(driver: &Arc<dyn Driver>, previous: &str) -> Result<()> {
	let script = format!(
		"document.documentElement.style.overflow = '{}';",
		previous.replace('\'', "\\'")
	);
	driver.execute_script(&script).await?;
	Ok(())
}

/// Moves the page so a given page offset sits at the viewport origin.
#[async_trait]
pub(crate) trait Positioner: Send + Sync {
	/// Requests the offset; implementations may clamp at the page end.
	async fn set_position(&self, location: Location) -> Result<()>;

	/// The offset actually in effect (after any clamping).
	async fn current_position(&self) -> Result<Location>;

	/// Restores whatever state the strategy disturbed.
	async fn restore(&self) -> Result<()>;
}

/// Scroll-based strategy: really scrolls the DOM.
pub(crate) struct ScrollPositioner {
	driver: Arc<dyn Driver>,
	original: Mutex<Option<Location>>,
}

impl ScrollPositioner {
	pub(crate) fn new(driver: Arc<dyn Driver>) -> Self {
		Self { driver, original: Mutex::new(None) }
	}
}

#[async_trait]
impl Positioner for ScrollPositioner {
	async fn set_position(&self, location: Location) -> Result<()> {
		if self.original.lock().is_none() {
			let before = scroll_position(&self.driver).await?;
			*self.original.lock() = Some(before);
		}
		let script = format!("window.scrollTo({}, {});", location.x, location.y);
		self.driver.execute_script(&script).await?;
		Ok(())
	}

	async fn current_position(&self) -> Result<Location> {
		scroll_position(&self.driver).await
	}

	async fn restore(&self) -> Result<()> {
		let original = self.original.lock().take();
		if let Some(location) = original {
			let script = format!("window.scrollTo({}, {});", location.x, location.y);
			self.driver.execute_script(&script).await?;
		}
		Ok(())
	}
}

/// Transform-based strategy: translates the document root instead of
/// scrolling, for pages where scrolling repaints fixed elements.
///
/// Translate offsets compose with the page's DOM scroll, so the first
/// positioning scrolls to the origin and the original scroll comes back
/// in [`restore`](Positioner::restore).
pub(crate) struct CssTranslatePositioner {
	driver: Arc<dyn Driver>,
	current: Mutex<Location>,
	original_scroll: Mutex<Option<Location>>,
}

impl CssTranslatePositioner {
	pub(crate) fn new(driver: Arc<dyn Driver>) -> Self {
		Self { driver, current: Mutex::new(Location::ZERO), original_scroll: Mutex::new(None) }
	}
}

#[async_trait]
impl Positioner for CssTranslatePositioner {
	async fn set_position(&self, location: Location) -> Result<()> {
		if self.original_scroll.lock().is_none() {
			let before = scroll_position(&self.driver).await?;
			if before != Location::ZERO {
				self.driver.execute_script("window.scrollTo(0, 0);").await?;
			}
			*self.original_scroll.lock() = Some(before);
		}

		let script = format!(
			"document.documentElement.style.transform = 'translate({}px, {}px)';",
			-location.x, -location.y
		);
		self.driver.execute_script(&script).await?;
		*self.current.lock() = location;
		Ok(())
	}

	async fn current_position(&self) -> Result<Location> {
		Ok(*self.current.lock())
	}

	async fn restore(&self) -> Result<()> {
		self.driver
			.execute_script("document.documentElement.style.transform = '';")
			.await?;
		*self.current.lock() = Location::ZERO;

		let original = self.original_scroll.lock().take();
		if let Some(location) = original {
			if location != Location::ZERO {
				let script = format!("window.scrollTo({}, {});", location.x, location.y);
				self.driver.execute_script(&script).await?;
			}
		}
		Ok(())
	}
}

/// Builds the positioner for the configured stitch mode.
pub(crate) fn positioner_for(mode: StitchMode, driver: Arc<dyn Driver>) -> Box<dyn Positioner> {
	match mode {
		StitchMode::Scroll => Box::new(ScrollPositioner::new(driver)),
		StitchMode::Css => Box::new(CssTranslatePositioner::new(driver)),
	}
}

async fn capture_part(driver: &Arc<dyn Driver>, factor: Option<f64>) -> Result<Screenshot> {
	let raw = driver.take_screenshot().await?;
	let part = Screenshot::from_base64_png(&raw)?;
	match factor {
		Some(factor) if factor != 1.0 => Ok(part.scale(factor)),
		_ => Ok(part),
	}
}

/// Captures the whole scrollable page as one composite image.
///
/// Increments are viewport-sized; the final partial increment is requested
/// at its clamped offset and pasted there, so stitch boundaries carry no
/// duplicated or missing scan lines. The page position is restored before
/// returning. Any capture or positioning failure surfaces the driver error;
/// no placeholder image is substituted.
pub(crate) async fn stitch_full_page(
	driver: &Arc<dyn Driver>,
	positioner: &dyn Positioner,
	viewport: RectangleSize,
) -> Result<Screenshot> {
	if viewport.is_empty() {
		return Err(Error::ImageProcessing("viewport size is empty".to_string()));
	}

	let entire = entire_page_size(driver).await?;
	tracing::debug!(%entire, %viewport, "stitching full page");

	positioner.set_position(Location::ZERO).await?;
	let first = capture_part(driver, None).await?;

	// Device-pixel-ratio correction, derived once and applied to every part.
	let factor = normalization_factor(first.size(), viewport);
	let first = if factor != 1.0 { first.scale(factor) } else { first };

	// Page fits in one capture; nothing to composite.
	if entire.fits_within(&first.size()) {
		positioner.restore().await?;
		return Ok(first);
	}

	let canvas_width = entire.width.max(first.size().width);
	let canvas_height = entire.height.max(first.size().height);
	let mut canvas = RgbaImage::new(canvas_width, canvas_height);
	imageops::replace(&mut canvas, first.image(), 0, 0);

	let step = viewport.height;
	let max_offset = entire.height.saturating_sub(viewport.height) as i32;

	let mut requested = step as i32;
	while requested <= max_offset || requested - (step as i32) < max_offset {
		let target = Location::new(0, requested.min(max_offset));
		positioner.set_position(target).await?;
		let actual = positioner.current_position().await?;

		let part = capture_part(driver, Some(factor)).await?;
		imageops::replace(&mut canvas, part.image(), actual.x as i64, actual.y as i64);

		if target.y >= max_offset {
			break;
		}
		requested += step as i32;
	}

	positioner.restore().await?;
	Ok(Screenshot::from_image(canvas))
}
