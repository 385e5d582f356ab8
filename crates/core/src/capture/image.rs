//! Decoded raster screenshots.
//!
//! A [`Screenshot`] carries the pixels plus the page-scroll offset recorded
//! at capture time, which later region calculations use to translate
//! page-relative element coordinates into image coordinates.

use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, RgbaImage, imageops};

use argus_protocol::{Location, RectangleSize};
use argus_runtime::{Error, Result};

/// Whether a capture covers the viewport or the whole scrollable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotKind {
	/// Dimensions do not exceed the logical viewport; carries the scroll
	/// offset read at capture time.
	Viewport,
	/// A full-page composite; already encompasses the whole page, so the
	/// offset is zero.
	FullPage,
}

/// A decoded capture plus its capture-time scroll offset.
#[derive(Clone)]
pub struct Screenshot {
	image: RgbaImage,
	scroll_offset: Location,
	kind: ScreenshotKind,
}

impl Screenshot {
	/// Decodes the base64 PNG payload the driver wire delivers.
	pub fn from_base64_png(data: &str) -> Result<Self> {
		let bytes = base64::prelude::BASE64_STANDARD
			.decode(data.trim())
			.map_err(|e| Error::ImageProcessing(format!("decode screenshot base64: {e}")))?;

		let image = image::load_from_memory(&bytes)
			.map_err(|e| Error::ImageProcessing(format!("decode screenshot image: {e}")))?
			.to_rgba8();

		Ok(Self::from_image(image))
	}

	/// Wraps an already-decoded raster as a viewport capture at offset zero.
	pub fn from_image(image: RgbaImage) -> Self {
		Self { image, scroll_offset: Location::ZERO, kind: ScreenshotKind::Viewport }
	}

	pub fn image(&self) -> &RgbaImage {
		&self.image
	}

	pub fn size(&self) -> RectangleSize {
		RectangleSize::new(self.image.width(), self.image.height())
	}

	pub fn scroll_offset(&self) -> Location {
		self.scroll_offset
	}

	pub fn kind(&self) -> ScreenshotKind {
		self.kind
	}

	pub(crate) fn classify(mut self, kind: ScreenshotKind, scroll_offset: Location) -> Self {
		self.kind = kind;
		self.scroll_offset = scroll_offset;
		self
	}

	/// Rescales by `factor`, preserving aspect ratio.
	pub fn scale(mut self, factor: f64) -> Self {
		let width = ((self.image.width() as f64) * factor).round().max(1.0) as u32;
		let height = ((self.image.height() as f64) * factor).round().max(1.0) as u32;
		tracing::debug!(factor, %width, %height, "rescaling screenshot");
		self.image = imageops::resize(&self.image, width, height, imageops::FilterType::CatmullRom);
		self
	}

	/// Rotates by a quarter-turn multiple. `degrees` is normalized into
	/// `0..360`; zero is a no-op.
	pub fn rotate(mut self, degrees: i32) -> Result<Self> {
		self.image = match degrees.rem_euclid(360) {
			0 => return Ok(self),
			90 => imageops::rotate90(&self.image),
			180 => imageops::rotate180(&self.image),
			270 => imageops::rotate270(&self.image),
			other => {
				return Err(Error::ImageProcessing(format!(
					"rotation must be a multiple of 90 degrees, got {other}"
				)));
			}
		};
		Ok(self)
	}

	/// Re-encodes as PNG, for hand-off to the matching service.
	pub fn to_png(&self) -> Result<Vec<u8>> {
		let mut bytes = Cursor::new(Vec::new());
		DynamicImage::ImageRgba8(self.image.clone())
			.write_to(&mut bytes, image::ImageOutputFormat::Png)
			.map_err(|e| Error::ImageProcessing(format!("encode screenshot: {e}")))?;
		Ok(bytes.into_inner())
	}
}

impl std::fmt::Debug for Screenshot {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Screenshot")
			.field("size", &self.size())
			.field("kind", &self.kind)
			.field("scroll_offset", &self.scroll_offset)
			.finish()
	}
}
