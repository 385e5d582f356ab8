//! Geometry primitives for captures and match regions.

use serde::{Deserialize, Serialize};

/// A point in page coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
	pub x: i32,
	pub y: i32,
}

impl Location {
	pub const ZERO: Location = Location { x: 0, y: 0 };

	pub fn new(x: i32, y: i32) -> Self {
		Self { x, y }
	}
}

/// Width and height of a viewport, an image, or an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleSize {
	pub width: u32,
	pub height: u32,
}

impl RectangleSize {
	pub fn new(width: u32, height: u32) -> Self {
		Self { width, height }
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}

	/// True when `self` fits inside `other` on both axes.
	pub fn fits_within(&self, other: &RectangleSize) -> bool {
		self.width <= other.width && self.height <= other.height
	}
}

impl std::fmt::Display for RectangleSize {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}x{}", self.width, self.height)
	}
}

/// A rectangle scoping a visual comparison to part of an image.
///
/// `relative` distinguishes element-relative regions (translated into image
/// coordinates by the matcher using the screenshot's scroll offset) from
/// absolute page regions supplied directly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
	pub left: i32,
	pub top: i32,
	pub width: u32,
	pub height: u32,
	#[serde(default)]
	pub relative: bool,
}

impl Region {
	pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
		Self { left, top, width, height, relative: false }
	}

	/// Builds an element-relative region from the element's page location
	/// and size.
	pub fn from_element(location: Location, size: RectangleSize) -> Self {
		Self {
			left: location.x,
			top: location.y,
			width: size.width,
			height: size.height,
			relative: true,
		}
	}

	pub fn size(&self) -> RectangleSize {
		RectangleSize::new(self.width, self.height)
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}
}
