//! Trait seams for the automation-driver collaborator.
//!
//! The driver itself is out of scope: argus consumes it through [`Driver`]
//! and [`Element`], which cover exactly the surface the proxies and the
//! screenshot pipeline need. Lookups stay lazy because nothing here caches
//! a resolved handle; every resolution is a fresh `find_element` call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use argus_protocol::{Location, RectangleSize};

use crate::error::Result;

/// An opaque selector criterion, supplied by the caller and never
/// interpreted by argus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
	/// CSS selector.
	Css(String),
	/// Element id attribute.
	Id(String),
	/// XPath expression.
	XPath(String),
	/// Form control name attribute.
	Name(String),
	/// Tag name.
	TagName(String),
	/// Exact anchor text.
	LinkText(String),
}

impl Locator {
	/// CSS selector shorthand.
	pub fn css(selector: impl Into<String>) -> Self {
		Locator::Css(selector.into())
	}

	/// Id shorthand.
	pub fn id(id: impl Into<String>) -> Self {
		Locator::Id(id.into())
	}
}

impl std::fmt::Display for Locator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Locator::Css(s) => write!(f, "css={s}"),
			Locator::Id(s) => write!(f, "id={s}"),
			Locator::XPath(s) => write!(f, "xpath={s}"),
			Locator::Name(s) => write!(f, "name={s}"),
			Locator::TagName(s) => write!(f, "tag={s}"),
			Locator::LinkText(s) => write!(f, "linkText={s}"),
		}
	}
}

/// Screen orientation reported by the driver's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
	Portrait,
	Landscape,
}

/// Host platform and orientation, read once at session open and used to
/// infer automatic image rotation for mobile sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
	pub platform_name: Option<String>,
	pub browser_name: Option<String>,
	pub orientation: Option<Orientation>,
}

impl Capabilities {
	/// True for iOS/Android platforms.
	pub fn is_mobile(&self) -> bool {
		self.platform_name
			.as_deref()
			.map(|p| {
				let p = p.to_ascii_lowercase();
				p.contains("ios") || p.contains("android")
			})
			.unwrap_or(false)
	}

	/// True when the session reports a landscape orientation.
	pub fn is_landscape(&self) -> bool {
		self.orientation == Some(Orientation::Landscape)
	}
}

/// The automation driver: screenshots, script execution, element lookup,
/// and viewport accessors.
///
/// Errors from implementations propagate through the stack unchanged.
#[async_trait]
pub trait Driver: Send + Sync {
	/// Captures the current viewport as base64-encoded PNG, as the wire
	/// delivers it.
	async fn take_screenshot(&self) -> Result<String>;

	/// Returns the page title.
	async fn title(&self) -> Result<String>;

	/// Executes JavaScript in the page, returning its JSON result.
	async fn execute_script(&self, script: &str) -> Result<serde_json::Value>;

	/// Resolves a locator to one live element handle.
	async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn Element>>;

	/// Resolves a locator to all matching element handles, in document
	/// order.
	async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn Element>>>;

	/// Returns the session's platform capabilities.
	async fn capabilities(&self) -> Result<Capabilities>;

	/// Returns the logical viewport size.
	async fn viewport_size(&self) -> Result<RectangleSize>;

	/// Resizes the viewport.
	async fn set_viewport_size(&self, size: RectangleSize) -> Result<()>;
}

/// A resolved reference to one live DOM node.
///
/// Operations execute immediately against that node and fail with the
/// driver's staleness error once the node is detached.
#[async_trait]
pub trait Element: Send + Sync {
	async fn tag_name(&self) -> Result<String>;
	async fn attribute(&self, name: &str) -> Result<Option<String>>;
	async fn css_value(&self, property: &str) -> Result<String>;
	async fn text(&self) -> Result<String>;
	async fn size(&self) -> Result<RectangleSize>;
	async fn location(&self) -> Result<Location>;
	async fn is_enabled(&self) -> Result<bool>;
	async fn is_selected(&self) -> Result<bool>;
	async fn is_displayed(&self) -> Result<bool>;
	async fn outer_html(&self) -> Result<String>;
	async fn inner_html(&self) -> Result<String>;
	async fn clear(&self) -> Result<()>;
	async fn submit(&self) -> Result<()>;

	/// Clicks the element. Drivers may return the same handle or a fresh
	/// one; callers must tolerate either.
	async fn click(&self) -> Result<Arc<dyn Element>>;

	/// Types into the element. Same handle contract as [`click`](Self::click).
	async fn send_keys(&self, text: &str) -> Result<Arc<dyn Element>>;

	/// Nested lookup scoped to this element's subtree.
	async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn Element>>;

	/// Nested lookup of all matches in this element's subtree.
	async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn Element>>>;
}
