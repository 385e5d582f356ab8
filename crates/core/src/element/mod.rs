//! Proxy around one resolved element handle.
//!
//! [`RemoteElement`] forwards every read-only introspection operation
//! verbatim to the wrapped handle. The two state-mutating operations,
//! [`click`](RemoteElement::click) and [`send_keys`](RemoteElement::send_keys),
//! report the impending action to the session's [`InteractionSink`] before
//! they reach the driver, so the session can track the last-interacted
//! element for coordinate corrections.

mod finder;

pub use finder::{ElementCollection, ElementFinder};

use std::sync::Arc;

use argus_protocol::{Location, RectangleSize, Region};
use argus_runtime::{Element, Locator, Result};

/// A state-changing action about to be forwarded to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
	/// A click on the element occupying `region`.
	Click {
		region: Region,
	},
	/// Key entry into the element occupying `region`.
	SendKeys {
		region: Region,
		text: String,
	},
}

/// Receives interaction notifications before the action is forwarded.
///
/// The session's shared state implements this; tests substitute a recording
/// double to assert notify-before-forward ordering.
pub trait InteractionSink: Send + Sync {
	fn on_interaction(&self, event: InteractionEvent);
}

/// Wraps a concrete element handle, intercepting state-mutating operations.
///
/// Introspection results are returned unchanged and errors from the
/// underlying handle propagate as-is; the proxy adds no error kinds.
#[derive(Clone)]
pub struct RemoteElement {
	inner: Arc<dyn Element>,
	sink: Arc<dyn InteractionSink>,
}

impl RemoteElement {
	pub(crate) fn new(inner: Arc<dyn Element>, sink: Arc<dyn InteractionSink>) -> Self {
		Self { inner, sink }
	}

	/// The element's page region, read fresh from the handle.
	pub async fn region(&self) -> Result<Region> {
		let location = self.inner.location().await?;
		let size = self.inner.size().await?;
		Ok(Region::from_element(location, size))
	}

	/// Clicks the element, notifying the session first.
	///
	/// Returns a new proxy around the handle the driver produced; some
	/// drivers return the same element after a click, others a fresh one.
	pub async fn click(&self) -> Result<RemoteElement> {
		let region = self.region().await?;
		tracing::debug!(?region, "click");
		self.sink.on_interaction(InteractionEvent::Click { region });

		let next = self.inner.click().await?;
		Ok(RemoteElement::new(next, self.sink.clone()))
	}

	/// Types into the element, notifying the session (text included) first.
	pub async fn send_keys(&self, text: &str) -> Result<RemoteElement> {
		let region = self.region().await?;
		tracing::debug!(?region, len = text.len(), "send_keys");
		self.sink
			.on_interaction(InteractionEvent::SendKeys { region, text: text.to_string() });

		let next = self.inner.send_keys(text).await?;
		Ok(RemoteElement::new(next, self.sink.clone()))
	}

	pub async fn tag_name(&self) -> Result<String> {
		self.inner.tag_name().await
	}

	pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
		self.inner.attribute(name).await
	}

	pub async fn css_value(&self, property: &str) -> Result<String> {
		self.inner.css_value(property).await
	}

	pub async fn text(&self) -> Result<String> {
		self.inner.text().await
	}

	pub async fn size(&self) -> Result<RectangleSize> {
		self.inner.size().await
	}

	pub async fn location(&self) -> Result<Location> {
		self.inner.location().await
	}

	pub async fn is_enabled(&self) -> Result<bool> {
		self.inner.is_enabled().await
	}

	pub async fn is_selected(&self) -> Result<bool> {
		self.inner.is_selected().await
	}

	pub async fn is_displayed(&self) -> Result<bool> {
		self.inner.is_displayed().await
	}

	pub async fn outer_html(&self) -> Result<String> {
		self.inner.outer_html().await
	}

	pub async fn inner_html(&self) -> Result<String> {
		self.inner.inner_html().await
	}

	pub async fn clear(&self) -> Result<()> {
		self.inner.clear().await
	}

	pub async fn submit(&self) -> Result<()> {
		self.inner.submit().await
	}

	pub(crate) async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn Element>> {
		self.inner.find_element(locator).await
	}

	pub(crate) async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn Element>>> {
		self.inner.find_elements(locator).await
	}
}

impl std::fmt::Debug for RemoteElement {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteElement").finish_non_exhaustive()
	}
}
